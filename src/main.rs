use chrono::Utc;
use clap::{Parser, Subcommand};
use retouch::collage::{CollageComposer, CollagePattern};
use retouch::config::{self, EngineConfig};
use retouch::export::{ExportBlob, encode_canvas};
use retouch::imaging::{LocalFiles, Preset, RustBackend};
use retouch::recipe::EditRecipe;
use retouch::session::Editor;
use retouch::types::{ImageRef, Rect};
use retouch::{batch, output};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "retouch")]
#[command(about = "Non-destructive photo editing and collage composition")]
#[command(long_about = "\
Non-destructive photo editing and collage composition

Every edit is re-rendered from the original pixels, in a fixed order:

  adjustments  brightness, contrast, saturation, blur, hue, then preset
  transform    crop (source coordinates), flip, rotation
  annotations  freehand strokes from a recipe, drawn last

Results are written as lossless PNG named <context>-<unix millis>.png.

Run 'retouch gen-config' to generate a documented retouch.toml.")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./retouch.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Shared flags for commands that write images.
#[derive(clap::Args, Clone)]
struct OutArgs {
    /// Directory for exported PNGs
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[derive(clap::Args)]
struct EditArgs {
    /// Image to edit
    input: PathBuf,

    /// Recipe (.toml or .json) applied before any flags below
    #[arg(long)]
    recipe: Option<PathBuf>,

    /// Brightness, -100 to 100
    #[arg(long, allow_hyphen_values = true)]
    brightness: Option<f32>,

    /// Contrast, -100 to 100
    #[arg(long, allow_hyphen_values = true)]
    contrast: Option<f32>,

    /// Saturation, -100 to 100
    #[arg(long, allow_hyphen_values = true)]
    saturation: Option<f32>,

    /// Gaussian blur radius in pixels, 0 to 20
    #[arg(long)]
    blur: Option<f32>,

    /// Hue rotation in degrees
    #[arg(long, allow_hyphen_values = true)]
    hue: Option<f32>,

    /// none, grayscale, sepia, vintage, cool or warm
    #[arg(long)]
    preset: Option<Preset>,

    /// Rotation in degrees, clockwise
    #[arg(long, allow_hyphen_values = true)]
    rotate: Option<f32>,

    /// Mirror left to right
    #[arg(long)]
    flip_h: bool,

    /// Mirror top to bottom
    #[arg(long)]
    flip_v: bool,

    /// Crop rectangle in source pixels: X,Y,W,H
    #[arg(long)]
    crop: Option<Rect>,

    /// Bake the crop into the source before rendering
    #[arg(long)]
    commit_crop: bool,

    #[command(flatten)]
    out: OutArgs,
}

#[derive(clap::Args)]
struct CollageArgs {
    /// Layout (see 'retouch patterns')
    #[arg(long, default_value = "grid-2x2")]
    pattern: CollagePattern,

    /// Images in slot order
    #[arg(required = true)]
    images: Vec<PathBuf>,

    #[command(flatten)]
    out: OutArgs,
}

#[derive(clap::Args)]
struct BatchArgs {
    /// Recipe (.toml or .json) applied to every input
    #[arg(long)]
    recipe: PathBuf,

    /// Image files or directories (walked recursively)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Prefix for output names: <prefix>-<stem>-<millis>.png
    #[arg(long, default_value = "")]
    prefix: String,

    #[command(flatten)]
    out: OutArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Adjust, transform and export one image
    Edit(EditArgs),
    /// Compose several images into one collage
    Collage(CollageArgs),
    /// Apply a recipe to many images in parallel
    Batch(BatchArgs),
    /// List collage patterns
    Patterns,
    /// Print a stock retouch.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Edit(args) => {
            let config = load_config(cli.config.as_deref())?;
            edit(&config, args)?;
        }
        Command::Collage(args) => {
            let config = load_config(cli.config.as_deref())?;
            let backend = RustBackend::with_store(LocalFiles::new());
            let mut composer = CollageComposer::new(config.collage.clone());
            composer.select_pattern(args.pattern);
            for image in &args.images {
                composer.add_image(ImageRef::Url(image.display().to_string()))?;
            }
            let canvas = composer.render(&backend)?;
            let blob = encode_canvas(
                &backend,
                Some(&canvas),
                &config.export.collage_context,
                Utc::now(),
            )?;
            let written = write_blob(&args.out.out_dir, blob.as_ref())?;
            output::print_collage_output(
                composer.composition(),
                blob.as_ref().zip(written.as_deref()),
            );
        }
        Command::Batch(args) => {
            let config = load_config(cli.config.as_deref())?;
            init_thread_pool(&config.processing);
            let recipe = EditRecipe::load(&args.recipe)?;
            let inputs = batch::collect_inputs(&args.inputs)?;

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_batch_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = batch::run_batch(
                &RustBackend::new(),
                &inputs,
                &recipe,
                &args.out.out_dir,
                &args.prefix,
                Utc::now(),
                Some(tx),
            );
            printer
                .join()
                .map_err(|_| "output printer thread panicked")?;
            let summary = result?;
            output::print_batch_summary(&summary);
            if summary.failed > 0 {
                return Err(format!("{} of {} images failed", summary.failed, inputs.len()).into());
            }
        }
        Command::Patterns => output::print_patterns(),
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn edit(config: &EngineConfig, args: EditArgs) -> Result<(), Box<dyn std::error::Error>> {
    let backend = RustBackend::new();
    let mut editor = Editor::new();
    let bytes = std::fs::read(&args.input)?;
    let session = editor.load(&backend, &ImageRef::Bytes(bytes))?;

    if let Some(path) = &args.recipe {
        EditRecipe::load(path)?.apply(session);
    }
    session.edit_adjustments(|a| {
        if let Some(v) = args.brightness {
            a.set_brightness(v);
        }
        if let Some(v) = args.contrast {
            a.set_contrast(v);
        }
        if let Some(v) = args.saturation {
            a.set_saturation(v);
        }
        if let Some(v) = args.blur {
            a.set_blur(v);
        }
        if let Some(v) = args.hue {
            a.set_hue(v);
        }
        if let Some(p) = args.preset {
            a.set_preset(p);
        }
    });
    session.edit_transform(|t| {
        if let Some(deg) = args.rotate {
            t.set_rotation(deg);
        }
        if args.flip_h {
            t.toggle_flip_h();
        }
        if args.flip_v {
            t.toggle_flip_v();
        }
    });
    if args.crop.is_some() {
        session.set_crop(args.crop);
    }
    if args.commit_crop && !session.commit_crop() {
        tracing::warn!("--commit-crop given but no crop is set");
    }

    let blob = encode_canvas(
        &backend,
        Some(session.render()),
        &config.export.edit_context,
        Utc::now(),
    )?;
    let written = write_blob(&args.out.out_dir, blob.as_ref())?;
    output::print_edit_output(session, blob.as_ref().zip(written.as_deref()));
    Ok(())
}

/// Explicit `--config` must exist; otherwise `./retouch.toml` is optional.
fn load_config(path: Option<&Path>) -> Result<EngineConfig, config::ConfigError> {
    match path {
        Some(p) => config::load_config_file(p),
        None => config::load_config(Path::new(".")),
    }
}

fn write_blob(out_dir: &Path, blob: Option<&ExportBlob>) -> std::io::Result<Option<PathBuf>> {
    let Some(blob) = blob else {
        return Ok(None);
    };
    std::fs::create_dir_all(out_dir)?;
    let path = out_dir.join(&blob.filename);
    std::fs::write(&path, &blob.bytes)?;
    Ok(Some(path))
}

/// Log to stderr so stdout stays clean for command output.
fn init_logging(verbose: bool) {
    let default = if verbose { "retouch=debug" } else { "retouch=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available cores; config can lower it, not raise it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
