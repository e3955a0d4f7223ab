//! Pure Rust image codec backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` with guessed format |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (lossless RGBA) |
//! | URL references | caller-supplied [`AssetStore`] |

use super::backend::{AssetStore, BackendError, ImageAsset, ImageBackend};
use crate::types::ImageRef;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, ImageReader, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Whether `path` has one of the [`supported_input_extensions`].
pub fn is_supported_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(e))
        })
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Default)]
pub struct RustBackend {
    store: Option<Box<dyn AssetStore>>,
}

impl RustBackend {
    pub fn new() -> Self {
        Self { store: None }
    }

    /// Resolve [`ImageRef::Url`] references through `store`.
    pub fn with_store(store: impl AssetStore + 'static) -> Self {
        Self {
            store: Some(Box::new(store)),
        }
    }

    /// Encoded bytes for a reference, fetching URLs through the store.
    fn bytes<'a>(&self, source: &'a ImageRef) -> Result<std::borrow::Cow<'a, [u8]>, BackendError> {
        match source {
            ImageRef::Bytes(bytes) => Ok(std::borrow::Cow::Borrowed(bytes.as_slice())),
            ImageRef::Url(url) => {
                let store = self
                    .store
                    .as_ref()
                    .ok_or_else(|| BackendError::Unresolved(url.clone()))?;
                Ok(std::borrow::Cow::Owned(store.fetch(url)?))
            }
        }
    }
}

fn reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, BackendError> {
    Ok(ImageReader::new(Cursor::new(bytes)).with_guessed_format()?)
}

impl ImageBackend for RustBackend {
    fn decode(&self, source: &ImageRef) -> Result<ImageAsset, BackendError> {
        let bytes = self.bytes(source)?;
        let img = reader(&bytes)?.decode().map_err(|e| BackendError::Decode {
            source_label: source.label(),
            reason: e.to_string(),
        })?;
        Ok(ImageAsset::new(img.to_rgba8()))
    }

    fn encode_png(&self, pixels: &RgbaImage) -> Result<Vec<u8>, BackendError> {
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(
                pixels.as_raw(),
                pixels.width(),
                pixels.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| BackendError::Encode(e.to_string()))?;
        Ok(out)
    }
}

/// Asset store backed by the local filesystem.
///
/// Accepts plain paths and `file://` URLs.
#[derive(Debug, Clone, Default)]
pub struct LocalFiles;

impl LocalFiles {
    pub fn new() -> Self {
        Self
    }
}

impl AssetStore for LocalFiles {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, BackendError> {
        let path = url.strip_prefix("file://").unwrap_or(url);
        Ok(std::fs::read(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{gradient_image, png_bytes};
    use image::Rgba;

    #[test]
    fn supported_extensions_match_decodable_formats() {
        let exts = super::supported_input_extensions();
        for expected in &["jpg", "jpeg", "png", "tif", "tiff", "webp"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
    }

    #[test]
    fn supported_path_is_case_insensitive() {
        assert!(is_supported_path(Path::new("a/B.JPG")));
        assert!(is_supported_path(Path::new("x.webp")));
        assert!(!is_supported_path(Path::new("notes.txt")));
        assert!(!is_supported_path(Path::new("no_extension")));
    }

    #[test]
    fn decode_png_bytes() {
        let backend = RustBackend::new();
        let src = gradient_image(16, 9);
        let asset = backend.decode(&ImageRef::Bytes(png_bytes(&src))).unwrap();
        assert_eq!(asset.pixels(), &src);
    }

    #[test]
    fn decode_garbage_is_decode_error() {
        let backend = RustBackend::new();
        let err = backend
            .decode(&ImageRef::Bytes(b"definitely not an image".to_vec()))
            .unwrap_err();
        assert!(matches!(err, BackendError::Decode { .. }));
    }

    #[test]
    fn url_without_store_is_unresolved() {
        let backend = RustBackend::new();
        let err = backend
            .decode(&ImageRef::Url("https://cdn.example/x.png".into()))
            .unwrap_err();
        assert!(matches!(err, BackendError::Unresolved(u) if u == "https://cdn.example/x.png"));
    }

    #[test]
    fn encode_png_is_lossless_including_alpha() {
        let backend = RustBackend::new();
        let mut src = gradient_image(10, 10);
        src.put_pixel(3, 4, Rgba([1, 2, 3, 0]));
        let bytes = backend.encode_png(&src).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

        let back = backend.decode(&ImageRef::Bytes(bytes)).unwrap();
        assert_eq!(back.pixels(), &src);
    }

    #[test]
    fn local_files_store_resolves_paths_and_file_urls() {
        let tmp = tempfile::TempDir::new().unwrap();
        let file = tmp.path().join("a.png");
        std::fs::write(&file, png_bytes(&gradient_image(4, 3))).unwrap();

        let backend = RustBackend::with_store(LocalFiles::new());
        let asset = backend
            .decode(&ImageRef::Url(file.display().to_string()))
            .unwrap();
        assert_eq!((asset.width(), asset.height()), (4, 3));

        let url = format!("file://{}", file.display());
        assert!(backend.decode(&ImageRef::Url(url)).is_ok());
    }

    #[test]
    fn local_files_missing_is_io_error() {
        let backend = RustBackend::with_store(LocalFiles::new());
        let err = backend
            .decode(&ImageRef::Url("/nonexistent/nope.png".into()))
            .unwrap_err();
        assert!(matches!(err, BackendError::Io(_)));
    }
}
