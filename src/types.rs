//! Shared value types used across the editing pipeline.
//!
//! These cross every module boundary (session → render → export, collage →
//! backend) and are kept small, `Clone`, and free of pixel data so they can
//! be serialized into recipes and config files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An opaque reference to a source image.
///
/// The engine only requires that a reference resolve to a decodable bitmap.
/// `Url` references are resolved by an external
/// [`AssetStore`](crate::imaging::AssetStore); the engine never fetches them
/// itself.
#[derive(Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Raw encoded bytes, e.g. a user-selected file.
    Bytes(Vec<u8>),
    /// A location owned by an external asset store (cloud gallery, CDN).
    Url(String),
}

impl ImageRef {
    /// Short human-readable label for logs and CLI output.
    ///
    /// Byte payloads are summarized by size, never dumped.
    pub fn label(&self) -> String {
        match self {
            ImageRef::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
            ImageRef::Url(url) => url.clone(),
        }
    }
}

impl fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            ImageRef::Url(url) => f.debug_tuple("Url").field(url).finish(),
        }
    }
}

/// A point in canvas pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Clamp the rectangle to `[0, bounds_w] × [0, bounds_h]`.
    ///
    /// Returns `None` when nothing of the rectangle survives clamping.
    pub fn clamp_to(self, bounds_w: u32, bounds_h: u32) -> Option<Rect> {
        let x = self.x.min(bounds_w);
        let y = self.y.min(bounds_h);
        let width = self.width.min(bounds_w - x);
        let height = self.height.min(bounds_h - y);
        (width > 0 && height > 0).then_some(Rect {
            x,
            y,
            width,
            height,
        })
    }
}

impl FromStr for Rect {
    type Err = String;

    /// Parse `X,Y,W,H`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(format!("expected X,Y,W,H but got '{s}'"));
        }
        let mut values = [0u32; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| format!("'{part}' is not a non-negative integer"))?;
        }
        Ok(Rect::new(values[0], values[1], values[2], values[3]))
    }
}

/// Straight (non-premultiplied) RGBA color.
///
/// Parsed from and serialized to CSS hex notation: `#rgb`, `#rrggbb`, or
/// `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn parse_hex(s: &str) -> Result<Self, String> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| format!("color '{s}' must start with '#'"))?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("color '{s}' contains non-hex characters"));
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
        match hex.len() {
            3 => {
                let short = |i: usize| {
                    let v = u8::from_str_radix(&hex[i..i + 1], 16).unwrap_or(0);
                    v * 17
                };
                Ok(Color::rgb(short(0), short(1), short(2)))
            }
            6 => Ok(Color::rgb(channel(0), channel(2), channel(4))),
            8 => Ok(Color::rgba(channel(0), channel(2), channel(4), channel(6))),
            _ => Err(format!("color '{s}' must be #rgb, #rrggbb or #rrggbbaa")),
        }
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
