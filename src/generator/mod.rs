// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! QR code generation with an on-disk cache
//!
//! Generated codes are cached as PNGs in `<tmp>/openqr_cache`, keyed by URL
//! and colours, so regenerating the same code is a file read.
//!
//! # Image layout
//! - Error correction level H (the code survives a logo covering its centre)
//! - 10 px per module
//! - 4-module quiet zone
//!
//! # Example
//!
//! ```no_run
//! use openqr::generator::{QrGenerator, QrStyle};
//!
//! let generator = QrGenerator::new()?;
//! let image = generator.generate("https://example.com", &QrStyle::default())?;
//! generator.save(&image, "example.png")?;
//! # Ok::<(), openqr::generator::GeneratorError>(())
//! ```

pub mod color;

use image::{
    imageops::{self, FilterType},
    DynamicImage, ImageFormat, Rgba, RgbaImage,
};
use qrcode::{types::QrError, EcLevel, QrCode};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::{
    borrow::Cow,
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};
use thiserror::Error;

use crate::config::{write_atomic, ConfigError};
use crate::core::validator::{normalize_url, validate_url, ValidationError, DEFAULT_SAFE_SCHEMES};

pub use color::parse_color;

/// Pixels per QR module
pub const MODULE_PX: u32 = 10;

/// Quiet zone width in modules, as drawn by the `qrcode` renderer
pub const QUIET_ZONE: u32 = 4;

/// Logo edge length relative to the code
pub const LOGO_FACTOR: f32 = 0.15;

/// White frame around the logo relative to the logo
pub const LOGO_BORDER_FACTOR: f32 = 0.25;

/// Cache directory name under the system temp dir
pub const CACHE_DIR_NAME: &str = "openqr_cache";

/// Errors raised while generating, saving or copying codes
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// URL failed validation
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] ValidationError),

    /// Colour is neither a known name nor a hex code
    #[error("Unknown colour '{0}'")]
    InvalidColor(String),

    /// Data does not fit in a QR code
    #[error("QR encoding failed: {0}")]
    Encode(#[from] QrError),

    /// Image decoding or encoding failed
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Refusing to copy a zero-sized image
    #[error("Cannot copy an empty image")]
    EmptyImage,

    /// System clipboard unavailable or rejected the image
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// Cache directory path exists but is not a directory
    #[error("Cache path is not a directory: {0}")]
    CacheNotDirectory(PathBuf),

    #[error("Filename pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Write(#[from] ConfigError),

    /// Generic I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Foreground/background colours of a code
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QrStyle {
    pub fill_color: String,
    pub back_color: String,
}

impl QrStyle {
    pub fn new(fill_color: impl Into<String>, back_color: impl Into<String>) -> Self {
        Self {
            fill_color: fill_color.into(),
            back_color: back_color.into(),
        }
    }

    /// Resolved `(fill, back)` pixels
    pub fn colors(&self) -> Result<(Rgba<u8>, Rgba<u8>), GeneratorError> {
        let fill = parse_color(&self.fill_color)
            .ok_or_else(|| GeneratorError::InvalidColor(self.fill_color.clone()))?;
        let back = parse_color(&self.back_color)
            .ok_or_else(|| GeneratorError::InvalidColor(self.back_color.clone()))?;
        Ok((fill, back))
    }
}

impl Default for QrStyle {
    fn default() -> Self {
        Self::new("black", "white")
    }
}

/// Generates, caches, saves and copies QR codes for validated URLs
#[derive(Debug)]
pub struct QrGenerator {
    cache_dir: PathBuf,
    unsafe_chars: Regex,
}

impl QrGenerator {
    /// Generator caching in `<tmp>/openqr_cache`
    pub fn new() -> Result<Self, GeneratorError> {
        Self::with_cache_dir(std::env::temp_dir().join(CACHE_DIR_NAME))
    }

    /// Generator caching in `cache_dir`, created if missing
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Result<Self, GeneratorError> {
        let cache_dir = cache_dir.into();

        if !cache_dir.exists() {
            tracing::debug!(dir = %cache_dir.display(), "Creating cache directory");
            fs::create_dir_all(&cache_dir)?;
        } else if !cache_dir.is_dir() {
            return Err(GeneratorError::CacheNotDirectory(cache_dir));
        }

        // Characters not allowed in filenames on any common platform
        let unsafe_chars = Regex::new(r#"[\\/:*?"<>|\x00-\x1f\x7f]"#)?;

        tracing::info!(dir = %cache_dir.display(), "QR generator initialised");
        Ok(Self {
            cache_dir,
            unsafe_chars,
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn sanitize(&self, input: &str) -> String {
        self.unsafe_chars.replace_all(input, "").into_owned()
    }

    /// Cache file for a URL/colour pair
    ///
    /// `qr_{first 30 chars of sanitised url}_{fill}_{back}_{16 hex of sha256}.png`
    pub fn cache_path(&self, url: &str, style: &QrStyle) -> PathBuf {
        let safe_url = self.sanitize(url);
        let truncated: String = safe_url.chars().take(30).collect();
        let color_part = format!(
            "_{}_{}",
            self.sanitize(&style.fill_color),
            self.sanitize(&style.back_color)
        );

        let mut hasher = Sha256::new();
        hasher.update(safe_url.as_bytes());
        hasher.update(color_part.as_bytes());
        let digest = hasher.finalize();
        let hash: String = digest.iter().map(|b| format!("{:02x}", b)).collect();

        self.cache_dir
            .join(format!("qr_{}{}_{}.png", truncated, color_part, &hash[..16]))
    }

    /// Generates (or loads from cache) the code for `url`
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError::InvalidUrl` for URLs that fail validation and
    /// `GeneratorError::InvalidColor` for unknown colours. Cache write failures
    /// are logged, not returned.
    pub fn generate(&self, url: &str, style: &QrStyle) -> Result<RgbaImage, GeneratorError> {
        validate_url(url, DEFAULT_SAFE_SCHEMES)?;
        let (fill, back) = style.colors()?;
        let data = normalize_url(url);

        let cached = self.cache_path(&data, style);
        if cached.is_file() {
            match image::open(&cached) {
                Ok(image) => {
                    tracing::info!(path = %cached.display(), "Loaded QR code from cache");
                    return Ok(image.to_rgba8());
                }
                Err(e) => {
                    tracing::warn!(path = %cached.display(), error = %e, "Unreadable cache entry; regenerating");
                }
            }
        }

        tracing::info!(url = %data, fill = %style.fill_color, back = %style.back_color, "Generating QR code");
        let image = render(&data, fill, back)?;

        if let Err(e) = self.save(&image, &cached) {
            tracing::warn!(path = %cached.display(), error = %e, "Failed to cache QR code");
        }

        Ok(image)
    }

    /// Writes `image` as PNG, atomically
    pub fn save(&self, image: &RgbaImage, path: impl AsRef<Path>) -> Result<(), GeneratorError> {
        let path = path.as_ref();
        let png = encode_png(image)?;
        write_atomic(path, &png)?;

        tracing::debug!(path = %path.display(), bytes = png.len(), "QR code written");
        Ok(())
    }

    /// Puts `image` on the system clipboard
    pub fn copy_to_clipboard(&self, image: &RgbaImage) -> Result<(), GeneratorError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(GeneratorError::EmptyImage);
        }

        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| GeneratorError::Clipboard(e.to_string()))?;
        clipboard
            .set_image(arboard::ImageData {
                width: width as usize,
                height: height as usize,
                bytes: Cow::Borrowed(image.as_raw()),
            })
            .map_err(|e| GeneratorError::Clipboard(e.to_string()))?;

        tracing::info!(width, height, "Copied QR code to clipboard");
        Ok(())
    }

    /// Deletes every cached code, returning how many were removed
    pub fn clear_cache(&self) -> Result<usize, GeneratorError> {
        let mut removed = 0;

        for entry in fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();
            let is_cache_file = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("qr_") && n.ends_with(".png"));

            if is_cache_file {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }

        tracing::info!(removed, "QR cache cleared");
        Ok(removed)
    }
}

/// Encodes `data` at level H and renders it with a quiet zone
pub fn render(data: &str, fill: Rgba<u8>, back: Rgba<u8>) -> Result<RgbaImage, GeneratorError> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::H)?;

    Ok(code
        .render::<Rgba<u8>>()
        .dark_color(fill)
        .light_color(back)
        .module_dimensions(MODULE_PX, MODULE_PX)
        .quiet_zone(true)
        .build())
}

/// Loads a logo from disk (PNG, JPEG or BMP)
pub fn load_logo(path: impl AsRef<Path>) -> Result<DynamicImage, GeneratorError> {
    Ok(image::open(path)?)
}

/// Centres `logo` on `qr`, scaled and framed in white
pub fn overlay_logo(qr: &mut RgbaImage, logo: &DynamicImage) {
    let (qr_w, qr_h) = qr.dimensions();
    let logo_w = (qr_w as f32 * LOGO_FACTOR) as u32;
    let logo_h = (qr_h as f32 * LOGO_FACTOR) as u32;
    if logo_w == 0 || logo_h == 0 {
        tracing::warn!(qr_w, qr_h, "Code too small for a logo; skipping overlay");
        return;
    }

    let logo = imageops::resize(&logo.to_rgba8(), logo_w, logo_h, FilterType::Lanczos3);
    let border = (logo_w as f32 * LOGO_BORDER_FACTOR) as u32;

    let mut framed = RgbaImage::from_pixel(
        logo_w + 2 * border,
        logo_h + 2 * border,
        Rgba([255, 255, 255, 255]),
    );
    imageops::overlay(&mut framed, &logo, i64::from(border), i64::from(border));

    let x = qr_w.saturating_sub(framed.width()) / 2;
    let y = qr_h.saturating_sub(framed.height()) / 2;
    imageops::overlay(qr, &framed, i64::from(x), i64::from(y));
}

fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, GeneratorError> {
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

#[cfg(test)]
mod tests;
