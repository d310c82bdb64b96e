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

use image::{DynamicImage, Rgba, RgbaImage};
use std::fs;
use tempfile::TempDir;

use crate::generator::{
    overlay_logo, render, GeneratorError, QrGenerator, QrStyle, MODULE_PX, QUIET_ZONE,
};

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Helper: generator caching into a fresh temp dir
fn temp_generator() -> (TempDir, QrGenerator) {
    let temp_dir = TempDir::new().unwrap();
    let generator = QrGenerator::with_cache_dir(temp_dir.path().join("cache")).unwrap();
    (temp_dir, generator)
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_render_layout() {
    let image = render("https://example.com", BLACK, WHITE).unwrap();
    let (w, h) = image.dimensions();

    assert_eq!(w, h);
    assert_eq!(w % MODULE_PX, 0);

    // Quiet zone is background, the finder pattern corner is foreground
    let zone = QUIET_ZONE * MODULE_PX;
    assert_eq!(*image.get_pixel(0, 0), WHITE);
    assert_eq!(*image.get_pixel(zone - 1, zone - 1), WHITE);
    assert_eq!(*image.get_pixel(zone, zone), BLACK);
    assert_eq!(*image.get_pixel(zone + MODULE_PX - 1, zone + MODULE_PX - 1), BLACK);
}

#[test]
fn test_render_size_includes_quiet_zone() {
    let data = "https://example.com/a/longer/path";
    let modules = qrcode::QrCode::with_error_correction_level(data, qrcode::EcLevel::H)
        .unwrap()
        .width() as u32;

    let image = render(data, BLACK, WHITE).unwrap();

    assert_eq!(image.width(), (modules + 2 * QUIET_ZONE) * MODULE_PX);
}

#[test]
fn test_render_uses_style_colors() {
    let red = Rgba([255, 0, 0, 255]);
    let image = render("https://example.com", red, BLACK).unwrap();
    let zone = QUIET_ZONE * MODULE_PX;

    assert_eq!(*image.get_pixel(0, 0), BLACK);
    assert_eq!(*image.get_pixel(zone, zone), red);
}

// ============================================================================
// Generation and cache
// ============================================================================

#[test]
fn test_generate_writes_cache() {
    let (_temp_dir, generator) = temp_generator();
    let style = QrStyle::default();

    let image = generator.generate("https://example.com", &style).unwrap();
    let cached = generator.cache_path("https://example.com", &style);

    assert!(cached.exists(), "Cache entry should be written");
    assert_eq!(image, render("https://example.com", BLACK, WHITE).unwrap());
}

#[test]
fn test_generate_reads_cache() {
    let (_temp_dir, generator) = temp_generator();
    let style = QrStyle::default();

    let first = generator.generate("https://example.com", &style).unwrap();
    let second = generator.generate("https://example.com", &style).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_generate_recovers_from_corrupt_cache() {
    let (_temp_dir, generator) = temp_generator();
    let style = QrStyle::default();
    let cached = generator.cache_path("https://example.com", &style);
    fs::write(&cached, b"not a png").unwrap();

    let image = generator.generate("https://example.com", &style).unwrap();

    assert_eq!(image, render("https://example.com", BLACK, WHITE).unwrap());
}

#[test]
fn test_generate_normalises_bare_host() {
    let (_temp_dir, generator) = temp_generator();
    let style = QrStyle::default();

    generator.generate("example.com", &style).unwrap();

    assert!(generator.cache_path("https://example.com", &style).exists());
}

#[test]
fn test_generate_rejects_invalid_url() {
    let (_temp_dir, generator) = temp_generator();

    assert!(matches!(
        generator.generate("", &QrStyle::default()),
        Err(GeneratorError::InvalidUrl(_))
    ));
    assert!(matches!(
        generator.generate("file:///etc/passwd", &QrStyle::default()),
        Err(GeneratorError::InvalidUrl(_))
    ));
}

#[test]
fn test_generate_rejects_unknown_color() {
    let (_temp_dir, generator) = temp_generator();

    assert!(matches!(
        generator.generate("https://example.com", &QrStyle::new("mauve-ish", "white")),
        Err(GeneratorError::InvalidColor(_))
    ));
}

#[test]
fn test_cache_path_format() {
    let (_temp_dir, generator) = temp_generator();

    let path = generator.cache_path("https://example.com", &QrStyle::default());
    let name = path.file_name().unwrap().to_str().unwrap();

    assert!(name.starts_with("qr_httpsexample.com_black_white_"), "got {name}");
    assert!(name.ends_with(".png"));

    let hash = name
        .trim_start_matches("qr_httpsexample.com_black_white_")
        .trim_end_matches(".png");
    assert_eq!(hash.len(), 16);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_cache_path_truncates_long_urls() {
    let (_temp_dir, generator) = temp_generator();
    let url = format!("https://example.com/{}", "a".repeat(200));

    let path = generator.cache_path(&url, &QrStyle::default());
    let name = path.file_name().unwrap().to_str().unwrap();

    assert_eq!(name.len(), "qr_".len() + 30 + "_black_white_".len() + 16 + ".png".len());
}

#[test]
fn test_cache_path_depends_on_colors() {
    let (_temp_dir, generator) = temp_generator();

    let a = generator.cache_path("https://example.com", &QrStyle::new("black", "white"));
    let b = generator.cache_path("https://example.com", &QrStyle::new("red", "white"));

    assert_ne!(a, b);
}

#[test]
fn test_clear_cache() {
    let (_temp_dir, generator) = temp_generator();
    generator.generate("https://a.example", &QrStyle::default()).unwrap();
    generator.generate("https://b.example", &QrStyle::default()).unwrap();
    fs::write(generator.cache_dir().join("keep.txt"), "x").unwrap();

    assert_eq!(generator.clear_cache().unwrap(), 2);
    assert!(generator.cache_dir().join("keep.txt").exists());
    assert_eq!(generator.clear_cache().unwrap(), 0);
}

#[test]
fn test_cache_dir_must_be_directory() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("file");
    fs::write(&file, "x").unwrap();

    assert!(matches!(
        QrGenerator::with_cache_dir(&file),
        Err(GeneratorError::CacheNotDirectory(_))
    ));
}

// ============================================================================
// Save, clipboard, logo
// ============================================================================

#[test]
fn test_save_round_trips_png() {
    let (temp_dir, generator) = temp_generator();
    let image = generator.generate("https://example.com", &QrStyle::default()).unwrap();
    let path = temp_dir.path().join("out/code.png");

    generator.save(&image, &path).unwrap();

    let loaded = image::open(&path).unwrap().to_rgba8();
    assert_eq!(loaded, image);
}

#[test]
fn test_copy_empty_image_rejected() {
    let (_temp_dir, generator) = temp_generator();

    assert!(matches!(
        generator.copy_to_clipboard(&RgbaImage::new(0, 0)),
        Err(GeneratorError::EmptyImage)
    ));
}

#[test]
fn test_overlay_logo_centred_with_border() {
    let mut qr = RgbaImage::from_pixel(400, 400, BLACK);
    let logo = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));

    overlay_logo(&mut qr, &logo);

    // 400 * 0.15 = 60 px logo, 15 px white frame, framed size 90, offset 155
    let centre = qr.get_pixel(200, 200);
    assert!(centre[0] > 200 && centre[1] < 50 && centre[2] < 50, "centre {centre:?}");
    assert_eq!(*qr.get_pixel(160, 160), WHITE);
    assert_eq!(*qr.get_pixel(150, 150), BLACK);
    assert_eq!(*qr.get_pixel(0, 0), BLACK);
}

#[test]
fn test_overlay_logo_skips_tiny_codes() {
    let mut qr = RgbaImage::from_pixel(4, 4, BLACK);
    let logo = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, WHITE));

    overlay_logo(&mut qr, &logo);

    assert!(qr.pixels().all(|p| *p == BLACK));
}
