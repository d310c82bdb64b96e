use image::Rgba;

use crate::generator::{parse_color, GeneratorError, QrStyle};

#[test]
fn test_named_colors() {
    assert_eq!(parse_color("black"), Some(Rgba([0, 0, 0, 255])));
    assert_eq!(parse_color("WHITE"), Some(Rgba([255, 255, 255, 255])));
    assert_eq!(parse_color(" navy "), Some(Rgba([0, 0, 128, 255])));
}

#[test]
fn test_hex_colors() {
    assert_eq!(parse_color("#ff8000"), Some(Rgba([255, 128, 0, 255])));
    assert_eq!(parse_color("#FFF"), Some(Rgba([255, 255, 255, 255])));
    assert_eq!(parse_color("#123"), Some(Rgba([0x11, 0x22, 0x33, 255])));
}

#[test]
fn test_invalid_colors() {
    assert_eq!(parse_color(""), None);
    assert_eq!(parse_color("#12"), None);
    assert_eq!(parse_color("#gggggg"), None);
    assert_eq!(parse_color("#ff80001"), None);
    assert_eq!(parse_color("chartreuse-ish"), None);
}

#[test]
fn test_style_colors() {
    let (fill, back) = QrStyle::default().colors().unwrap();
    assert_eq!(fill, Rgba([0, 0, 0, 255]));
    assert_eq!(back, Rgba([255, 255, 255, 255]));

    let err = QrStyle::new("black", "nope").colors().unwrap_err();
    assert!(matches!(err, GeneratorError::InvalidColor(c) if c == "nope"));
}
