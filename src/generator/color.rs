//! Colour names and hex codes accepted for QR styling

use image::Rgba;

/// Named colours understood in settings and on the command line
const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("green", [0, 128, 0]),
    ("lime", [0, 255, 0]),
    ("blue", [0, 0, 255]),
    ("navy", [0, 0, 128]),
    ("yellow", [255, 255, 0]),
    ("orange", [255, 165, 0]),
    ("purple", [128, 0, 128]),
    ("magenta", [255, 0, 255]),
    ("cyan", [0, 255, 255]),
    ("teal", [0, 128, 128]),
    ("maroon", [128, 0, 0]),
    ("olive", [128, 128, 0]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
    ("silver", [192, 192, 192]),
    ("brown", [165, 42, 42]),
    ("pink", [255, 192, 203]),
];

/// Parses `black`, `#000`, `#000000` (case-insensitive) into an opaque colour
///
/// # Example
/// ```
/// use image::Rgba;
/// use openqr::generator::parse_color;
///
/// assert_eq!(parse_color("Red"), Some(Rgba([255, 0, 0, 255])));
/// assert_eq!(parse_color("#0f0"), Some(Rgba([0, 255, 0, 255])));
/// assert_eq!(parse_color("not-a-colour"), None);
/// ```
pub fn parse_color(input: &str) -> Option<Rgba<u8>> {
    let input = input.trim();

    let [r, g, b] = match input.strip_prefix('#') {
        Some(hex) => parse_hex(hex)?,
        None => NAMED_COLORS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(input))
            .map(|(_, rgb)| *rgb)?,
    };

    Some(Rgba([r, g, b, 255]))
}

fn parse_hex(hex: &str) -> Option<[u8; 3]> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (slot, c) in rgb.iter_mut().zip(hex.chars()) {
                let nibble = c.to_digit(16)? as u8;
                *slot = nibble * 17;
            }
            Some(rgb)
        }
        6 => {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Some([channel(0)?, channel(2)?, channel(4)?])
        }
        _ => None,
    }
}
