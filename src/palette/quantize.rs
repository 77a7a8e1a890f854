//! Channel quantization and hex color helpers

/// Levels each channel is collapsed to before counting.
pub const QUANTIZE_LEVELS: u8 = 8;

/// Round a channel value to the nearest of `levels` evenly spaced values.
pub fn quantize_channel(value: u8, levels: u8) -> u8 {
    let step = 255.0 / f64::from(levels.max(2) - 1);
    ((f64::from(value) / step).round() * step).round() as u8
}

pub fn quantize_rgb(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    (
        quantize_channel(r, QUANTIZE_LEVELS),
        quantize_channel(g, QUANTIZE_LEVELS),
        quantize_channel(b, QUANTIZE_LEVELS),
    )
}

/// Lowercase `#rrggbb`.
pub fn rgb_to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Parse `#rrggbb` (leading '#' optional). Anything else reads as black.
pub fn hex_to_rgb(hex: &str) -> (u8, u8, u8) {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return (0, 0, 0);
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16);
    match (channel(0), channel(2), channel(4)) {
        (Ok(r), Ok(g), Ok(b)) => (r, g, b),
        _ => (0, 0, 0),
    }
}

/// Average channel value of a hex color.
pub fn brightness(hex: &str) -> f64 {
    let (r, g, b) = hex_to_rgb(hex);
    (f64::from(r) + f64::from(g) + f64::from(b)) / 3.0
}

/// Blend a color toward white; `factor` 1.0 is pure white.
pub fn lighten(hex: &str, factor: f64) -> String {
    let (r, g, b) = hex_to_rgb(hex);
    let blend = |c: u8| {
        let c = f64::from(c);
        (c + (255.0 - c) * factor).round().min(255.0) as u8
    };
    rgb_to_hex(blend(r), blend(g), blend(b))
}
