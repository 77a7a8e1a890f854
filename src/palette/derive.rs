//! Style palette derived from a logo's dominant colors

use serde::{Deserialize, Serialize};

use super::extract::{extract_dominant_colors, DEFAULT_MAX_COLORS};
use super::quantize::{brightness, lighten};
use super::PaletteError;

/// Colors at or above this average channel value count as white.
pub const WHITE_THRESHOLD: f64 = 240.0;
/// Below this average channel value a color is treated as dark.
pub const DARK_THRESHOLD: f64 = 128.0;
/// Blend factor for the suggested background tint.
pub const TINT_FACTOR: f64 = 0.95;

pub const FALLBACK_MAIN: &str = "#000000";
pub const CORNER_ON_DARK: &str = "#4338CA";
pub const CORNER_ON_LIGHT: &str = "#DC2626";
pub const WHITE: &str = "#FFFFFF";
pub const BLACK: &str = "#000000";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedPalette {
    /// Darkest usable logo color, used for dots.
    pub main_color: String,
    pub corner_color: String,
    /// Always white; the tint below is offered, not applied.
    pub background_color: String,
    pub suggested_background: String,
    pub border_color: String,
    pub banner_color: String,
    pub banner_text_color: String,
    /// Usable logo colors, darkest first.
    pub dot_presets: Vec<String>,
    pub background_presets: Vec<String>,
}

/// Drop white-ish colors and sort the rest darkest first.
/// Never returns an empty list.
pub fn usable_colors(dominant: &[String]) -> Vec<String> {
    let mut colors: Vec<String> = dominant
        .iter()
        .filter(|c| brightness(c) < WHITE_THRESHOLD)
        .cloned()
        .collect();
    if colors.is_empty() {
        colors.push(FALLBACK_MAIN.to_string());
    }
    colors.sort_by(|a, b| brightness(a).total_cmp(&brightness(b)));
    colors
}

pub fn derive_palette(dominant: &[String]) -> DerivedPalette {
    let colors = usable_colors(dominant);
    let main_color = colors[0].clone();
    let is_dark = brightness(&main_color) < DARK_THRESHOLD;

    let corner_color = match colors.get(1) {
        Some(second) => second.clone(),
        None if is_dark => CORNER_ON_DARK.to_string(),
        None => CORNER_ON_LIGHT.to_string(),
    };
    let suggested_background = lighten(&main_color, TINT_FACTOR);

    DerivedPalette {
        corner_color,
        background_color: WHITE.to_string(),
        border_color: main_color.clone(),
        banner_color: main_color.clone(),
        banner_text_color: if is_dark { WHITE } else { BLACK }.to_string(),
        background_presets: vec![suggested_background.clone(), WHITE.to_string()],
        suggested_background,
        dot_presets: colors,
        main_color,
    }
}

/// Decode a logo and derive its palette. Any failure fails the whole
/// derivation.
pub fn logo_palette(bytes: &[u8]) -> Result<DerivedPalette, PaletteError> {
    let dominant = extract_dominant_colors(bytes, DEFAULT_MAX_COLORS)?;
    Ok(derive_palette(&dominant))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors(list: &[&str]) -> Vec<String> {
        list.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn all_white_falls_back_to_black() {
        assert_eq!(usable_colors(&colors(&["#ffffff", "#f6f6f6"])), colors(&["#000000"]));
        assert_eq!(usable_colors(&[]), colors(&["#000000"]));
    }

    #[test]
    fn darkest_color_becomes_main_and_second_becomes_corner() {
        let palette = derive_palette(&colors(&["#ff0000", "#ffffff", "#000049"]));
        assert_eq!(palette.main_color, "#000049");
        assert_eq!(palette.corner_color, "#ff0000");
        assert_eq!(palette.dot_presets, colors(&["#000049", "#ff0000"]));
        assert_eq!(palette.border_color, "#000049");
        assert_eq!(palette.banner_color, "#000049");
        assert_eq!(palette.banner_text_color, "#FFFFFF");
        assert_eq!(palette.background_color, "#FFFFFF");
    }

    #[test]
    fn corner_fallback_depends_on_main_brightness() {
        let dark = derive_palette(&colors(&["#244992"]));
        assert_eq!(dark.corner_color, CORNER_ON_DARK);

        let light = derive_palette(&colors(&["#b6dbb6"]));
        assert_eq!(light.corner_color, CORNER_ON_LIGHT);
        assert_eq!(light.banner_text_color, "#000000");
    }

    #[test]
    fn suggested_background_is_offered_not_applied() {
        let palette = derive_palette(&colors(&["#000000"]));
        assert_eq!(palette.suggested_background, "#f2f2f2");
        assert_eq!(palette.background_presets, colors(&["#f2f2f2", "#FFFFFF"]));
        assert_eq!(palette.background_color, "#FFFFFF");
    }
}
