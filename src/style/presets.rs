//! Style presets
//!
//! Each preset resolves to a shallow patch, so borders, banners and logos
//! survive a preset switch.

use serde::{Deserialize, Serialize};

use super::{ColorSlot, DotStyle, StylePatch};

/// Named looks. A preset only touches the dot shape and background color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StylePreset {
    Simple,
    Rounded,
    Dots,
    Elegant,
}

impl StylePreset {
    pub const ALL: [StylePreset; 4] = [
        StylePreset::Simple,
        StylePreset::Rounded,
        StylePreset::Dots,
        StylePreset::Elegant,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "simple" => Some(StylePreset::Simple),
            "rounded" => Some(StylePreset::Rounded),
            "dots" => Some(StylePreset::Dots),
            "elegant" => Some(StylePreset::Elegant),
            _ => None,
        }
    }

    pub fn patch(&self) -> StylePatch {
        let (dot_style, background) = match self {
            StylePreset::Simple => (DotStyle::Square, "#ffffff"),
            StylePreset::Rounded => (DotStyle::Rounded, "#ffffff"),
            StylePreset::Dots => (DotStyle::Dots, "#ffffff"),
            StylePreset::Elegant => (DotStyle::Classy, "#f8fafc"),
        };
        StylePatch {
            dot_style: Some(dot_style),
            background: Some(ColorSlot::solid(background)),
            ..Default::default()
        }
    }
}
