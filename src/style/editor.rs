//! Versioned holder for the style being edited.
//!
//! Every mutation bumps `version`; render targets compare it against the
//! version they last drew to decide whether a re-render is due.

use tracing::warn;

use super::{ColorSlot, GradientShape, QrStyleConfig, StylePatch, StylePreset};
use crate::palette::DerivedPalette;

#[derive(Debug, Clone, Default)]
pub struct StyleEditor {
    config: QrStyleConfig,
    version: u64,
}

impl StyleEditor {
    pub fn new(mut config: QrStyleConfig) -> Self {
        config.normalize();
        Self { config, version: 0 }
    }

    pub fn config(&self) -> &QrStyleConfig {
        &self.config
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn into_config(self) -> QrStyleConfig {
        self.config
    }

    /// Run an arbitrary edit, then clamp and bump the version.
    pub fn update(&mut self, edit: impl FnOnce(&mut QrStyleConfig)) {
        edit(&mut self.config);
        self.config.normalize();
        self.version += 1;
    }

    pub fn apply(&mut self, patch: StylePatch) {
        if patch.is_empty() {
            return;
        }
        patch.apply_to(&mut self.config);
        self.version += 1;
    }

    pub fn apply_preset(&mut self, preset: StylePreset) {
        self.apply(preset.patch());
    }

    /// Unknown names are logged and ignored. Returns whether a preset applied.
    pub fn apply_preset_by_name(&mut self, name: &str) -> bool {
        match StylePreset::from_name(name) {
            Some(preset) => {
                self.apply_preset(preset);
                true
            }
            None => {
                warn!(preset = %name, "unknown style preset, leaving style unchanged");
                false
            }
        }
    }

    pub fn set_dots_gradient(&mut self, enabled: bool, shape: GradientShape) {
        self.update(|config| config.dots = toggle(config.dots.clone(), enabled, shape));
    }

    pub fn set_background_gradient(&mut self, enabled: bool, shape: GradientShape) {
        self.update(|config| {
            config.background = toggle(config.background.clone(), enabled, shape)
        });
    }

    /// Push logo-derived colors into the dependent fields. The suggested
    /// background tint is left for the caller to offer.
    pub fn apply_palette(&mut self, palette: &DerivedPalette) {
        self.update(|config| {
            config.dots = ColorSlot::solid(palette.main_color.clone());
            config.corner_dots_color = Some(palette.corner_color.clone());
            config.background = ColorSlot::solid(palette.background_color.clone());
            config.border.color = palette.border_color.clone();
            config.banner.color = palette.banner_color.clone();
            config.banner.text_color = palette.banner_text_color.clone();
        });
    }
}

fn toggle(slot: ColorSlot, enabled: bool, shape: GradientShape) -> ColorSlot {
    if enabled {
        slot.into_gradient(shape)
    } else {
        slot.into_solid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::derive_palette;
    use crate::style::{Border, DotStyle};

    #[test]
    fn unknown_preset_is_a_no_op() {
        let mut editor = StyleEditor::default();
        let before = editor.config().clone();
        assert!(!editor.apply_preset_by_name("neon"));
        assert_eq!(editor.config(), &before);
        assert_eq!(editor.version(), 0);
    }

    #[test]
    fn preset_keeps_border_banner_and_logo() {
        let mut editor = StyleEditor::default();
        editor.update(|c| {
            c.border = Border { width: 6, ..Border::default() };
            c.banner.text = "Scan me".into();
        });
        assert!(editor.apply_preset_by_name("elegant"));
        let config = editor.config();
        assert_eq!(config.dot_style, DotStyle::Classy);
        assert_eq!(config.background, ColorSlot::solid("#f8fafc"));
        assert_eq!(config.border.width, 6);
        assert_eq!(config.banner.text, "Scan me");
        assert_eq!(editor.version(), 2);
    }

    #[test]
    fn gradient_toggle_round_trip() {
        let mut editor = StyleEditor::default();
        editor.set_dots_gradient(true, GradientShape::linear(0.5));
        assert!(editor.config().dots.is_gradient());
        editor.set_dots_gradient(false, GradientShape::Radial);
        assert_eq!(editor.config().dots, ColorSlot::solid("#000000"));
    }

    #[test]
    fn palette_drives_dependent_fields() {
        let mut editor = StyleEditor::default();
        editor.set_background_gradient(true, GradientShape::Radial);
        let palette = derive_palette(&["#b6dbb6".to_string()]);
        editor.apply_palette(&palette);

        let config = editor.config();
        assert_eq!(config.dots, ColorSlot::solid("#b6dbb6"));
        assert_eq!(config.corner_dots_color(), "#DC2626");
        assert_eq!(config.background, ColorSlot::solid("#FFFFFF"));
        assert_eq!(config.border.color, "#b6dbb6");
        assert_eq!(config.banner.text_color, "#000000");
    }
}
