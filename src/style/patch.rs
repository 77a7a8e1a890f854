//! Partial style updates
//!
//! A patch replaces whole top-level fields. Color slots in particular are
//! swapped wholesale, so a solid slot never inherits leftovers from an
//! earlier gradient and vice versa.

use serde::{Deserialize, Deserializer, Serialize};

use super::{
    Banner, Border, ColorSlot, CornerStyle, DotStyle, ErrorCorrection, Logo, QrStyleConfig,
};
use crate::content::QrContent;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StylePatch {
    pub content: Option<QrContent>,
    pub dot_style: Option<DotStyle>,
    pub corner_square_style: Option<CornerStyle>,
    pub corner_dot_style: Option<CornerStyle>,
    pub error_correction: Option<ErrorCorrection>,
    pub margin: Option<u32>,
    pub dots: Option<ColorSlot>,
    pub background: Option<ColorSlot>,
    /// `Some(None)` resets the corner dots to follow the dots color.
    #[serde(deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub corner_dots_color: Option<Option<String>>,
    pub border: Option<Border>,
    pub banner: Option<Banner>,
    /// `Some(None)` removes the logo.
    #[serde(deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub logo: Option<Option<Logo>>,
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl StylePatch {
    pub fn is_empty(&self) -> bool {
        *self == StylePatch::default()
    }

    /// Merge this patch over `config`, then clamp.
    pub fn apply_to(self, config: &mut QrStyleConfig) {
        if let Some(content) = self.content {
            config.content = content;
        }
        if let Some(dot_style) = self.dot_style {
            config.dot_style = dot_style;
        }
        if let Some(style) = self.corner_square_style {
            config.corner_square_style = style;
        }
        if let Some(style) = self.corner_dot_style {
            config.corner_dot_style = style;
        }
        if let Some(level) = self.error_correction {
            config.error_correction = level;
        }
        if let Some(margin) = self.margin {
            config.margin = margin;
        }
        if let Some(dots) = self.dots {
            config.dots = dots;
        }
        if let Some(background) = self.background {
            config.background = background;
        }
        if let Some(color) = self.corner_dots_color {
            config.corner_dots_color = color;
        }
        if let Some(border) = self.border {
            config.border = border;
        }
        if let Some(banner) = self.banner {
            config.banner = banner;
        }
        if let Some(logo) = self.logo {
            config.logo = logo;
        }
        config.normalize();
    }
}
