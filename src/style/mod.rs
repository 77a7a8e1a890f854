//! QR style configuration
//!
//! `QrStyleConfig` is the single authoritative description of one QR code:
//! what it encodes and how it looks. Numeric fields are clamped into their
//! documented ranges by the setters and by [`QrStyleConfig::normalize`];
//! out-of-range input never errors.

pub mod color;
pub mod editor;
pub mod patch;
pub mod presets;

use serde::{Deserialize, Serialize};

use crate::content::{QrContent, ValidationError};

pub use color::{ColorSlot, Gradient, GradientShape, Rgba, SolidColor};
pub use editor::StyleEditor;
pub use patch::StylePatch;
pub use presets::StylePreset;

pub const MARGIN_RANGE: (u32, u32) = (0, 50);
pub const LOGO_SIZE_RANGE: (f32, f32) = (0.1, 0.5);
pub const BANNER_WIDTH_RANGE: (u32, u32) = (50, 100);
pub const BANNER_FONT_SIZE_RANGE: (u32, u32) = (12, 32);
pub const BORDER_WIDTH_RANGE: (u32, u32) = (0, 20);
pub const BORDER_RADIUS_RANGE: (u32, u32) = (0, 24);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DotStyle {
    #[default]
    Square,
    Dots,
    Rounded,
    Classy,
    ClassyRounded,
    ExtraRounded,
}

/// Shape for both the corner squares and the corner dots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CornerStyle {
    #[default]
    Square,
    Dot,
    ExtraRounded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorCorrection {
    L,
    M,
    #[default]
    Q,
    H,
}

impl ErrorCorrection {
    /// Share of damaged modules the symbol can recover from.
    pub fn recovery_percent(&self) -> u8 {
        match self {
            ErrorCorrection::L => 7,
            ErrorCorrection::M => 15,
            ErrorCorrection::Q => 25,
            ErrorCorrection::H => 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Border {
    /// Pixels; 0 means no border.
    pub width: u32,
    pub style: BorderStyle,
    pub color: String,
    pub radius: u32,
}

impl Default for Border {
    fn default() -> Self {
        Self {
            width: 0,
            style: BorderStyle::Solid,
            color: "#000000".to_string(),
            radius: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BannerPosition {
    #[default]
    None,
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    #[serde(rename = "system-ui")]
    SystemUi,
    Arial,
    Helvetica,
    Georgia,
    #[serde(rename = "Times New Roman")]
    TimesNewRoman,
    #[serde(rename = "Courier New")]
    CourierNew,
    Verdana,
    #[serde(rename = "Trebuchet MS")]
    TrebuchetMs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Banner {
    pub position: BannerPosition,
    pub text: String,
    /// Percentage of the QR width.
    pub width_percent: u32,
    pub font_size: u32,
    pub font_family: FontFamily,
    pub color: String,
    pub text_color: String,
    pub bold: bool,
    pub italic: bool,
}

impl Default for Banner {
    fn default() -> Self {
        Self {
            position: BannerPosition::None,
            text: String::new(),
            width_percent: 80,
            font_size: 16,
            font_family: FontFamily::SystemUi,
            color: "#000000".to_string(),
            text_color: "#FFFFFF".to_string(),
            bold: false,
            italic: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Logo {
    /// Reference to the uploaded image in external storage.
    pub url: String,
    /// Fraction of the QR width.
    pub size: f32,
}

/// Missing fields take their defaults when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrStyleConfig {
    pub content: QrContent,
    pub dot_style: DotStyle,
    pub corner_square_style: CornerStyle,
    pub corner_dot_style: CornerStyle,
    pub error_correction: ErrorCorrection,
    /// Quiet zone in pixels.
    pub margin: u32,
    pub dots: ColorSlot,
    pub background: ColorSlot,
    /// Solid only; `None` follows the dots color.
    pub corner_dots_color: Option<String>,
    pub border: Border,
    pub banner: Banner,
    pub logo: Option<Logo>,
}

impl Default for QrStyleConfig {
    fn default() -> Self {
        Self {
            content: QrContent::default(),
            dot_style: DotStyle::Square,
            corner_square_style: CornerStyle::Square,
            corner_dot_style: CornerStyle::Square,
            error_correction: ErrorCorrection::Q,
            margin: 10,
            dots: ColorSlot::solid("#000000"),
            background: ColorSlot::solid("#ffffff"),
            corner_dots_color: None,
            border: Border::default(),
            banner: Banner::default(),
            logo: None,
        }
    }
}

fn clamp_u32(value: u32, (min, max): (u32, u32)) -> u32 {
    value.clamp(min, max)
}

impl QrStyleConfig {
    pub fn set_margin(&mut self, margin: u32) {
        self.margin = clamp_u32(margin, MARGIN_RANGE);
    }

    pub fn set_border_width(&mut self, width: u32) {
        self.border.width = clamp_u32(width, BORDER_WIDTH_RANGE);
    }

    pub fn set_border_radius(&mut self, radius: u32) {
        self.border.radius = clamp_u32(radius, BORDER_RADIUS_RANGE);
    }

    pub fn set_banner_width(&mut self, percent: u32) {
        self.banner.width_percent = clamp_u32(percent, BANNER_WIDTH_RANGE);
    }

    pub fn set_banner_font_size(&mut self, size: u32) {
        self.banner.font_size = clamp_u32(size, BANNER_FONT_SIZE_RANGE);
    }

    pub fn set_logo_size(&mut self, size: f32) {
        if let Some(logo) = self.logo.as_mut() {
            logo.size = clamp_logo_size(size);
        }
    }

    /// Color used for the corner dots.
    pub fn corner_dots_color(&self) -> &str {
        self.corner_dots_color
            .as_deref()
            .unwrap_or_else(|| self.dots.primary_color())
    }

    /// Pull every numeric field back into range and tidy color slots.
    pub fn normalize(&mut self) {
        self.set_margin(self.margin);
        self.set_border_width(self.border.width);
        self.set_border_radius(self.border.radius);
        self.set_banner_width(self.banner.width_percent);
        self.set_banner_font_size(self.banner.font_size);
        if let Some(logo) = self.logo.as_mut() {
            logo.size = clamp_logo_size(logo.size);
        }
        self.dots.normalize();
        self.background.normalize();
    }

    /// Checks that must pass before the config may be persisted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.content.validate()?;
        self.dots.validate()?;
        self.background.validate()?;
        Rgba::parse(self.corner_dots_color())?;
        Rgba::parse(&self.border.color)?;
        if self.banner.position != BannerPosition::None {
            Rgba::parse(&self.banner.color)?;
            Rgba::parse(&self.banner.text_color)?;
        }
        Ok(())
    }
}

fn clamp_logo_size(size: f32) -> f32 {
    if size.is_nan() {
        return LOGO_SIZE_RANGE.0;
    }
    size.clamp(LOGO_SIZE_RANGE.0, LOGO_SIZE_RANGE.1)
}
