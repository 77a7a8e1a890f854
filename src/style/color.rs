//! Color slots: a slot is either one solid color or a two-stop gradient.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::content::ValidationError;

/// Parsed color with alpha, used by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba { r: 255, g: 255, b: 255, a: 255 };
    pub const BLACK: Rgba = Rgba { r: 0, g: 0, b: 0, a: 255 };

    /// Accepts `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)` and `rgba(r, g, b, a)`.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        let invalid = || ValidationError::InvalidColor(input.to_string());

        if let Some(hex) = s.strip_prefix('#') {
            if !hex.is_ascii() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
            return match hex.len() {
                3 => {
                    let nibble = |i: usize| {
                        u8::from_str_radix(&hex[i..i + 1], 16)
                            .map(|v| v * 17)
                            .map_err(|_| invalid())
                    };
                    Ok(Rgba { r: nibble(0)?, g: nibble(1)?, b: nibble(2)?, a: 255 })
                }
                6 => Ok(Rgba { r: byte(0)?, g: byte(2)?, b: byte(4)?, a: 255 }),
                8 => Ok(Rgba { r: byte(0)?, g: byte(2)?, b: byte(4)?, a: byte(6)? }),
                _ => Err(invalid()),
            };
        }

        let lower = s.to_ascii_lowercase();
        let (body, has_alpha) = if let Some(rest) = lower.strip_prefix("rgba(") {
            (rest, true)
        } else if let Some(rest) = lower.strip_prefix("rgb(") {
            (rest, false)
        } else {
            return Err(invalid());
        };
        let body = body.strip_suffix(')').ok_or_else(invalid)?;
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        let expected = if has_alpha { 4 } else { 3 };
        if parts.len() != expected {
            return Err(invalid());
        }
        let channel = |p: &str| p.parse::<u8>().map_err(|_| invalid());
        let a = if has_alpha {
            let alpha: f32 = parts[3].parse().map_err(|_| invalid())?;
            if !(0.0..=1.0).contains(&alpha) {
                return Err(invalid());
            }
            (alpha * 255.0).round() as u8
        } else {
            255
        };
        Ok(Rgba { r: channel(parts[0])?, g: channel(parts[1])?, b: channel(parts[2])?, a })
    }

    /// Scale alpha by a 0–1 opacity.
    pub fn with_opacity(self, opacity: f32) -> Self {
        let a = (f32::from(self.a) * opacity.clamp(0.0, 1.0)).round() as u8;
        Rgba { a, ..self }
    }

    pub fn lerp(self, other: Rgba, t: f64) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
        Rgba {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }
}

fn full_opacity() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolidColor {
    pub color: String,
    #[serde(default = "full_opacity")]
    pub opacity: f32,
}

impl SolidColor {
    pub fn new(color: impl Into<String>) -> Self {
        Self { color: color.into(), opacity: 1.0 }
    }

    pub fn rgba(&self) -> Result<Rgba, ValidationError> {
        Ok(Rgba::parse(&self.color)?.with_opacity(self.opacity))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GradientShape {
    /// Rotation in radians, kept within [0, 2π).
    Linear { rotation: f64 },
    Radial,
}

impl GradientShape {
    pub fn linear(rotation: f64) -> Self {
        GradientShape::Linear { rotation: normalize_rotation(rotation) }
    }
}

/// A two-stop gradient; `start` sits at offset 0 and `end` at offset 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    pub shape: GradientShape,
    pub start: SolidColor,
    pub end: SolidColor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ColorSlot {
    Solid(SolidColor),
    Gradient(Gradient),
}

impl ColorSlot {
    pub fn solid(color: impl Into<String>) -> Self {
        ColorSlot::Solid(SolidColor::new(color))
    }

    pub fn is_gradient(&self) -> bool {
        matches!(self, ColorSlot::Gradient(_))
    }

    /// Color a solid slot shows, or the first stop of a gradient.
    pub fn primary_color(&self) -> &str {
        match self {
            ColorSlot::Solid(solid) => &solid.color,
            ColorSlot::Gradient(gradient) => &gradient.start.color,
        }
    }

    /// Switch to gradient mode. A solid slot seeds both stops with its color.
    pub fn into_gradient(self, shape: GradientShape) -> Self {
        match self {
            ColorSlot::Solid(solid) => ColorSlot::Gradient(Gradient {
                shape,
                start: solid.clone(),
                end: solid,
            }),
            gradient => gradient,
        }
    }

    /// Switch to solid mode, keeping the first stop.
    pub fn into_solid(self) -> Self {
        match self {
            ColorSlot::Gradient(gradient) => ColorSlot::Solid(gradient.start),
            solid => solid,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            ColorSlot::Solid(solid) => solid.rgba().map(|_| ()),
            ColorSlot::Gradient(gradient) => {
                gradient.start.rgba()?;
                gradient.end.rgba()?;
                Ok(())
            }
        }
    }

    pub(crate) fn normalize(&mut self) {
        match self {
            ColorSlot::Solid(solid) => solid.opacity = solid.opacity.clamp(0.0, 1.0),
            ColorSlot::Gradient(gradient) => {
                gradient.start.opacity = gradient.start.opacity.clamp(0.0, 1.0);
                gradient.end.opacity = gradient.end.opacity.clamp(0.0, 1.0);
                if let GradientShape::Linear { rotation } = gradient.shape {
                    gradient.shape = GradientShape::linear(rotation);
                }
            }
        }
    }
}

pub fn normalize_rotation(rotation: f64) -> f64 {
    if !rotation.is_finite() {
        return 0.0;
    }
    let r = rotation.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if r >= TAU {
        0.0
    } else {
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_notations() {
        assert_eq!(Rgba::parse("#fff").unwrap(), Rgba::WHITE);
        assert_eq!(Rgba::parse("#4338CA").unwrap(), Rgba { r: 0x43, g: 0x38, b: 0xca, a: 255 });
        assert_eq!(Rgba::parse("#00000080").unwrap().a, 128);
        assert_eq!(Rgba::parse("rgb(1, 2, 3)").unwrap(), Rgba { r: 1, g: 2, b: 3, a: 255 });
        assert_eq!(Rgba::parse("rgba(1,2,3,0.5)").unwrap().a, 128);
        assert!(Rgba::parse("blue").is_err());
        assert!(Rgba::parse("#12345").is_err());
        assert!(Rgba::parse("rgb(300, 0, 0)").is_err());
    }

    #[test]
    fn gradient_round_trip_leaves_no_gradient_behind() {
        let slot = ColorSlot::solid("#123456");
        let gradient = slot.into_gradient(GradientShape::linear(1.0));
        assert!(gradient.is_gradient());

        let back = gradient.into_solid();
        assert_eq!(back, ColorSlot::solid("#123456"));
        let json = serde_json::to_value(&back).unwrap();
        assert_eq!(json["mode"], "solid");
        assert!(json.get("start").is_none());
        assert!(json.get("shape").is_none());
    }

    #[test]
    fn rotation_wraps_into_range() {
        assert_eq!(normalize_rotation(TAU), 0.0);
        assert!((normalize_rotation(-std::f64::consts::FRAC_PI_2) - 3.0 * std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        assert_eq!(normalize_rotation(f64::NAN), 0.0);
    }

    #[test]
    fn opacity_scales_alpha() {
        let c = Rgba::parse("#000000").unwrap().with_opacity(0.5);
        assert_eq!(c.a, 128);
    }
}
