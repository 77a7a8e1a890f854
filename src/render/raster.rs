//! Rasterizes a style config into an RGBA image.
//!
//! The module matrix comes from the `qrcode` crate; everything visual is
//! painted here: background, dots, finder corners, quiet zone and border.
//! Banner text and logo overlay stay with the presentation layer.

use image::RgbaImage;
use qrcode::{EcLevel, QrCode};

use super::RenderError;
use crate::style::{
    ColorSlot, CornerStyle, DotStyle, ErrorCorrection, GradientShape, QrStyleConfig, Rgba,
};

/// Width of the symbol (quiet zone included) at 1x scale.
pub const BASE_SIZE: u32 = 550;

const FINDER: usize = 7;

impl From<ErrorCorrection> for EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::L => EcLevel::L,
            ErrorCorrection::M => EcLevel::M,
            ErrorCorrection::Q => EcLevel::Q,
            ErrorCorrection::H => EcLevel::H,
        }
    }
}

/// Resolved paint for a color slot.
#[derive(Debug, Clone, Copy)]
enum Paint {
    Solid(Rgba),
    Linear { start: Rgba, end: Rgba, rotation: f64 },
    Radial { start: Rgba, end: Rgba },
}

impl Paint {
    fn from_slot(slot: &ColorSlot) -> Result<Self, RenderError> {
        Ok(match slot {
            ColorSlot::Solid(solid) => Paint::Solid(solid.rgba()?),
            ColorSlot::Gradient(gradient) => {
                let start = gradient.start.rgba()?;
                let end = gradient.end.rgba()?;
                match gradient.shape {
                    GradientShape::Linear { rotation } => Paint::Linear { start, end, rotation },
                    GradientShape::Radial => Paint::Radial { start, end },
                }
            }
        })
    }

    /// Color at (x, y) inside a square area of side `extent`.
    fn color_at(&self, x: f64, y: f64, extent: f64) -> Rgba {
        let half = extent / 2.0;
        let (dx, dy) = (x - half, y - half);
        match *self {
            Paint::Solid(color) => color,
            Paint::Linear { start, end, rotation } => {
                let (sin, cos) = rotation.sin_cos();
                let reach = half * (cos.abs() + sin.abs());
                let t = if reach > 0.0 { 0.5 + (dx * cos + dy * sin) / (2.0 * reach) } else { 0.0 };
                start.lerp(end, t)
            }
            Paint::Radial { start, end } => {
                let t = if half > 0.0 { (dx * dx + dy * dy).sqrt() / half } else { 0.0 };
                start.lerp(end, t)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Shape {
    Square,
    Circle,
    Rounded(f64),
}

impl Shape {
    fn for_dot(style: DotStyle) -> Self {
        match style {
            DotStyle::Square | DotStyle::Classy => Shape::Square,
            DotStyle::Dots => Shape::Circle,
            DotStyle::Rounded | DotStyle::ClassyRounded => Shape::Rounded(0.3),
            DotStyle::ExtraRounded => Shape::Rounded(0.45),
        }
    }

    fn for_corner(style: CornerStyle) -> Self {
        match style {
            CornerStyle::Square => Shape::Square,
            CornerStyle::Dot => Shape::Circle,
            CornerStyle::ExtraRounded => Shape::Rounded(0.45),
        }
    }

    /// Whether a point, relative to the cell's top-left, falls inside a cell of side `size`.
    fn contains(&self, px: f64, py: f64, size: f64) -> bool {
        match *self {
            Shape::Square => true,
            Shape::Circle => {
                let r = size / 2.0;
                (px - r).powi(2) + (py - r).powi(2) <= r * r
            }
            Shape::Rounded(ratio) => {
                let r = size * ratio;
                let cx = px.clamp(r, size - r);
                let cy = py.clamp(r, size - r);
                (px - cx).powi(2) + (py - cy).powi(2) <= r * r
            }
        }
    }
}

fn blend(dst: &mut image::Rgba<u8>, src: Rgba) {
    let alpha = f64::from(src.a) / 255.0;
    if alpha <= 0.0 {
        return;
    }
    let [r, g, b, a] = dst.0;
    let dst_alpha = f64::from(a) / 255.0;
    let out_alpha = alpha + dst_alpha * (1.0 - alpha);
    let mix = |s: u8, d: u8| {
        let value = (f64::from(s) * alpha + f64::from(d) * dst_alpha * (1.0 - alpha)) / out_alpha;
        value.round().clamp(0.0, 255.0) as u8
    };
    dst.0 = [
        mix(src.r, r),
        mix(src.g, g),
        mix(src.b, b),
        (out_alpha * 255.0).round() as u8,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Region {
    Data,
    CornerSquare,
    CornerDot,
}

fn region(x: usize, y: usize, n: usize) -> Region {
    let origins = [(0, 0), (n - FINDER, 0), (0, n - FINDER)];
    for (ox, oy) in origins {
        if (ox..ox + FINDER).contains(&x) && (oy..oy + FINDER).contains(&y) {
            let (lx, ly) = (x - ox, y - oy);
            if (2..5).contains(&lx) && (2..5).contains(&ly) {
                return Region::CornerDot;
            }
            return Region::CornerSquare;
        }
    }
    Region::Data
}

/// Render `data` with the given style. `scale` multiplies every pixel
/// dimension (2 for device-scale exports).
pub fn render(config: &QrStyleConfig, data: &str, scale: u32) -> Result<RgbaImage, RenderError> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), config.error_correction.into())
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    let n = code.width();
    let modules = code.to_colors();

    let scale = scale.max(1);
    let size = BASE_SIZE * scale;
    let border = config.border.width * scale;
    let canvas = size + 2 * border;
    let margin = f64::from(config.margin * scale);
    let cell = (f64::from(size) - 2.0 * margin) / n as f64;
    if cell <= 0.0 {
        return Err(RenderError::TooSmall);
    }

    let background = Paint::from_slot(&config.background)?;
    let dots = Paint::from_slot(&config.dots)?;
    let corner_dot = Rgba::parse(config.corner_dots_color())?;
    let border_color = Rgba::parse(&config.border.color)?;

    let mut img = RgbaImage::new(canvas, canvas);
    let extent = f64::from(size);

    if border > 0 {
        let radius = f64::from(config.border.radius * scale);
        let outer = Shape::Rounded(if canvas > 0 { radius / f64::from(canvas) } else { 0.0 });
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            if outer.contains(f64::from(x) + 0.5, f64::from(y) + 0.5, f64::from(canvas)) {
                blend(pixel, border_color);
            }
        }
    }

    for y in 0..size {
        for x in 0..size {
            let color = background.color_at(f64::from(x) + 0.5, f64::from(y) + 0.5, extent);
            blend(img.get_pixel_mut(x + border, y + border), color);
        }
    }

    let dot_shape = Shape::for_dot(config.dot_style);
    let corner_square_shape = Shape::for_corner(config.corner_square_style);
    let corner_dot_shape = Shape::for_corner(config.corner_dot_style);

    for my in 0..n {
        for mx in 0..n {
            if modules[my * n + mx] != qrcode::Color::Dark {
                continue;
            }
            let area = region(mx, my, n);
            let shape = match area {
                Region::Data => dot_shape,
                Region::CornerSquare => corner_square_shape,
                Region::CornerDot => corner_dot_shape,
            };

            let x0 = margin + mx as f64 * cell;
            let y0 = margin + my as f64 * cell;
            let (px_start, px_end) = (x0.floor() as u32, ((x0 + cell).ceil() as u32).min(size));
            let (py_start, py_end) = (y0.floor() as u32, ((y0 + cell).ceil() as u32).min(size));

            for py in py_start..py_end {
                for px in px_start..px_end {
                    let (cx, cy) = (f64::from(px) + 0.5, f64::from(py) + 0.5);
                    let (lx, ly) = (cx - x0, cy - y0);
                    if lx < 0.0 || ly < 0.0 || lx > cell || ly > cell {
                        continue;
                    }
                    if !shape.contains(lx, ly, cell) {
                        continue;
                    }
                    let color = match area {
                        Region::CornerDot => corner_dot,
                        _ => dots.color_at(cx, cy, extent),
                    };
                    blend(img.get_pixel_mut(px + border, py + border), color);
                }
            }
        }
    }

    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{ColorSlot, QrStyleConfig};

    #[test]
    fn square_output_with_border() {
        let mut config = QrStyleConfig::default();
        config.set_border_width(5);
        config.border.color = "#ff0000".into();
        let img = render(&config, "https://example.com", 1).unwrap();
        assert_eq!(img.width(), BASE_SIZE + 10);
        assert_eq!(img.height(), img.width());
        assert_eq!(img.get_pixel(1, 1).0, [255, 0, 0, 255]);
    }

    #[test]
    fn quiet_zone_shows_background() {
        let mut config = QrStyleConfig::default();
        config.background = ColorSlot::solid("#00ff00");
        let img = render(&config, "hello", 1).unwrap();
        assert_eq!(img.get_pixel(2, 2).0, [0, 255, 0, 255]);
    }

    #[test]
    fn finder_corner_uses_dots_color() {
        let config = QrStyleConfig::default();
        let img = render(&config, "hello", 1).unwrap();
        // first module of the top-left finder pattern is always dark
        let m = config.margin + 1;
        assert_eq!(img.get_pixel(m, m).0, [0, 0, 0, 255]);
    }

    #[test]
    fn device_scale_doubles_size() {
        let img = render(&QrStyleConfig::default(), "hello", 2).unwrap();
        assert_eq!(img.width(), BASE_SIZE * 2);
    }

    #[test]
    fn oversized_payload_is_an_error() {
        let data = "x".repeat(4000);
        assert!(matches!(
            render(&QrStyleConfig::default(), &data, 1),
            Err(RenderError::Encode(_))
        ));
    }
}
