use std::io::Cursor;
use std::str::FromStr;

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};

use super::RenderError;

/// Device scale applied to downloads.
pub const EXPORT_SCALE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
            ExportFormat::Webp => "webp",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::Webp => "image/webp",
        }
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            ExportFormat::Png => ImageFormat::Png,
            ExportFormat::Jpeg => ImageFormat::Jpeg,
            ExportFormat::Webp => ImageFormat::WebP,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpeg" | "jpg" => Ok(ExportFormat::Jpeg),
            "webp" => Ok(ExportFormat::Webp),
            other => Err(RenderError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// `qr-code-<epoch ms>.<ext>`
pub fn export_filename(format: ExportFormat, epoch_ms: i64) -> String {
    format!("qr-code-{}.{}", epoch_ms, format.extension())
}

/// A finished download.
#[derive(Debug, Clone)]
pub struct Export {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// JPEG has no alpha channel, so transparent areas are flattened onto white.
fn flatten_on_white(img: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b, a] = img.get_pixel(x, y).0;
        let alpha = u32::from(a);
        let over = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha)) / 255) as u8;
        image::Rgb([over(r), over(g), over(b)])
    })
}

pub fn encode(img: &RgbaImage, format: ExportFormat) -> Result<Vec<u8>, RenderError> {
    let mut out = Cursor::new(Vec::new());
    let dynamic = match format {
        ExportFormat::Jpeg => DynamicImage::ImageRgb8(flatten_on_white(img)),
        ExportFormat::Png | ExportFormat::Webp => DynamicImage::ImageRgba8(img.clone()),
    };
    dynamic.write_to(&mut out, format.image_format())?;
    Ok(out.into_inner())
}
