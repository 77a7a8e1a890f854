//! QR rasterization and image export.

pub mod export;
pub mod raster;
pub mod target;

use thiserror::Error;

use crate::content::ValidationError;
use crate::style::QrStyleConfig;

pub use export::{encode, export_filename, Export, ExportFormat, EXPORT_SCALE};
pub use raster::{render, BASE_SIZE};
pub use target::RenderTarget;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("data cannot be encoded as a QR code: {0}")]
    Encode(String),
    #[error("margin leaves no room for the symbol")]
    TooSmall,
    #[error(transparent)]
    Color(#[from] ValidationError),
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),
    #[error("nothing has been rendered yet")]
    NotRendered,
}

/// Render at device scale and encode in one step.
pub fn render_bytes(
    config: &QrStyleConfig,
    data: &str,
    format: ExportFormat,
) -> Result<Vec<u8>, RenderError> {
    let img = render(config, data, EXPORT_SCALE)?;
    encode(&img, format)
}
