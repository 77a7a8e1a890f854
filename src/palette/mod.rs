//! Logo color derivation
//!
//! An uploaded logo is reduced to a handful of dominant colors, which then
//! drive the dependent style fields (dots, corners, border, banner).

pub mod derive;
pub mod extract;
pub mod quantize;

use thiserror::Error;

pub use derive::{derive_palette, logo_palette, usable_colors, DerivedPalette};
pub use extract::{dominant_colors, extract_dominant_colors, DEFAULT_MAX_COLORS};

#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("failed to decode logo image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("logo image has no pixels")]
    Empty,
}
