//! Dominant color extraction

use image::RgbaImage;
use std::collections::HashMap;

use super::quantize::{quantize_rgb, rgb_to_hex};
use super::PaletteError;

pub const DEFAULT_MAX_COLORS: usize = 3;

/// Pixels below this alpha are ignored.
const MIN_ALPHA: u8 = 128;

/// Most frequent quantized colors of the opaque pixels, most frequent first.
///
/// Ties are broken by hex value so the result is stable.
pub fn dominant_colors(image: &RgbaImage, max_colors: usize) -> Vec<String> {
    let mut counts: HashMap<String, u64> = HashMap::new();

    for pixel in image.pixels() {
        let [r, g, b, a] = pixel.0;
        if a < MIN_ALPHA {
            continue;
        }
        let (r, g, b) = quantize_rgb(r, g, b);
        *counts.entry(rgb_to_hex(r, g, b)).or_insert(0) += 1;
    }

    let mut sorted: Vec<(String, u64)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
        .into_iter()
        .take(max_colors)
        .map(|(color, _)| color)
        .collect()
}

/// Decode an uploaded image and return its dominant colors.
pub fn extract_dominant_colors(bytes: &[u8], max_colors: usize) -> Result<Vec<String>, PaletteError> {
    let decoded = image::load_from_memory(bytes)?;
    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(PaletteError::Empty);
    }
    Ok(dominant_colors(&decoded.to_rgba8(), max_colors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn single_color_image_yields_that_color() {
        let img = RgbaImage::from_pixel(8, 8, Rgba([36, 73, 146, 255]));
        assert_eq!(dominant_colors(&img, 3), vec!["#244992".to_string()]);
    }

    #[test]
    fn transparent_pixels_are_skipped() {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 0]));
        img.put_pixel(0, 0, Rgba([0, 0, 0, 200]));
        assert_eq!(dominant_colors(&img, 3), vec!["#000000".to_string()]);
    }

    #[test]
    fn ordered_by_frequency_and_truncated() {
        let mut img = RgbaImage::from_pixel(10, 1, Rgba([0, 0, 0, 255]));
        for x in 0..3 {
            img.put_pixel(x, 0, Rgba([255, 0, 0, 255]));
        }
        img.put_pixel(3, 0, Rgba([0, 0, 255, 255]));
        assert_eq!(
            dominant_colors(&img, 2),
            vec!["#000000".to_string(), "#ff0000".to_string()]
        );
    }

    #[test]
    fn near_duplicates_merge() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([250, 2, 3, 255]));
        img.put_pixel(1, 0, Rgba([255, 0, 0, 255]));
        assert_eq!(dominant_colors(&img, 3), vec!["#ff0000".to_string()]);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(
            extract_dominant_colors(b"not an image", 3),
            Err(PaletteError::Decode(_))
        ));
    }
}
