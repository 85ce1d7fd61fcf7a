//! Crop-to-fill image fitting
//!
//! Artwork is scaled so it covers the target box completely and the
//! overflow is cut evenly from both sides. Images are never letterboxed.

use crate::types::Result;
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};
use std::path::Path;

/// Scaled size that covers `target` while keeping the source aspect ratio.
pub fn fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = (source.0.max(1), source.1.max(1));
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h.max(1) as f64;

    if src_aspect > tgt_aspect {
        // Wider: match height, overflow width
        let w = (tgt_h as f64 * src_aspect).round() as u32;
        (w.max(tgt_w), tgt_h)
    } else {
        let h = (tgt_w as f64 / src_aspect).round() as u32;
        (tgt_w, h.max(tgt_h))
    }
}

/// Scale and center-crop a decoded image to exactly `width` × `height`.
pub fn fit_decoded(img: &DynamicImage, width: u32, height: u32) -> RgbImage {
    let (width, height) = (width.max(1), height.max(1));
    let (scaled_w, scaled_h) = fill_dimensions((img.width(), img.height()), (width, height));
    let scaled = img.resize_exact(scaled_w, scaled_h, FilterType::Lanczos3);

    let x = (scaled_w - width) / 2;
    let y = (scaled_h - height) / 2;
    scaled.crop_imm(x, y, width, height).to_rgb8()
}

/// Load an image and fit it, surfacing decode and I/O failures.
pub fn try_fit_image(path: impl AsRef<Path>, width: u32, height: u32) -> Result<RgbImage> {
    let img = image::open(path.as_ref())?;
    Ok(fit_decoded(&img, width, height))
}

/// Load an image and fit it; unreadable sources yield a white placeholder.
pub fn fit_image(path: impl AsRef<Path>, width: u32, height: u32) -> RgbImage {
    let path = path.as_ref();
    match try_fit_image(path, width, height) {
        Ok(img) => img,
        Err(e) => {
            log::warn!(
                "Could not load image {}: {}; using blank placeholder",
                path.display(),
                e
            );
            placeholder(width, height)
        }
    }
}

/// Plain white image of the given size
pub fn placeholder(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width.max(1), height.max(1), Rgb([255, 255, 255]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wider_source_matches_height() {
        assert_eq!(fill_dimensions((400, 100), (100, 100)), (400, 100));
    }

    #[test]
    fn test_taller_source_matches_width() {
        assert_eq!(fill_dimensions((100, 300), (50, 50)), (50, 150));
    }

    #[test]
    fn test_same_aspect_is_exact() {
        assert_eq!(fill_dimensions((200, 100), (100, 50)), (100, 50));
    }
}
