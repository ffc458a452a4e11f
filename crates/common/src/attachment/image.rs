//! Image normalization
//!
//! Decodes an uploaded image, applies the EXIF orientation, and downscales
//! it so the longest side fits the configured bound. Output is always PNG,
//! which both the OCR engine and the generation API accept.

use crate::errors::{AppError, Result};
use image::{imageops::FilterType, DynamicImage, ImageFormat};
use std::io::Cursor;

/// Decode, orient, and downscale an image; returns PNG bytes.
pub fn normalize(bytes: &[u8], max_side: u32) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(bytes).map_err(|e| AppError::ImageDecode {
        message: e.to_string(),
    })?;

    let oriented = apply_orientation(decoded, read_orientation(bytes));
    let resized = resize_to_fit(oriented, max_side);

    let mut buf = Vec::new();
    resized
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| AppError::Internal {
            message: format!("Failed to encode image: {}", e),
        })?;
    Ok(buf)
}

/// Downscale so the longest side is at most `max_side`, preserving
/// aspect ratio. Images already within the bound pass through untouched.
pub(crate) fn resize_to_fit(img: DynamicImage, max_side: u32) -> DynamicImage {
    if img.width().max(img.height()) <= max_side {
        img
    } else {
        img.resize(max_side, max_side, FilterType::Lanczos3)
    }
}

/// EXIF orientation values 2-8; anything else is the identity.
fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}

fn read_orientation(bytes: &[u8]) -> u32 {
    let Ok(meta) = exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) else {
        return 1;
    };
    meta.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .unwrap_or(1)
}

/// PNG-encode a blank test image
#[cfg(test)]
pub(crate) fn test_png(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::new_rgb8(width, height);
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_bounds_longest_side() {
        let img = DynamicImage::new_rgb8(3200, 1600);
        let resized = resize_to_fit(img, 1600);
        assert_eq!(resized.width(), 1600);
        assert_eq!(resized.height(), 800);
    }

    #[test]
    fn test_resize_portrait_preserves_aspect() {
        let img = DynamicImage::new_rgb8(1000, 4000);
        let resized = resize_to_fit(img, 1600);
        assert_eq!(resized.height(), 1600);
        assert_eq!(resized.width(), 400);
    }

    #[test]
    fn test_small_image_untouched() {
        let img = DynamicImage::new_rgb8(640, 480);
        let resized = resize_to_fit(img, 1600);
        assert_eq!((resized.width(), resized.height()), (640, 480));
    }

    #[test]
    fn test_normalize_roundtrip() {
        let png = test_png(2000, 1000);
        let out = normalize(&png, 1600).unwrap();
        let reloaded = image::load_from_memory(&out).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (1600, 800));
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        let err = normalize(b"definitely not pixels", 1600).unwrap_err();
        assert!(matches!(err, AppError::ImageDecode { .. }));
    }

    #[test]
    fn test_orientation_six_rotates() {
        let img = DynamicImage::new_rgb8(40, 20);
        let rotated = apply_orientation(img, 6);
        assert_eq!((rotated.width(), rotated.height()), (20, 40));
    }
}
