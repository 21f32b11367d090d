//! Shared test utilities for the postbox test suite.
//!
//! Provides synthetic images (encoded in memory, never touching disk) and
//! small post fixtures used across the imaging, composer and store tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let raw = raw_jpeg(1600, 1200);
//! let encoded = normalize_image(&RustBackend::new(), &raw, &NormalizeSettings::default())?;
//! assert_decodes_to(&encoded.bytes, (800, 600));
//! ```

use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;

use crate::imaging::RawImage;
use crate::posts::NewPost;

// =========================================================================
// Synthetic images
// =========================================================================

/// Opaque RGBA gradient; enough structure that JPEG quality matters.
pub fn synthetic_rgba(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8, 255])
    }))
}

/// Encode a synthetic image in the given container format.
///
/// JPEG gets an RGB copy since the encoder rejects alpha.
pub fn encode_synthetic(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let image = synthetic_rgba(width, height);
    let image = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
        _ => image,
    };
    let mut cursor = Cursor::new(Vec::new());
    image.write_to(&mut cursor, format).unwrap();
    cursor.into_inner()
}

pub fn raw_jpeg(width: u32, height: u32) -> RawImage {
    RawImage::new(encode_synthetic(width, height, ImageFormat::Jpeg), "image/jpeg")
        .with_name(format!("{width}x{height}.jpg"))
}

pub fn raw_png(width: u32, height: u32) -> RawImage {
    RawImage::new(encode_synthetic(width, height, ImageFormat::Png), "image/png")
        .with_name(format!("{width}x{height}.png"))
}

/// Decode `bytes` and assert the resulting dimensions.
pub fn assert_decodes_to(bytes: &[u8], expected: (u32, u32)) {
    let decoded = image::load_from_memory(bytes)
        .unwrap_or_else(|e| panic!("output does not decode: {e}"));
    assert_eq!(
        (decoded.width(), decoded.height()),
        expected,
        "decoded dimensions mismatch"
    );
}

// =========================================================================
// Post fixtures
// =========================================================================

pub fn new_post(email: &str, content: &str) -> NewPost {
    NewPost {
        content: content.to_string(),
        user_email: email.to_string(),
        image_url: None,
    }
}
