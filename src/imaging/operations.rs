//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take settings, compute parameters, and call the backend.

use super::backend::{DecodeError, Dimensions, EncodedImage, ImageBackend, ImageProcessingFailed};
use super::calculations::{calculate_bounded_dimensions, fits_within};
use super::params::{Bounds, InputLimits, NormalizeSettings};
use super::source::RawImage;
use tracing::debug;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, ImageProcessingFailed>;

/// Compute the output dimensions for an image without touching pixels.
pub fn plan_resize(source: Dimensions, bounds: Bounds) -> Dimensions {
    calculate_bounded_dimensions(source.as_tuple(), bounds.as_tuple()).into()
}

/// Check buffer size and header dimensions before paying for a full decode.
pub fn check_input_limits(
    backend: &impl ImageBackend,
    raw: &RawImage,
    limits: &InputLimits,
) -> std::result::Result<Dimensions, DecodeError> {
    let size = raw.bytes.len() as u64;
    if size > limits.max_input_bytes {
        return Err(DecodeError::TooLarge {
            size,
            limit: limits.max_input_bytes,
        });
    }

    let dims = backend.probe(raw)?;
    if dims.area() > limits.max_pixels {
        return Err(DecodeError::TooManyPixels {
            width: dims.width,
            height: dims.height,
            limit: limits.max_pixels,
        });
    }
    Ok(dims)
}

/// Run the full decode → resize → encode pipeline for one attachment.
///
/// Any stage failure comes back as [`ImageProcessingFailed`]; nothing is
/// partially produced.
pub fn normalize_image(
    backend: &impl ImageBackend,
    raw: &RawImage,
    settings: &NormalizeSettings,
) -> Result<EncodedImage> {
    check_input_limits(backend, raw, &settings.limits)?;

    let raster = backend.decode(raw)?;
    let source = raster.dimensions();
    let resized = if fits_within(source.as_tuple(), settings.bounds.as_tuple()) {
        debug!(input = raw.label(), %source, "decoded image, already within bounds");
        raster
    } else {
        let target = plan_resize(source, settings.bounds);
        debug!(input = raw.label(), %source, %target, "decoded image");
        backend.resize(raster, target)
    };
    let encoded = backend
        .encode(&resized, settings.quality)?
        .with_source_dimensions(source);
    debug!(
        input = raw.label(),
        bytes = encoded.len(),
        quality = settings.quality.value(),
        "encoded image"
    );
    Ok(encoded)
}
