//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Probe | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, GIF, WebP) | `image` crate (pure Rust decoders) |
//! | Resize | `DynamicImage::resize_exact` with `Triangle` (bilinear) filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder`, alpha flattened onto black |

use super::backend::{
    DecodeError, Dimensions, EncodeError, EncodedImage, ImageBackend, JPEG_MIME, Raster,
};
use super::params::Quality;
use super::source::RawImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, ImageReader, RgbImage};
use std::io::Cursor;

/// Input formats whose decoders are compiled in.
const DECODABLE_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Resampling filter for downscaling. Bilinear keeps edges smooth without
/// the ringing Lanczos adds to small JPEGs.
const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a reader over the raw bytes with the format sniffed from content.
fn open_reader(raw: &RawImage) -> Result<ImageReader<Cursor<&[u8]>>, DecodeError> {
    if raw.bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let reader = ImageReader::new(Cursor::new(raw.bytes.as_slice()))
        .with_guessed_format()
        .map_err(|e| DecodeError::Corrupt(e.to_string()))?;

    match reader.format() {
        Some(format) if DECODABLE_FORMATS.contains(&format) => Ok(reader),
        Some(format) => Err(DecodeError::UnrecognizedFormat(format!(
            "{format:?} is not supported"
        ))),
        None => Err(DecodeError::UnrecognizedFormat(format!(
            "{} bytes declared as {}",
            raw.bytes.len(),
            raw.mime
        ))),
    }
}

/// Drop the alpha channel the way a canvas does when exporting JPEG:
/// transparent pixels end up black.
fn flatten_alpha(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

impl ImageBackend for RustBackend {
    fn probe(&self, raw: &RawImage) -> Result<Dimensions, DecodeError> {
        let (width, height) = open_reader(raw)?
            .into_dimensions()
            .map_err(|e| DecodeError::Corrupt(e.to_string()))?;
        Ok(Dimensions::new(width, height))
    }

    fn decode(&self, raw: &RawImage) -> Result<Raster, DecodeError> {
        let image = open_reader(raw)?
            .decode()
            .map_err(|e| DecodeError::Corrupt(e.to_string()))?;
        Ok(Raster::new(image))
    }

    fn resize(&self, raster: Raster, target: Dimensions) -> Raster {
        if raster.dimensions() == target {
            return raster;
        }
        let resized = raster
            .into_image()
            .resize_exact(target.width, target.height, RESIZE_FILTER);
        Raster::new(resized)
    }

    fn encode(&self, raster: &Raster, quality: Quality) -> Result<EncodedImage, EncodeError> {
        let dimensions = raster.dimensions();
        if dimensions.area() == 0 {
            return Err(EncodeError::EmptyRaster(dimensions));
        }

        let rgb = flatten_alpha(raster.image());
        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, quality.value() as u8)
            .write_image(
                rgb.as_raw(),
                dimensions.width,
                dimensions.height,
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| EncodeError::Codec(e.to_string()))?;

        Ok(EncodedImage {
            bytes,
            mime: JPEG_MIME,
            quality,
            dimensions,
            source_dimensions: dimensions,
        })
    }
}
