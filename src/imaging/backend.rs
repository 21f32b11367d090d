//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four operations every backend must
//! support: probe, decode, resize, and encode.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): pure Rust, built on the
//! `image` crate's codecs.

use super::data_uri;
use super::params::Quality;
use super::source::RawImage;
use image::DynamicImage;
use std::fmt;
use thiserror::Error;

/// MIME type of every normalized image.
pub const JPEG_MIME: &str = "image/jpeg";

/// The input could not be turned into a raster.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Image is empty")]
    Empty,
    #[error("Image is too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },
    #[error("Image has too many pixels: {width}x{height} (limit {limit} pixels)")]
    TooManyPixels { width: u32, height: u32, limit: u64 },
    #[error("Unrecognized image format: {0}")]
    UnrecognizedFormat(String),
    #[error("Corrupt image data: {0}")]
    Corrupt(String),
}

/// The codec refused to serialize a raster.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Cannot encode a {0} image")]
    EmptyRaster(Dimensions),
    #[error("JPEG encode failed: {0}")]
    Codec(String),
}

/// User-facing failure of a whole decode → resize → encode run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageProcessingFailed {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("Image processing was interrupted: {0}")]
    Interrupted(String),
}

impl ImageProcessingFailed {
    /// Notice shown to the person who attached the image.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Decode(DecodeError::TooLarge { .. } | DecodeError::TooManyPixels { .. }) => {
                "Image is too large to attach."
            }
            _ => "Failed to process image.",
        }
    }
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn area(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A decoded pixel grid, owned by one pipeline run.
#[derive(Debug, Clone)]
pub struct Raster {
    image: DynamicImage,
}

impl Raster {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    /// An all-black RGB raster.
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(DynamicImage::new_rgb8(width, height))
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.image.width(), self.image.height())
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_image(self) -> DynamicImage {
        self.image
    }
}

/// A compressed image ready to embed in a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub quality: Quality,
    /// Dimensions of the encoded raster.
    pub dimensions: Dimensions,
    /// Natural dimensions of the image before resizing.
    pub source_dimensions: Dimensions,
}

impl EncodedImage {
    pub fn with_source_dimensions(mut self, source: Dimensions) -> Self {
        self.source_dimensions = source;
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `data:image/jpeg;base64,...` representation carried by a post.
    pub fn to_data_uri(&self) -> String {
        data_uri::encode(self.mime, &self.bytes)
    }
}

/// Trait for image processing backends.
///
/// Backends implement probe, decode, resize and encode; the rest of the
/// crate only talks to this trait.
pub trait ImageBackend: Send + Sync {
    /// Read dimensions from the image header without decoding pixels.
    fn probe(&self, raw: &RawImage) -> Result<Dimensions, DecodeError>;

    /// Decode the full raster.
    fn decode(&self, raw: &RawImage) -> Result<Raster, DecodeError>;

    /// Resample to exactly `target`.
    fn resize(&self, raster: Raster, target: Dimensions) -> Raster;

    /// Serialize as JPEG at the given quality.
    fn encode(&self, raster: &Raster, quality: Quality) -> Result<EncodedImage, EncodeError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock backend that records operations without touching real codecs.
    ///
    /// `decode_results` is consumed from the back, one entry per decode.
    #[derive(Default)]
    pub struct MockBackend {
        pub decode_results: Mutex<Vec<Result<Dimensions, DecodeError>>>,
        pub encode_error: Mutex<Option<EncodeError>>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Probe(String),
        Decode(String),
        Resize { from: Dimensions, to: Dimensions },
        Encode { dimensions: Dimensions, quality: u32 },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(dims: Vec<Dimensions>) -> Self {
            Self {
                decode_results: Mutex::new(dims.into_iter().map(Ok).collect()),
                ..Self::default()
            }
        }

        pub fn with_results(results: Vec<Result<Dimensions, DecodeError>>) -> Self {
            Self {
                decode_results: Mutex::new(results),
                ..Self::default()
            }
        }

        pub fn failing_encode(dims: Vec<Dimensions>, error: EncodeError) -> Self {
            let backend = Self::with_dimensions(dims);
            *backend.encode_error.lock().unwrap() = Some(error);
            backend
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageBackend for MockBackend {
        fn probe(&self, raw: &RawImage) -> Result<Dimensions, DecodeError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Probe(raw.label().to_string()));

            self.decode_results
                .lock()
                .unwrap()
                .last()
                .cloned()
                .unwrap_or_else(|| Err(DecodeError::Corrupt("No mock dimensions".to_string())))
        }

        fn decode(&self, raw: &RawImage) -> Result<Raster, DecodeError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Decode(raw.label().to_string()));

            let dims = self
                .decode_results
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(DecodeError::Corrupt("No mock dimensions".to_string())))?;
            Ok(Raster::blank(dims.width, dims.height))
        }

        fn resize(&self, raster: Raster, target: Dimensions) -> Raster {
            self.operations.lock().unwrap().push(RecordedOp::Resize {
                from: raster.dimensions(),
                to: target,
            });
            Raster::blank(target.width, target.height)
        }

        fn encode(&self, raster: &Raster, quality: Quality) -> Result<EncodedImage, EncodeError> {
            let dimensions = raster.dimensions();
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                dimensions,
                quality: quality.value(),
            });

            if let Some(error) = self.encode_error.lock().unwrap().clone() {
                return Err(error);
            }
            Ok(EncodedImage {
                bytes: vec![0xff, 0xd8, 0xff, 0xd9],
                mime: JPEG_MIME,
                quality,
                dimensions,
                source_dimensions: dimensions,
            })
        }
    }

    #[test]
    fn mock_records_decode() {
        let backend = MockBackend::with_dimensions(vec![Dimensions::new(800, 600)]);

        let raster = backend
            .decode(&RawImage::new(vec![1, 2, 3], "image/png").with_name("cat.png"))
            .unwrap();
        assert_eq!(raster.dimensions(), Dimensions::new(800, 600));

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Decode(label) if label == "cat.png"));
    }

    #[test]
    fn mock_probe_does_not_consume_results() {
        let backend = MockBackend::with_dimensions(vec![Dimensions::new(10, 20)]);
        let raw = RawImage::new(vec![1], "image/png");

        assert_eq!(backend.probe(&raw).unwrap(), Dimensions::new(10, 20));
        assert_eq!(backend.decode(&raw).unwrap().dimensions(), Dimensions::new(10, 20));
        assert!(backend.decode(&raw).is_err());
    }

    #[test]
    fn mock_records_resize_and_encode() {
        let backend = MockBackend::new();

        let resized = backend.resize(Raster::blank(1600, 1200), Dimensions::new(800, 600));
        let encoded = backend.encode(&resized, Quality::new(70)).unwrap();
        assert_eq!(encoded.dimensions, Dimensions::new(800, 600));

        let ops = backend.get_operations();
        assert_eq!(
            ops,
            vec![
                RecordedOp::Resize {
                    from: Dimensions::new(1600, 1200),
                    to: Dimensions::new(800, 600),
                },
                RecordedOp::Encode {
                    dimensions: Dimensions::new(800, 600),
                    quality: 70,
                },
            ]
        );
    }

    #[test]
    fn dimensions_display_and_conversions() {
        let dims = Dimensions::from((1920, 1080));
        assert_eq!(dims.to_string(), "1920x1080");
        assert_eq!(dims.as_tuple(), (1920, 1080));
        assert_eq!(dims.area(), 2_073_600);
    }

    #[test]
    fn encoded_image_data_uri_has_jpeg_prefix() {
        let encoded = EncodedImage {
            bytes: vec![0xff, 0xd8, 0xff],
            mime: JPEG_MIME,
            quality: Quality::default(),
            dimensions: Dimensions::new(1, 1),
            source_dimensions: Dimensions::new(1, 1),
        };
        assert_eq!(encoded.to_data_uri(), "data:image/jpeg;base64,/9j/");
        assert_eq!(encoded.len(), 3);
    }

    #[test]
    fn user_message_distinguishes_oversized_inputs() {
        let too_big = ImageProcessingFailed::from(DecodeError::TooLarge { size: 10, limit: 5 });
        assert_eq!(too_big.user_message(), "Image is too large to attach.");

        let corrupt = ImageProcessingFailed::from(DecodeError::Corrupt("eof".into()));
        assert_eq!(corrupt.user_message(), "Failed to process image.");
    }
}
