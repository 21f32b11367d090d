//! Image normalization in pure Rust, with no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Probe** | `image::ImageReader::into_dimensions` |
//! | **Decode** | `image` (JPEG, PNG, GIF, WebP) |
//! | **Resize** | bounded dimension rule + `Triangle` resampling |
//! | **Encode** | `JpegEncoder` at quality 70 |
//! | **Embed** | base64 `data:` URI |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend
//! - **Source / data URI**: how bytes come in and go out

pub mod backend;
mod calculations;
pub mod data_uri;
pub mod operations;
mod params;
pub mod rust_backend;
pub mod source;

pub use backend::{
    DecodeError, Dimensions, EncodeError, EncodedImage, ImageBackend, ImageProcessingFailed,
    JPEG_MIME, Raster,
};
pub use calculations::calculate_bounded_dimensions;
pub use operations::{check_input_limits, normalize_image, plan_resize};
pub use params::{Bounds, InputLimits, NormalizeSettings, Quality};
pub use rust_backend::RustBackend;
pub use source::{ClipboardItem, RawImage, clipboard_images, jpeg_file_names, mime_for_path};
