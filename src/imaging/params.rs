//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides the output dimensions) and the [`backend`](super::backend)
//! (which does the actual pixel work). This separation allows swapping backends
//! (e.g. for testing with a mock) without changing operation logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 70). Clamped on construction.
//! - [`Bounds`]: Maximum width/height for attached images (default 800×600).
//! - [`InputLimits`]: Size guards applied before a full decode.
//! - [`NormalizeSettings`]: Everything one normalization run needs.

use crate::config::ImageConfig;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(70)
    }
}

/// Maximum output dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub max_width: u32,
    pub max_height: u32,
}

impl Bounds {
    pub fn as_tuple(self) -> (u32, u32) {
        (self.max_width, self.max_height)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            max_width: 800,
            max_height: 600,
        }
    }
}

/// Guards checked before the decoder allocates a full raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputLimits {
    /// Largest accepted input buffer, in bytes.
    pub max_input_bytes: u64,
    /// Largest accepted `width * height` read from the image header.
    pub max_pixels: u64,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_input_bytes: 20 * 1024 * 1024,
            max_pixels: 40_000_000,
        }
    }
}

/// Settings for a single decode → resize → encode run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NormalizeSettings {
    pub bounds: Bounds,
    pub quality: Quality,
    pub limits: InputLimits,
}

impl NormalizeSettings {
    pub fn from_config(config: &ImageConfig) -> Self {
        Self {
            bounds: Bounds {
                max_width: config.max_width,
                max_height: config.max_height,
            },
            quality: Quality::new(config.quality),
            limits: InputLimits {
                max_input_bytes: config.max_input_bytes,
                max_pixels: config.max_pixels,
            },
        }
    }
}
