//! Application configuration module.
//!
//! Handles loading, validating, and merging `postbox.toml`. Stock defaults
//! are overridden by whatever the user file sets; everything else keeps its
//! default.
//!
//! ## Config File Location
//!
//! `postbox.toml` in the working directory, or any file passed with
//! `--config`. A missing default file means "use the defaults"; a missing
//! explicit file is an error.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [image]
//! max_width = 800            # Landscape images wider than this are scaled down
//! max_height = 600           # Portrait/square images taller than this are scaled down
//! quality = 70               # JPEG quality (1-100)
//! max_input_bytes = 20971520 # Reject larger uploads before decoding
//! max_pixels = 40000000      # Reject images whose header reports more pixels
//!
//! [post]
//! max_content_chars = 280    # Longest accepted post body
//!
//! [store]
//! path = "posts.json"        # JSON file backing the post store
//!
//! [processing]
//! max_threads = 4            # Parallel workers for batch normalize (omit for auto)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [image]
//! quality = 85
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "postbox.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Application configuration loaded from `postbox.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Attachment normalization settings.
    pub image: ImageConfig,
    /// Post composition rules.
    pub post: PostConfig,
    /// Where posts are persisted.
    pub store: StoreConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.image.max_width == 0 || self.image.max_height == 0 {
            return Err(ConfigError::Validation(
                "image.max_width and image.max_height must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.image.quality) {
            return Err(ConfigError::Validation(
                "image.quality must be 1-100".into(),
            ));
        }
        if self.image.max_input_bytes == 0 || self.image.max_pixels == 0 {
            return Err(ConfigError::Validation(
                "image.max_input_bytes and image.max_pixels must be non-zero".into(),
            ));
        }
        if self.post.max_content_chars == 0 {
            return Err(ConfigError::Validation(
                "post.max_content_chars must be non-zero".into(),
            ));
        }
        if self.store.path.as_os_str().is_empty() {
            return Err(ConfigError::Validation("store.path must not be empty".into()));
        }
        Ok(())
    }
}

/// Attachment normalization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageConfig {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality, 1-100. The browser equivalent of `0.7` is `70`.
    pub quality: u32,
    pub max_input_bytes: u64,
    pub max_pixels: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_width: 800,
            max_height: 600,
            quality: 70,
            max_input_bytes: 20 * 1024 * 1024,
            max_pixels: 40_000_000,
        }
    }
}

/// Post composition rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PostConfig {
    /// Longest accepted post body, counted in characters.
    pub max_content_chars: usize,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            max_content_chars: 280,
        }
    }
}

/// Post store location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("posts.json"),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel normalize workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_threads: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_threads
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(AppConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the application config.
///
/// `explicit` is a path the user asked for; it must exist. Without one,
/// [`DEFAULT_CONFIG_FILE`] in the working directory is used when present.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => {
            let raw = load_raw_config(path)?;
            if raw.is_none() {
                return Err(ConfigError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("config file not found: {}", path.display()),
                )));
            }
            raw
        }
        None => load_raw_config(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    resolve_config(stock_defaults_value()?, overlay)
}

/// Returns a fully-commented stock `postbox.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# postbox configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Attached images
# ---------------------------------------------------------------------------
[image]
# Landscape images (wider than tall) wider than max_width are scaled so the
# width fits. Portrait and square images taller than max_height are scaled
# so the height fits. Only that one axis is checked.
max_width = 800
max_height = 600

# JPEG encoding quality (1 = worst, 100 = best).
quality = 70

# Inputs larger than this many bytes are rejected before decoding.
max_input_bytes = 20971520

# Images whose header reports more pixels than this are rejected.
max_pixels = 40000000

# ---------------------------------------------------------------------------
# Posts
# ---------------------------------------------------------------------------
[post]
# Longest accepted post body, in characters.
max_content_chars = 280

# ---------------------------------------------------------------------------
# Storage
# ---------------------------------------------------------------------------
[store]
# JSON file holding all posts. Created on first write.
path = "posts.json"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for `postbox normalize`.
# Omit to use all CPU cores. Values above the core count are clamped.
# max_threads = 4
"##
}
