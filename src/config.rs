//! Tachyon configuration module.
//!
//! Handles loading, validating, and merging `tachyon.toml`. Stock defaults
//! (including WordPress's built-in image sizes) are overridden key by key by
//! the user's file.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! cdn_url = ""               # Base URL of the image CDN (required to rewrite)
//! upload_url = ""            # Public base URL of wp-content/uploads (required to rewrite)
//!
//! [sizes.thumbnail]
//! width = 150
//! height = 150
//! crop = true                # false | true | ["left", "top"]
//!
//! [sizes.medium]
//! width = 300
//! height = 300
//!
//! [processing]
//! max_processes = 4          # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse — override just the values you want:
//!
//! ```toml
//! # Make medium a hard crop and register a theme size
//! [sizes.medium]
//! crop = true
//!
//! [sizes.hero]
//! width = 1600
//! height = 600
//! crop = ["center", "top"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::sizing::{RegisteredSizes, SizeDefinition};
use crate::url::Urls;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "tachyon.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `tachyon.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TachyonConfig {
    /// Base URL of the image CDN, e.g. `https://images.example.com/uploads`.
    pub cdn_url: String,
    /// Public base URL of the WordPress uploads directory.
    pub upload_url: String,
    /// Registered image sizes by name.
    pub sizes: BTreeMap<String, SizeDefinition>,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for TachyonConfig {
    fn default() -> Self {
        Self {
            cdn_url: String::new(),
            upload_url: String::new(),
            sizes: RegisteredSizes::wordpress_defaults()
                .iter()
                .map(|(name, def)| (name.to_string(), *def))
                .collect(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl TachyonConfig {
    /// Validate config values are within acceptable ranges.
    ///
    /// Empty URLs are allowed here so that commands which never build URLs
    /// (`sizes`, `scan`) work without a config file; [`TachyonConfig::urls`]
    /// rejects them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [("cdn_url", &self.cdn_url), ("upload_url", &self.upload_url)] {
            if !value.is_empty() && !is_http_url(value) {
                return Err(ConfigError::Validation(format!(
                    "{key} must start with http:// or https:// (got {value:?})"
                )));
            }
        }
        for (name, def) in &self.sizes {
            if name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "size names must not be empty".into(),
                ));
            }
            if def.width == 0 && def.height == 0 {
                return Err(ConfigError::Validation(format!(
                    "sizes.{name} needs a non-zero width or height"
                )));
            }
        }
        Ok(())
    }

    /// The registered size table.
    pub fn size_table(&self) -> RegisteredSizes {
        RegisteredSizes::from(self.sizes.clone())
    }

    /// Upload and CDN bases. Both must be set.
    pub fn urls(&self) -> Result<Urls, ConfigError> {
        for (key, value) in [("cdn_url", &self.cdn_url), ("upload_url", &self.upload_url)] {
            if value.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{key} is not set (add it to {CONFIG_FILE})"
                )));
            }
        }
        Ok(Urls::new(&self.upload_url, &self.cdn_url))
    }
}

fn is_http_url(value: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        value
            .strip_prefix(scheme)
            .is_some_and(|rest| !rest.is_empty())
    })
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel rewrite workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
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
        .max_processes
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
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(TachyonConfig::default()).expect("default config must serialize")
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
) -> Result<TachyonConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: TachyonConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the stock defaults.
pub fn load_config(path: &Path) -> Result<TachyonConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `tachyon.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Tachyon Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# Base URL of the image CDN. Upload paths are appended verbatim:
#   <upload_url>/2020/01/photo.jpg -> <cdn_url>/2020/01/photo.jpg?fit=300,169
# Required by `url` and `rewrite`.
cdn_url = ""

# Public base URL of the WordPress uploads directory (wp-content/uploads).
# Only images under this URL are rewritten.
upload_url = ""

# ---------------------------------------------------------------------------
# Image sizes
# ---------------------------------------------------------------------------
# Each [sizes.NAME] table registers a size that markup can request through a
# `size-NAME` class. A width or height of 0 leaves that axis unconstrained.
#
# crop = false            fit inside the box, keep the aspect ratio
# crop = true             fill the box exactly, cropping from the centre
# crop = ["left", "top"]  fill the box, cropping towards the anchor
#                         (left|center|right, top|center|bottom)
#
# The WordPress built-in sizes below are always registered; tables here
# override them key by key.

[sizes.thumbnail]
width = 150
height = 150
crop = true

[sizes.medium]
width = 300
height = 300
crop = false

[sizes.medium_large]
width = 768
height = 0
crop = false

[sizes.large]
width = 1024
height = 1024
crop = false

[sizes.1536x1536]
width = 1536
height = 1536
crop = false

[sizes.2048x2048]
width = 2048
height = 2048
crop = false

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel rewrite workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
