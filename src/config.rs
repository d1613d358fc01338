//! Batch configuration.
//!
//! Handles loading, validating, and merging `imgbatch.toml`. Stock defaults
//! are the base layer; a user file only needs the keys it wants to change.
//! Command-line flags override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [processing]
//! max_workers = 4           # Tasks in flight at once (>= 1)
//!
//! [selection]
//! presets = ["product-zoom", "product-catalog", "product-thumbnail", "hero-banner"]
//! formats = ["webp"]        # Any of: webp, jpg, png, pdf
//!
//! [output]
//! directory = "optimized-images"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::catalog::{OutputFormat, find_preset, preset_ids};
use crate::scheduler::DEFAULT_WORKERS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the working directory when no path is given.
pub const CONFIG_FILE: &str = "imgbatch.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `imgbatch.toml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Worker pool settings.
    pub processing: ProcessingConfig,
    /// Default preset and format selection.
    pub selection: SelectionConfig,
    /// Where the archive is written.
    pub output: OutputConfig,
}

impl BatchConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.max_workers == 0 {
            return Err(ConfigError::Validation(
                "processing.max_workers must be at least 1".into(),
            ));
        }
        if self.selection.presets.is_empty() {
            return Err(ConfigError::Validation(
                "selection.presets must not be empty".into(),
            ));
        }
        if let Some(unknown) = self
            .selection
            .presets
            .iter()
            .find(|id| find_preset(id).is_none())
        {
            return Err(ConfigError::Validation(format!(
                "selection.presets: unknown preset '{unknown}' (known: {})",
                preset_ids().join(", ")
            )));
        }
        if self.selection.formats.is_empty() {
            return Err(ConfigError::Validation(
                "selection.formats must not be empty".into(),
            ));
        }
        if self.output.directory.trim().is_empty() {
            return Err(ConfigError::Validation(
                "output.directory must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of tasks decoding or encoding at once.
    pub max_workers: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_WORKERS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionConfig {
    /// Preset ids; expanded in catalog order regardless of the order here.
    pub presets: Vec<String>,
    pub formats: Vec<OutputFormat>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            presets: preset_ids().into_iter().map(String::from).collect(),
            formats: vec![OutputFormat::Webp],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "optimized-images".to_string(),
        }
    }
}

/// Resolve the worker count: a command-line value wins over the config.
///
/// Never less than one.
pub fn effective_workers(config: &ProcessingConfig, cli: Option<usize>) -> usize {
    cli.unwrap_or(config.max_workers).max(1)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(BatchConfig::default())?)
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

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<BatchConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BatchConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load an explicitly named config file. A missing file is an error.
pub fn load_config_file(path: &Path) -> Result<BatchConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Load `imgbatch.toml` from `dir`, falling back to the stock defaults when
/// the file does not exist.
pub fn load_config(dir: &Path) -> Result<BatchConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        return resolve_config(None);
    }
    load_config_file(&path)
}

/// Returns a fully-commented stock `imgbatch.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgbatch Configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Command-line flags (--preset, --format, --jobs, --output) override
# the values in this file. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum number of images being decoded, resized, or encoded at once.
max_workers = 4

# ---------------------------------------------------------------------------
# Default selection
# ---------------------------------------------------------------------------
[selection]
# Preset ids to render. Run `imgbatch presets` for the full list.
presets = ["product-zoom", "product-catalog", "product-thumbnail", "hero-banner"]

# Output formats: webp and jpg (lossy, at the preset quality), png, pdf (single page).
formats = ["webp"]

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Archive root. One folder per preset is created inside it.
directory = "optimized-images"
"##
}
