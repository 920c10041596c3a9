//! Calibration configuration
//!
//! Options are read once at start from a YAML, JSON or TOML file (format
//! picked by extension) with `CALIBRATION_` environment overrides layered on
//! top. The plugin writes them back after sorting each mapping table so the
//! stored configuration stays sorted.

use crate::breakpoint::{sort_breakpoints, Breakpoint};
use crate::error::{CalibrationError, Result};
use crate::serde_helpers::{deserialize_lenient_decimals, deserialize_lenient_f64};
use figment::{
    providers::{Env, Format, Json, Toml, Yaml},
    Figment,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix for environment overrides; `__` separates nested keys
pub const ENV_PREFIX: &str = "CALIBRATION_";

/// Top-level plugin options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginOptions {
    #[serde(default)]
    pub calibrations: Vec<CalibrationConfig>,
}

/// One configured calibration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationConfig {
    /// Signal path the calibration targets (e.g. `navigation.headingMagnetic`)
    pub path: String,

    /// Restrict matching to one data source; absent matches any source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,

    /// Round results to this many decimal digits
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_decimals",
        skip_serializing_if = "Option::is_none"
    )]
    pub decimals: Option<u32>,

    /// Modulus for cyclic outputs (e.g. 360 for degrees)
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub period: Option<f64>,

    /// Breakpoint table; at least two entries activate the calibration
    #[serde(default)]
    pub mappings: Vec<Breakpoint>,
}

impl CalibrationConfig {
    pub fn new(path: impl Into<String>, mappings: Vec<Breakpoint>) -> Self {
        Self {
            path: path.into(),
            source_ref: None,
            decimals: None,
            period: None,
            mappings,
        }
    }

    pub fn with_source_ref(mut self, source_ref: impl Into<String>) -> Self {
        self.source_ref = Some(source_ref.into());
        self
    }

    pub fn with_period(mut self, period: f64) -> Self {
        self.period = Some(period);
        self
    }

    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = Some(decimals);
        self
    }

    /// Sort the mapping table ascending by input, in place
    pub fn sort_mappings(&mut self) {
        sort_breakpoints(&mut self.mappings);
    }

    /// Whether the table has enough breakpoints to be installed
    pub fn is_active(&self) -> bool {
        self.mappings.len() > 1
    }
}

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// Detect format from the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| CalibrationError::config("Config file must have an extension"))?;

        match extension.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            "toml" => Ok(Self::Toml),
            other => Err(CalibrationError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Load options from a file, with environment overrides
pub fn load_options(path: impl AsRef<Path>) -> Result<PluginOptions> {
    let path = path.as_ref();
    let figment = match ConfigFormat::from_path(path)? {
        ConfigFormat::Yaml => Figment::new().merge(Yaml::file(path)),
        ConfigFormat::Json => Figment::new().merge(Json::file(path)),
        ConfigFormat::Toml => Figment::new().merge(Toml::file(path)),
    };

    figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| {
            CalibrationError::config(format!(
                "Failed to load calibration options from {}: {}",
                path.display(),
                e
            ))
        })
}

/// Save options to a file in the format given by its extension
pub fn save_options(options: &PluginOptions, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let content = match ConfigFormat::from_path(path)? {
        ConfigFormat::Yaml => serde_yaml::to_string(options)?,
        ConfigFormat::Json => serde_json::to_string_pretty(options)?,
        ConfigFormat::Toml => toml::to_string_pretty(options)?,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    std::fs::write(path, content)?;
    Ok(())
}

/// Persistence backend for plugin options
///
/// Saves are best-effort: the plugin logs a failed save and keeps running.
pub trait OptionsStore: Send + Sync {
    fn save(&self, options: &PluginOptions) -> Result<()>;
}

/// Writes options back to the file they were loaded from
#[derive(Debug, Clone)]
pub struct FileOptionsStore {
    path: PathBuf,
}

impl FileOptionsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OptionsStore for FileOptionsStore {
    fn save(&self, options: &PluginOptions) -> Result<()> {
        save_options(options, &self.path)
    }
}

/// In-memory options store for testing and embedded use
#[derive(Debug, Default)]
pub struct MemoryOptionsStore {
    saved: Mutex<Option<PluginOptions>>,
}

impl MemoryOptionsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently saved options
    pub fn saved(&self) -> Option<PluginOptions> {
        self.saved.lock().clone()
    }
}

impl OptionsStore for MemoryOptionsStore {
    fn save(&self, options: &PluginOptions) -> Result<()> {
        *self.saved.lock() = Some(options.clone());
        Ok(())
    }
}

/// Null options store - discards saves
pub struct NullOptionsStore;

impl OptionsStore for NullOptionsStore {
    fn save(&self, _options: &PluginOptions) -> Result<()> {
        Ok(())
    }
}
