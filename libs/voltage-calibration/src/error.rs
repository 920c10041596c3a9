//! Error types for voltage-calibration
//!
//! The numeric core never fails; these errors only surface from
//! configuration loading and saving.

use thiserror::Error;

/// Calibration configuration errors
#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unsupported config file format: {0}")]
    UnsupportedFormat(String),
}

impl CalibrationError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<figment::Error> for CalibrationError {
    fn from(err: figment::Error) -> Self {
        CalibrationError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CalibrationError {
    fn from(err: serde_json::Error) -> Self {
        CalibrationError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for CalibrationError {
    fn from(err: serde_yaml::Error) -> Self {
        CalibrationError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for CalibrationError {
    fn from(err: toml::ser::Error) -> Self {
        CalibrationError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CalibrationError>;
