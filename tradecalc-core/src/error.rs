//! Error types shared by the calculators.

use std::path::PathBuf;

use thiserror::Error;

/// Why a calculator refused to produce numbers for the current inputs.
///
/// Engines return this instead of letting NaN or infinity leak into their
/// outputs. The presentation layer shows a neutral "check your numbers" state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SetupError {
    #[error("entry and stop-loss are equal, risk unit is zero")]
    ZeroRiskUnit,

    #[error("stop-loss and take-profit must sit on opposite sides of entry")]
    StopsOnSameSide,

    #[error("{field} must be greater than zero (got {value})")]
    NonPositive { field: &'static str, value: f64 },

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("{field} is not a finite number")]
    NonFinite { field: &'static str },

    #[error("{field} is too large to compute exactly (got {value})")]
    TooLarge { field: &'static str, value: f64 },

    #[error("stop-loss level index {index} is outside the menu of {len} levels")]
    StopLevelOutOfRange { index: usize, len: usize },
}

impl SetupError {
    /// Reject NaN and infinities.
    pub fn finite(field: &'static str, value: f64) -> Result<f64, SetupError> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(SetupError::NonFinite { field })
        }
    }

    /// Require a finite, strictly positive value.
    pub fn positive(field: &'static str, value: f64) -> Result<f64, SetupError> {
        let value = Self::finite(field, value)?;
        if value > 0.0 {
            Ok(value)
        } else {
            Err(SetupError::NonPositive { field, value })
        }
    }

    /// Require a finite value that is zero or above.
    pub fn non_negative(field: &'static str, value: f64) -> Result<f64, SetupError> {
        let value = Self::finite(field, value)?;
        if value >= 0.0 {
            Ok(value)
        } else {
            Err(SetupError::Negative { field, value })
        }
    }
}

/// A textual `key=value` edit that could not be applied to a form.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("unknown parameter '{key}' (expected one of: {known})")]
    UnknownKey { key: String, known: String },

    #[error("'{raw}' is not a number for '{key}'")]
    InvalidNumber { key: String, raw: String },

    #[error("'{raw}' is not true or false for '{key}'")]
    InvalidToggle { key: String, raw: String },

    #[error("'{raw}' is not a menu entry for '{key}' ({len} entries)")]
    InvalidChoice { key: String, raw: String, len: usize },
}

/// Errors from loading `tradecalc.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
