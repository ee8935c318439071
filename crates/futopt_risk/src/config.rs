//! Sensitivity run configuration.
//!
//! Loaded from TOML; every field has a default so an empty document is a
//! valid configuration.
//!
//! ```toml
//! shift = 1e-6
//! scheme = "central"
//! absolute_tolerance = 1e-2
//! relative_tolerance = 1e-3
//! log_level = "debug"
//!
//! [parallel]
//! batch_size = 16
//! parallel_threshold = 8
//! ```

use crate::comparison::SensitivityTolerance;
use crate::parallel::ParallelConfig;
use futopt_core::math::{FiniteDifferenceDifferentiator, FiniteDifferenceType};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Shift not positive and finite
    #[error("Invalid finite-difference shift: {0}. Must be positive and finite")]
    InvalidShift(f64),

    /// Negative or non-finite tolerance
    #[error("Invalid tolerance: {name} = {value}. Must be non-negative")]
    InvalidTolerance {
        /// Field name
        name: &'static str,
        /// Offending value
        value: f64,
    },

    /// Zero batch size
    #[error("Invalid batch size: {0}. Must be at least 1")]
    InvalidBatchSize(usize),

    /// Unknown log level name
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// Malformed TOML or unknown enum value
    #[error("Configuration parse error: {0}")]
    ParseError(String),

    /// Unreadable file
    #[error("Configuration file error: {0}")]
    FileError(String),
}

/// Log levels for sensitivity runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Bucketing detail
    Trace,
    /// Sweep sizes
    Debug,
    /// Default
    #[default]
    Info,
    /// Degenerate numerical branches
    Warn,
    /// Errors only
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Finite-difference and comparison settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SensitivityConfig {
    /// Bump size
    pub shift: f64,
    /// Difference scheme
    pub scheme: FiniteDifferenceType,
    /// Absolute agreement band
    pub absolute_tolerance: f64,
    /// Relative agreement band
    pub relative_tolerance: f64,
    /// Bump-and-revalue parallelism
    pub parallel: ParallelConfig,
    /// Default log level when `RUST_LOG` is unset
    pub log_level: LogLevel,
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            shift: 1e-6,
            scheme: FiniteDifferenceType::Central,
            absolute_tolerance: 1e-2,
            relative_tolerance: 1e-3,
            parallel: ParallelConfig::default(),
            log_level: LogLevel::Info,
        }
    }
}

impl SensitivityConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Checks shift, tolerances and batch size.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.shift.is_finite() && self.shift > 0.0) {
            return Err(ConfigError::InvalidShift(self.shift));
        }
        for (name, value) in [
            ("absolute_tolerance", self.absolute_tolerance),
            ("relative_tolerance", self.relative_tolerance),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidTolerance { name, value });
            }
        }
        if self.parallel.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize(0));
        }
        Ok(())
    }

    /// Differentiator with the configured shift and scheme.
    pub fn differentiator(&self) -> Result<FiniteDifferenceDifferentiator, ConfigError> {
        FiniteDifferenceDifferentiator::new(self.shift, self.scheme)
            .map_err(|_| ConfigError::InvalidShift(self.shift))
    }

    /// Comparison band.
    pub fn tolerance(&self) -> SensitivityTolerance {
        SensitivityTolerance {
            absolute: self.absolute_tolerance,
            relative: self.relative_tolerance,
        }
    }

    /// Installs a global `fmt` subscriber filtered by `RUST_LOG`, falling
    /// back to the configured level. Returns `false` if one was already set.
    pub fn init_tracing(&self) -> bool {
        let level = self.log_level.as_filter_str();
        tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
            .with(fmt::layer())
            .try_init()
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = SensitivityConfig::from_toml_str("").unwrap();
        assert_eq!(config, SensitivityConfig::default());
    }

    #[test]
    fn test_full_document() {
        let config = SensitivityConfig::from_toml_str(
            r#"
            shift = 1e-5
            scheme = "forward"
            absolute_tolerance = 0.1
            relative_tolerance = 1e-4
            log_level = "debug"

            [parallel]
            batch_size = 4
            parallel_threshold = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.shift, 1e-5);
        assert_eq!(config.scheme, FiniteDifferenceType::Forward);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.parallel, ParallelConfig::new(4, 2));
        assert_eq!(config.tolerance().relative, 1e-4);
        assert_eq!(config.differentiator().unwrap().shift(), 1e-5);
    }

    #[test]
    fn test_partial_parallel_table_keeps_defaults() {
        let config = SensitivityConfig::from_toml_str("[parallel]\nbatch_size = 3").unwrap();
        assert_eq!(config.parallel.batch_size, 3);
        assert_eq!(
            config.parallel.parallel_threshold,
            ParallelConfig::default().parallel_threshold
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            SensitivityConfig::from_toml_str("shift = 0.0"),
            Err(ConfigError::InvalidShift(_))
        ));
        assert!(matches!(
            SensitivityConfig::from_toml_str("relative_tolerance = -1.0"),
            Err(ConfigError::InvalidTolerance { name: "relative_tolerance", .. })
        ));
        assert!(matches!(
            SensitivityConfig::from_toml_str("[parallel]\nbatch_size = 0"),
            Err(ConfigError::InvalidBatchSize(0))
        ));
        assert!(matches!(
            SensitivityConfig::from_toml_str("scheme = \"sideways\""),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_log_level_from_str() {
        assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            SensitivityConfig::from_file("/nonexistent/sensitivity.toml"),
            Err(ConfigError::FileError(_))
        ));
    }
}
