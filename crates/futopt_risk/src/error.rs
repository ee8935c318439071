//! Risk layer error types.

use futopt_core::market_data::MarketDataError;
use futopt_core::types::PricingError;
use futopt_models::ModelError;
use thiserror::Error;

/// Errors raised while computing or comparing sensitivities.
///
/// # Examples
/// ```
/// use futopt_risk::SensitivityError;
///
/// let err = SensitivityError::MissingJacobian { curve: "USD-DSC".into() };
/// assert_eq!(format!("{}", err), "No calibration Jacobian for curve USD-DSC");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensitivityError {
    /// Pricing or bumping failed.
    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    /// Curve lookup failed.
    #[error("Market data error: {0}")]
    MarketData(#[from] MarketDataError),

    /// Bumping a model parameter failed.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Market quote sensitivity requested for a curve without a Jacobian.
    #[error("No calibration Jacobian for curve {curve}")]
    MissingJacobian {
        /// Curve name
        curve: String,
    },

    /// Sensitivity vector length differs from the curve node count.
    #[error("Curve {curve}: expected {expected} values, found {found}")]
    DimensionMismatch {
        /// Curve name
        curve: String,
        /// Curve node count
        expected: usize,
        /// Sensitivity length
        found: usize,
    },

    /// Tolerance with a negative or non-finite component.
    #[error("Invalid tolerance: absolute {absolute}, relative {relative}")]
    InvalidTolerance {
        /// Absolute tolerance
        absolute: f64,
        /// Relative tolerance
        relative: f64,
    },
}
