//! Error types for structured error handling.
//!
//! This module provides:
//! - `PricingError`: Errors from pricing operations
//! - `InterpolationError`: Errors from interpolation operations
//! - `SolverError`: Errors from root-finding solvers
//!
//! Curve lookup failures live in [`crate::market_data::MarketDataError`] and
//! convert into `PricingError` with `?`.

use thiserror::Error;

/// Categorised pricing errors.
///
/// # Variants
/// - `InvalidInput`: Invalid market data or parameters (fail fast)
/// - `NumericalInstability`: Computation failed to converge
/// - `ModelFailure`: Model assumptions violated
/// - `UnsupportedInstrument`: Instrument type not supported by method
/// - `MarketData`: Missing or malformed curve data
///
/// # Examples
/// ```
/// use futopt_core::types::PricingError;
///
/// let err = PricingError::InvalidInput("strike must be positive".to_string());
/// assert_eq!(format!("{}", err), "Invalid input: strike must be positive");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    /// Invalid input data or parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Numerical instability during computation
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),

    /// Model failed to produce valid result
    #[error("Model failure: {0}")]
    ModelFailure(String),

    /// Instrument type not supported
    #[error("Unsupported instrument: {0}")]
    UnsupportedInstrument(String),

    /// Market data lookup failed
    #[error("Market data error: {0}")]
    MarketData(#[from] crate::market_data::MarketDataError),
}

impl From<SolverError> for PricingError {
    fn from(err: SolverError) -> Self {
        PricingError::NumericalInstability(err.to_string())
    }
}

impl From<InterpolationError> for PricingError {
    fn from(err: InterpolationError) -> Self {
        PricingError::InvalidInput(err.to_string())
    }
}

/// Interpolation-related errors.
///
/// # Examples
/// ```
/// use futopt_core::types::InterpolationError;
///
/// let err = InterpolationError::OutOfBounds { x: 5.0, min: 0.0, max: 3.0 };
/// assert!(format!("{}", err).contains("outside valid domain"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InterpolationError {
    /// Query point outside valid interpolation domain.
    #[error("Query point {x} outside valid domain [{min}, {max}]")]
    OutOfBounds {
        /// The query point that was out of bounds
        x: f64,
        /// Minimum valid value
        min: f64,
        /// Maximum valid value
        max: f64,
    },

    /// Insufficient data points for interpolation.
    #[error("Insufficient data points: got {got}, need at least {need}")]
    InsufficientData {
        /// Number of points provided
        got: usize,
        /// Minimum number of points required
        need: usize,
    },

    /// Abscissae are not strictly increasing after sorting.
    #[error("Duplicate abscissa {x}")]
    DuplicateAbscissa {
        /// The repeated coordinate
        x: f64,
    },

    /// General invalid input error.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Root-finding solver errors.
///
/// # Examples
/// ```
/// use futopt_core::types::SolverError;
///
/// let err = SolverError::NoBracket { a: 0.0, b: 1.0 };
/// assert!(format!("{}", err).contains("bracket"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Solver did not converge within the iteration budget.
    #[error("Maximum iterations ({iterations}) exceeded without convergence")]
    MaxIterationsExceeded {
        /// Number of iterations performed
        iterations: usize,
    },

    /// Function values at bracket endpoints have the same sign.
    #[error("No sign change in bracket [{a}, {b}]")]
    NoBracket {
        /// Left endpoint
        a: f64,
        /// Right endpoint
        b: f64,
    },

    /// Function evaluation produced NaN or infinity.
    #[error("Non-finite function value at x = {x}")]
    NonFinite {
        /// Evaluation point
        x: f64,
    },
}
