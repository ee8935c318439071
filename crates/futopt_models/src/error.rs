//! Error types for volatility and short-rate models.

use futopt_core::types::{InterpolationError, PricingError};
use thiserror::Error;

/// Model construction and evaluation errors.
///
/// # Examples
/// ```
/// use futopt_models::ModelError;
///
/// let err = ModelError::ModelMismatch { expected: "SABR", found: "SSVI" };
/// assert_eq!(format!("{}", err), "Model mismatch: expected SABR, found SSVI");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Parameter outside its admissible range.
    #[error("Invalid parameter {name}: {value} ({constraint})")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: f64,
        /// Admissible range
        constraint: &'static str,
    },

    /// Query outside the model's domain.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A model-specific accessor was called on another model.
    #[error("Model mismatch: expected {expected}, found {found}")]
    ModelMismatch {
        /// Model the accessor belongs to
        expected: &'static str,
        /// Model actually held
        found: &'static str,
    },

    /// The model does not have the requested parameter.
    #[error("Unknown parameter {parameter} for model {model}")]
    UnknownParameter {
        /// Requested parameter
        parameter: String,
        /// Model name
        model: &'static str,
    },

    /// Hull-White convexity requested for a cash flow before delivery.
    #[error("Cash flow at {cash_flow_time} precedes delivery at {delivery_time}")]
    CashFlowBeforeDelivery {
        /// Cash-flow time
        cash_flow_time: f64,
        /// Delivery time
        delivery_time: f64,
    },

    /// Grid construction error.
    #[error("Interpolation error: {0}")]
    Interpolation(#[from] InterpolationError),
}

impl From<ModelError> for PricingError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::ModelMismatch { .. } | ModelError::UnknownParameter { .. } => {
                PricingError::ModelFailure(err.to_string())
            }
            other => PricingError::InvalidInput(other.to_string()),
        }
    }
}
