//! Market data error types.

use crate::types::{Currency, InterpolationError, IssuerId, RateIndex};
use thiserror::Error;

/// Errors raised while building or querying curves.
///
/// # Examples
/// ```
/// use futopt_core::market_data::MarketDataError;
/// use futopt_core::types::Currency;
///
/// let err = MarketDataError::MissingDiscountCurve { currency: Currency::EUR };
/// assert_eq!(format!("{}", err), "No discount curve for currency EUR");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// Negative or non-finite time.
    #[error("Invalid maturity: {t}")]
    InvalidMaturity {
        /// The offending time
        t: f64,
    },

    /// Forward period is empty or reversed.
    #[error("Invalid forward period [{start}, {end}] with accrual {accrual}")]
    InvalidPeriod {
        /// Period start
        start: f64,
        /// Period end
        end: f64,
        /// Accrual factor
        accrual: f64,
    },

    /// No curve registered under the name.
    #[error("Curve not found: {name}")]
    CurveNotFound {
        /// Requested curve name
        name: String,
    },

    /// No discount curve mapped to the currency.
    #[error("No discount curve for currency {currency}")]
    MissingDiscountCurve {
        /// Requested currency
        currency: Currency,
    },

    /// No forward curve mapped to the index.
    #[error("No forward curve for index {index}")]
    MissingForwardCurve {
        /// Requested index
        index: RateIndex,
    },

    /// No curve mapped to the issuer.
    #[error("No issuer curve for {issuer}")]
    MissingIssuerCurve {
        /// Requested issuer
        issuer: IssuerId,
    },

    /// Node index outside the curve.
    #[error("Node {index} out of range for curve {curve} with {count} nodes")]
    InvalidNode {
        /// Curve name
        curve: String,
        /// Requested node
        index: usize,
        /// Number of nodes
        count: usize,
    },

    /// Curve parameters are not finite or inconsistent.
    #[error("Invalid curve data: {0}")]
    InvalidCurve(String),

    /// Jacobian dimensions do not match the curve.
    #[error("Invalid Jacobian for curve {curve}: {reason}")]
    InvalidJacobian {
        /// Curve name
        curve: String,
        /// Description of the mismatch
        reason: String,
    },

    /// Interpolation error.
    #[error("Interpolation error: {0}")]
    Interpolation(#[from] InterpolationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = MarketDataError::MissingForwardCurve {
            index: RateIndex::new("EUR-EURIBOR-3M", Currency::EUR),
        };
        assert_eq!(format!("{}", err), "No forward curve for index EUR-EURIBOR-3M");

        let err = MarketDataError::InvalidNode {
            curve: "USD-DSC".to_string(),
            index: 7,
            count: 3,
        };
        assert!(format!("{}", err).contains("USD-DSC"));
    }

    #[test]
    fn test_from_interpolation_error() {
        let err: MarketDataError = InterpolationError::InsufficientData { got: 0, need: 1 }.into();
        assert!(matches!(err, MarketDataError::Interpolation(_)));
    }
}
