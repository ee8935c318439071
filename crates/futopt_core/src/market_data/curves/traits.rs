//! Yield curve trait.

use crate::market_data::MarketDataError;

/// A continuously compounded zero-rate curve.
///
/// Implementors provide the zero rate and its sensitivity to the curve
/// nodes; discount factors and forward rates follow from those.
///
/// ```text
/// D(t) = exp(-r(t) * t)
/// f(t1, t2) = (r(t2) * t2 - r(t1) * t1) / (t2 - t1)
/// ```
pub trait YieldCurve {
    /// Zero rate `r(t)` for `t >= 0`.
    fn zero_rate(&self, t: f64) -> Result<f64, MarketDataError>;

    /// Derivative of `r(t)` with respect to each curve node.
    fn zero_rate_node_sensitivity(&self, t: f64) -> Result<Vec<f64>, MarketDataError>;

    /// Times of the curve nodes.
    fn node_times(&self) -> &[f64];

    /// Number of curve nodes (parameters).
    fn node_count(&self) -> usize {
        self.node_times().len()
    }

    /// Discount factor `D(t) = exp(-r(t) t)`.
    fn discount_factor(&self, t: f64) -> Result<f64, MarketDataError> {
        validate_time(t)?;
        Ok((-self.zero_rate(t)? * t).exp())
    }

    /// Continuously compounded forward rate between `t1` and `t2`.
    fn forward_rate(&self, t1: f64, t2: f64) -> Result<f64, MarketDataError> {
        validate_time(t1)?;
        if t2 <= t1 {
            return Err(MarketDataError::InvalidPeriod {
                start: t1,
                end: t2,
                accrual: t2 - t1,
            });
        }
        Ok((self.zero_rate(t2)? * t2 - self.zero_rate(t1)? * t1) / (t2 - t1))
    }
}

pub(crate) fn validate_time(t: f64) -> Result<(), MarketDataError> {
    if !t.is_finite() || t < 0.0 {
        return Err(MarketDataError::InvalidMaturity { t });
    }
    Ok(())
}
