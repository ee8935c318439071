//! Zero-rate curve interpolated between nodes.

use super::traits::{validate_time, YieldCurve};
use crate::market_data::MarketDataError;
use crate::math::interpolators::{Interpolator, LinearInterpolator};

/// Interpolation scheme between curve nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CurveInterpolation {
    /// Linear in the zero rate `r(t)`.
    #[default]
    Linear,
    /// Linear in `r(t) * t`, i.e. log-linear in discount factors.
    LogLinear,
}

/// Compounding convention of the node rates.
///
/// Interpolation always acts on the node rates as quoted; the curve then
/// reports the equivalent continuously compounded zero rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Compounding {
    /// `D(t) = exp(-r t)`
    #[default]
    Continuous,
    /// `D(t) = (1 + r/m)^(-m t)` with `m` periods per year.
    Periodic(u32),
}

/// Curve defined by zero rates at node times.
///
/// Zero rates are extrapolated flat on both sides; `D(0) = 1`. The node
/// rates are the curve parameters for bucketed sensitivities. With
/// [`Compounding::Periodic`] the nodes are periodically compounded rates and
/// [`YieldCurve::zero_rate`] returns `m ln(1 + r/m)`.
///
/// # Example
///
/// ```
/// use futopt_core::market_data::{InterpolatedCurve, YieldCurve};
///
/// let curve = InterpolatedCurve::linear(&[1.0, 2.0], &[0.02, 0.03]).unwrap();
/// assert!((curve.zero_rate(1.5).unwrap() - 0.025).abs() < 1e-15);
/// assert!((curve.zero_rate(10.0).unwrap() - 0.03).abs() < 1e-15);
///
/// let annual = InterpolatedCurve::periodic(&[1.0, 2.0], &[0.02, 0.03], 1).unwrap();
/// assert!((annual.discount_factor(2.0).unwrap() - 1.03_f64.powi(-2)).abs() < 1e-15);
/// ```
#[derive(Debug, Clone)]
pub struct InterpolatedCurve {
    rates: LinearInterpolator<f64>,
    interpolation: CurveInterpolation,
    compounding: Compounding,
}

impl InterpolatedCurve {
    /// Build a curve from node times (`>= 0`) and zero rates.
    pub fn new(
        times: &[f64],
        rates: &[f64],
        interpolation: CurveInterpolation,
    ) -> Result<Self, MarketDataError> {
        if let Some(&t) = times.iter().find(|t| !t.is_finite() || **t < 0.0) {
            return Err(MarketDataError::InvalidMaturity { t });
        }
        if rates.iter().any(|r| !r.is_finite()) {
            return Err(MarketDataError::InvalidCurve(
                "zero rates must be finite".to_string(),
            ));
        }
        Ok(Self {
            rates: LinearInterpolator::with_flat_extrapolation(times, rates)?,
            interpolation,
            compounding: Compounding::Continuous,
        })
    }

    /// Reinterprets the node rates under `compounding`.
    ///
    /// Periodic compounding needs at least one period per year and
    /// `1 + r/m > 0` at every node.
    pub fn with_compounding(self, compounding: Compounding) -> Result<Self, MarketDataError> {
        if let Compounding::Periodic(periods) = compounding {
            if periods == 0 {
                return Err(MarketDataError::InvalidCurve(
                    "compounding frequency must be at least 1".to_string(),
                ));
            }
            let m = f64::from(periods);
            if let Some(&r) = self.rates.ys().iter().find(|r| 1.0 + **r / m <= 0.0) {
                return Err(MarketDataError::InvalidCurve(format!(
                    "rate {} below -{} for {} periods per year",
                    r, m, periods
                )));
            }
        }
        Ok(Self {
            compounding,
            ..self
        })
    }

    /// Linear interpolation on zero rates.
    pub fn linear(times: &[f64], rates: &[f64]) -> Result<Self, MarketDataError> {
        Self::new(times, rates, CurveInterpolation::Linear)
    }

    /// Log-linear interpolation on discount factors.
    pub fn log_linear(times: &[f64], rates: &[f64]) -> Result<Self, MarketDataError> {
        Self::new(times, rates, CurveInterpolation::LogLinear)
    }

    /// Linear interpolation on rates compounded `periods` times a year.
    pub fn periodic(times: &[f64], rates: &[f64], periods: u32) -> Result<Self, MarketDataError> {
        Self::linear(times, rates)?.with_compounding(Compounding::Periodic(periods))
    }

    /// Single-node curve with constant zero rate.
    pub fn flat(rate: f64) -> Result<Self, MarketDataError> {
        Self::new(&[1.0], &[rate], CurveInterpolation::Linear)
    }

    /// Node rates, in the curve's compounding.
    pub fn zero_rates(&self) -> &[f64] {
        self.rates.ys()
    }

    /// Interpolation scheme.
    pub fn interpolation(&self) -> CurveInterpolation {
        self.interpolation
    }

    /// Compounding of the node rates.
    pub fn compounding(&self) -> Compounding {
        self.compounding
    }

    /// A new curve with node `index` shifted by `shift` (in zero rate).
    pub fn with_shifted_node(&self, index: usize, shift: f64) -> Result<Self, MarketDataError> {
        Ok(Self {
            rates: self.rates.with_shifted_node(index, shift)?,
            interpolation: self.interpolation,
            compounding: self.compounding,
        })
    }

    /// A new curve with every node shifted by `shift`.
    pub fn with_parallel_shift(&self, shift: f64) -> Self {
        Self {
            rates: self.rates.with_parallel_shift(shift),
            interpolation: self.interpolation,
            compounding: self.compounding,
        }
    }

    /// Whether `t` lies strictly inside the node range where log-linear
    /// interpolation applies.
    fn log_linear_applies(&self, t: f64) -> bool {
        let (t_min, t_max) = self.rates.domain();
        self.interpolation == CurveInterpolation::LogLinear && t > 0.0 && t >= t_min && t <= t_max
    }

    /// Interpolated node rate at `t`, before conversion to continuous
    /// compounding.
    fn quoted_rate(&self, t: f64) -> Result<f64, MarketDataError> {
        if self.log_linear_applies(t) {
            let weights = self.rates.node_sensitivity(t)?;
            let rt: f64 = weights
                .iter()
                .zip(self.rates.xs().iter().zip(self.rates.ys()))
                .map(|(w, (ti, ri))| w * ri * ti)
                .sum();
            return Ok(rt / t);
        }
        Ok(self.rates.interpolate(t)?)
    }

    /// Periods per year and `1 + r/m` for a periodic curve.
    fn periodic_base(&self, quoted: f64) -> Result<Option<(f64, f64)>, MarketDataError> {
        match self.compounding {
            Compounding::Continuous => Ok(None),
            Compounding::Periodic(periods) => {
                let m = f64::from(periods);
                let base = 1.0 + quoted / m;
                if base <= 0.0 {
                    return Err(MarketDataError::InvalidCurve(format!(
                        "periodic rate {} gives a non-positive growth factor",
                        quoted
                    )));
                }
                Ok(Some((m, base)))
            }
        }
    }
}

impl YieldCurve for InterpolatedCurve {
    fn zero_rate(&self, t: f64) -> Result<f64, MarketDataError> {
        validate_time(t)?;
        let quoted = self.quoted_rate(t)?;
        Ok(match self.periodic_base(quoted)? {
            Some((m, base)) => m * base.ln(),
            None => quoted,
        })
    }

    fn zero_rate_node_sensitivity(&self, t: f64) -> Result<Vec<f64>, MarketDataError> {
        validate_time(t)?;
        let mut weights = self.rates.node_sensitivity(t)?;
        if self.log_linear_applies(t) {
            weights
                .iter_mut()
                .zip(self.rates.xs())
                .for_each(|(w, ti)| *w *= ti / t);
        }
        // d(m ln(1 + q/m))/dq = 1 / (1 + q/m)
        if let Some((_, base)) = self.periodic_base(self.quoted_rate(t)?)? {
            weights.iter_mut().for_each(|w| *w /= base);
        }
        Ok(weights)
    }

    fn node_times(&self) -> &[f64] {
        self.rates.xs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample(interpolation: CurveInterpolation) -> InterpolatedCurve {
        InterpolatedCurve::new(
            &[0.25, 1.0, 2.0, 5.0, 10.0],
            &[0.010, 0.012, 0.015, 0.020, 0.025],
            interpolation,
        )
        .unwrap()
    }

    fn all_samples() -> Vec<InterpolatedCurve> {
        let mut curves = Vec::new();
        for interpolation in [CurveInterpolation::Linear, CurveInterpolation::LogLinear] {
            for compounding in [Compounding::Continuous, Compounding::Periodic(1), Compounding::Periodic(4)] {
                curves.push(sample(interpolation).with_compounding(compounding).unwrap());
            }
        }
        curves
    }

    // ========================================
    // Construction Tests
    // ========================================

    #[test]
    fn test_rejects_negative_times() {
        let result = InterpolatedCurve::linear(&[-1.0, 1.0], &[0.01, 0.02]);
        assert!(matches!(result, Err(MarketDataError::InvalidMaturity { .. })));
    }

    #[test]
    fn test_rejects_non_finite_rates() {
        assert!(InterpolatedCurve::linear(&[1.0, 2.0], &[0.01, f64::NAN]).is_err());
    }

    #[test]
    fn test_flat_curve() {
        let curve = InterpolatedCurve::flat(0.02).unwrap();
        assert_relative_eq!(curve.discount_factor(3.0).unwrap(), (-0.06_f64).exp());
        assert_eq!(curve.node_count(), 1);
        assert_eq!(curve.zero_rate_node_sensitivity(7.0).unwrap(), vec![1.0]);
    }

    // ========================================
    // Interpolation Tests
    // ========================================

    #[test]
    fn test_linear_zero_rate() {
        let curve = sample(CurveInterpolation::Linear);
        assert_relative_eq!(curve.zero_rate(1.5).unwrap(), 0.0135, epsilon = 1e-15);
        assert_relative_eq!(curve.zero_rate(0.0).unwrap(), 0.010, epsilon = 1e-15);
        assert_relative_eq!(curve.zero_rate(30.0).unwrap(), 0.025, epsilon = 1e-15);
        assert_eq!(curve.discount_factor(0.0).unwrap(), 1.0);
    }

    #[test]
    fn test_log_linear_matches_nodes_and_interpolates_rt() {
        let curve = sample(CurveInterpolation::LogLinear);
        assert_relative_eq!(curve.zero_rate(2.0).unwrap(), 0.015, epsilon = 1e-15);
        let rt = 0.5 * (0.012 * 1.0) + 0.5 * (0.015 * 2.0);
        assert_relative_eq!(curve.zero_rate(1.5).unwrap(), rt / 1.5, epsilon = 1e-15);
        assert_relative_eq!(curve.zero_rate(0.1).unwrap(), 0.010, epsilon = 1e-15);
    }

    // ========================================
    // Sensitivity Tests
    // ========================================

    #[test]
    fn test_node_sensitivity_matches_bump() {
        for curve in all_samples() {
            for &t in &[0.1, 0.6, 1.0, 3.7, 12.0] {
                let analytic = curve.zero_rate_node_sensitivity(t).unwrap();
                for (j, a) in analytic.iter().enumerate() {
                    let up = curve.with_shifted_node(j, 1e-6).unwrap().zero_rate(t).unwrap();
                    let down = curve.with_shifted_node(j, -1e-6).unwrap().zero_rate(t).unwrap();
                    let fd = (up - down) / 2e-6;
                    assert_relative_eq!(fd, *a, epsilon = 1e-8);
                }
            }
        }
    }

    // ========================================
    // Compounding Tests
    // ========================================

    #[test]
    fn test_periodic_discount_factor() {
        let curve = InterpolatedCurve::periodic(&[1.0, 2.0, 5.0], &[0.02, 0.025, 0.03], 1).unwrap();
        assert_relative_eq!(curve.discount_factor(2.0).unwrap(), 1.025_f64.powi(-2), epsilon = 1e-15);
        // halfway between 2y and 5y nodes the quoted rate is 0.0275
        assert_relative_eq!(
            curve.discount_factor(3.5).unwrap(),
            1.0275_f64.powf(-3.5),
            epsilon = 1e-15
        );
        let quarterly = sample(CurveInterpolation::Linear)
            .with_compounding(Compounding::Periodic(4))
            .unwrap();
        assert_relative_eq!(
            quarterly.discount_factor(5.0).unwrap(),
            (1.0 + 0.02 / 4.0_f64).powf(-20.0),
            epsilon = 1e-15
        );
        assert_eq!(quarterly.compounding(), Compounding::Periodic(4));
    }

    #[test]
    fn test_periodic_below_continuous_for_positive_rates() {
        let continuous = sample(CurveInterpolation::Linear);
        let annual = continuous.clone().with_compounding(Compounding::Periodic(1)).unwrap();
        assert!(annual.zero_rate(3.0).unwrap() < continuous.zero_rate(3.0).unwrap());
        assert!(annual.discount_factor(3.0).unwrap() > continuous.discount_factor(3.0).unwrap());
    }

    #[test]
    fn test_invalid_compounding_rejected() {
        assert!(InterpolatedCurve::periodic(&[1.0], &[0.01], 0).is_err());
        assert!(InterpolatedCurve::periodic(&[1.0, 2.0], &[0.01, -1.5], 1).is_err());
        let curve = InterpolatedCurve::periodic(&[1.0, 2.0], &[0.01, -0.9], 1).unwrap();
        let bumped = curve.with_shifted_node(1, -0.2).unwrap();
        assert!(bumped.zero_rate(2.0).is_err());
    }

    #[test]
    fn test_bumps_keep_compounding() {
        let curve = InterpolatedCurve::periodic(&[1.0, 2.0], &[0.01, 0.02], 2).unwrap();
        assert_eq!(curve.with_shifted_node(0, 1e-4).unwrap().compounding(), Compounding::Periodic(2));
        assert_eq!(curve.with_parallel_shift(1e-4).compounding(), Compounding::Periodic(2));
    }

    #[test]
    fn test_parallel_shift() {
        let curve = sample(CurveInterpolation::Linear);
        let shifted = curve.with_parallel_shift(0.001);
        assert_relative_eq!(
            shifted.zero_rate(4.0).unwrap() - curve.zero_rate(4.0).unwrap(),
            0.001,
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_shift_invalid_node() {
        let curve = sample(CurveInterpolation::Linear);
        assert!(curve.with_shifted_node(5, 1e-4).is_err());
    }
}
