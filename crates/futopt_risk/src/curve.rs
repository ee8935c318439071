//! Bucketed curve sensitivities from point sensitivities.
//!
//! Pricing methods report `∂V/∂r(t)` at the times they query and `∂V/∂F`
//! for every forward they project. These are mapped onto curve nodes
//! through each curve's interpolation weights, and from nodes onto market
//! quotes through the calibration Jacobian carried by the provider.

use crate::error::SensitivityError;
use futopt_core::market_data::{CurveProvider, YieldCurve};
use futopt_core::sensitivity::{CurveParameterSensitivity, ForwardSensitivity, MulticurveSensitivity};
use tracing::trace;

/// Point sensitivities to per-node zero-rate sensitivities.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurveParameterSensitivityCalculator;

impl CurveParameterSensitivityCalculator {
    /// Creates the calculator.
    pub fn new() -> Self {
        Self
    }

    /// `∂V/∂node` for every curve named in `sensitivity`.
    ///
    /// # Examples
    /// ```
    /// use futopt_core::market_data::{InterpolatedCurve, MulticurveProvider};
    /// use futopt_core::sensitivity::MulticurveSensitivity;
    /// use futopt_core::types::Currency;
    /// use futopt_risk::CurveParameterSensitivityCalculator;
    ///
    /// let curves = MulticurveProvider::new().with_discount_curve(
    ///     Currency::USD,
    ///     "USD-DSC",
    ///     InterpolatedCurve::linear(&[1.0, 2.0], &[0.01, 0.02]).unwrap(),
    /// );
    /// // halfway between the two nodes
    /// let point = MulticurveSensitivity::of_yield_discounting("USD-DSC", 1.5, 10.0);
    /// let buckets = CurveParameterSensitivityCalculator::new()
    ///     .calculate(&point, &curves)
    ///     .unwrap();
    /// assert_eq!(buckets.get("USD-DSC"), Some(&[5.0, 5.0][..]));
    /// ```
    pub fn calculate<C: CurveProvider + ?Sized>(
        &self,
        sensitivity: &MulticurveSensitivity,
        curves: &C,
    ) -> Result<CurveParameterSensitivity, SensitivityError> {
        let mut result = CurveParameterSensitivity::new();
        for (name, points) in sensitivity.yield_discounting() {
            let values = self.bucket_points(curves, name, points.iter().copied())?;
            result.add_values(name, &values);
        }
        for (name, forwards) in sensitivity.forward() {
            let mut points = Vec::with_capacity(2 * forwards.len());
            for forward in forwards {
                points.extend(forward_as_zero_rate_points(curves, name, forward)?);
            }
            let values = self.bucket_points(curves, name, points.into_iter())?;
            result.add_values(name, &values);
        }
        Ok(result)
    }

    fn bucket_points<C: CurveProvider + ?Sized>(
        &self,
        curves: &C,
        name: &str,
        points: impl Iterator<Item = (f64, f64)>,
    ) -> Result<Vec<f64>, SensitivityError> {
        let curve = curves.curve(name)?;
        let mut values = vec![0.0; curve.node_count()];
        for (t, v) in points {
            let weights = curve.zero_rate_node_sensitivity(t)?;
            for (bucket, w) in values.iter_mut().zip(weights) {
                *bucket += v * w;
            }
        }
        trace!(curve = name, nodes = values.len(), "bucketed point sensitivities");
        Ok(values)
    }
}

/// `F = (D(s)/D(e) − 1)/δ` with `D(t) = exp(−r(t) t)` gives
/// `∂F/∂r(s) = −s D(s)/(δ D(e))` and `∂F/∂r(e) = e D(s)/(δ D(e))`.
fn forward_as_zero_rate_points<C: CurveProvider + ?Sized>(
    curves: &C,
    name: &str,
    forward: &ForwardSensitivity,
) -> Result<[(f64, f64); 2], SensitivityError> {
    let curve = curves.curve(name)?;
    let df_start = curve.discount_factor(forward.start)?;
    let df_end = curve.discount_factor(forward.end)?;
    let ratio = df_start / (df_end * forward.accrual);
    Ok([
        (forward.start, -forward.start * ratio * forward.value),
        (forward.end, forward.end * ratio * forward.value),
    ])
}

/// Node sensitivities to market-quote sensitivities through the calibration
/// Jacobian of each curve.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketQuoteSensitivityCalculator {
    parameter: CurveParameterSensitivityCalculator,
}

impl MarketQuoteSensitivityCalculator {
    /// Creates the calculator.
    pub fn new() -> Self {
        Self::default()
    }

    /// `sensitivity^T · J` per curve.
    ///
    /// Every curve in `sensitivity` must carry a Jacobian.
    pub fn from_parameter_sensitivity<C: CurveProvider + ?Sized>(
        &self,
        sensitivity: &CurveParameterSensitivity,
        curves: &C,
    ) -> Result<CurveParameterSensitivity, SensitivityError> {
        let mut result = CurveParameterSensitivity::new();
        for (name, values) in sensitivity.iter() {
            let jacobian = curves
                .jacobian(name)
                .ok_or_else(|| SensitivityError::MissingJacobian {
                    curve: name.to_string(),
                })?;
            if jacobian.parameter_count() != values.len() {
                return Err(SensitivityError::DimensionMismatch {
                    curve: name.to_string(),
                    expected: jacobian.parameter_count(),
                    found: values.len(),
                });
            }
            result.add_values(name, &jacobian.transform(values)?);
        }
        Ok(result)
    }

    /// Point sensitivities straight to market-quote sensitivities.
    pub fn from_point_sensitivity<C: CurveProvider + ?Sized>(
        &self,
        sensitivity: &MulticurveSensitivity,
        curves: &C,
    ) -> Result<CurveParameterSensitivity, SensitivityError> {
        let parameters = self.parameter.calculate(sensitivity, curves)?;
        self.from_parameter_sensitivity(&parameters, curves)
    }
}
