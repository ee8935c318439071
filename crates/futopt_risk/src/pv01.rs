//! PV01: present value change for a one basis point move of each curve.
//!
//! Bucketed node sensitivities scaled by `1e-4`, summed per curve. Nodes
//! are the curve's quoted rates, so on a periodically compounded curve the
//! basis point moves the quoted rate.

use crate::curve::CurveParameterSensitivityCalculator;
use crate::error::SensitivityError;
use futopt_core::market_data::CurveProvider;
use futopt_core::sensitivity::{CurveParameterSensitivity, MulticurveSensitivity};
use std::collections::BTreeMap;
use tracing::debug;

/// One basis point.
pub const BASIS_POINT: f64 = 1e-4;

/// Point sensitivities to per-curve PV01.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pv01Calculator {
    parameter: CurveParameterSensitivityCalculator,
}

impl Pv01Calculator {
    /// Creates the calculator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Node sensitivities scaled to one basis point.
    pub fn bucketed<C: CurveProvider + ?Sized>(
        &self,
        sensitivity: &MulticurveSensitivity,
        curves: &C,
    ) -> Result<CurveParameterSensitivity, SensitivityError> {
        Ok(self.parameter.calculate(sensitivity, curves)?.multiplied_by(BASIS_POINT))
    }

    /// PV01 of every curve named in `sensitivity`.
    ///
    /// # Examples
    /// ```
    /// use futopt_core::market_data::{InterpolatedCurve, MulticurveProvider};
    /// use futopt_core::sensitivity::MulticurveSensitivity;
    /// use futopt_core::types::Currency;
    /// use futopt_risk::Pv01Calculator;
    ///
    /// let curves = MulticurveProvider::new().with_discount_curve(
    ///     Currency::USD,
    ///     "USD-DSC",
    ///     InterpolatedCurve::linear(&[1.0, 2.0], &[0.01, 0.02]).unwrap(),
    /// );
    /// let point = MulticurveSensitivity::of_yield_discounting("USD-DSC", 1.5, -20_000.0);
    /// let pv01 = Pv01Calculator::new().calculate(&point, &curves).unwrap();
    /// assert!((pv01["USD-DSC"] + 2.0).abs() < 1e-12);
    /// ```
    pub fn calculate<C: CurveProvider + ?Sized>(
        &self,
        sensitivity: &MulticurveSensitivity,
        curves: &C,
    ) -> Result<BTreeMap<String, f64>, SensitivityError> {
        let bucketed = self.bucketed(sensitivity, curves)?;
        Ok(Self::per_curve(&bucketed))
    }

    /// Sums bucketed PV01 per curve.
    pub fn per_curve(bucketed: &CurveParameterSensitivity) -> BTreeMap<String, f64> {
        bucketed
            .iter()
            .map(|(name, values)| {
                let total: f64 = values.iter().sum();
                debug!(curve = name, pv01 = total, "curve PV01");
                (name.to_string(), total)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use futopt_core::market_data::{InterpolatedCurve, MulticurveProvider};
    use futopt_core::sensitivity::ForwardSensitivity;
    use futopt_core::types::{Currency, RateIndex};

    const DSC: &str = "GBP-DSC";
    const FWD: &str = "GBP-FWD3M";

    fn curves() -> MulticurveProvider {
        let times = [0.25, 0.5, 1.0, 2.0, 5.0];
        MulticurveProvider::new()
            .with_discount_curve(
                Currency::GBP,
                DSC,
                InterpolatedCurve::periodic(&times, &[0.004, 0.005, 0.007, 0.01, 0.015], 1).unwrap(),
            )
            .with_forward_curve(
                RateIndex::new("GBP-LIBOR-3M", Currency::GBP),
                FWD,
                InterpolatedCurve::linear(&times, &[0.006, 0.007, 0.009, 0.012, 0.017]).unwrap(),
            )
    }

    fn point() -> MulticurveSensitivity {
        let mut point = MulticurveSensitivity::of_yield_discounting_points(DSC, vec![(0.4, -1.0e6), (1.5, 3.0e5)]);
        point += MulticurveSensitivity::of_forward(
            FWD,
            ForwardSensitivity {
                start: 0.75,
                end: 1.0,
                accrual: 0.25,
                value: 2.5e5,
            },
        );
        point
    }

    #[test]
    fn test_per_curve_is_bucket_sum() {
        let curves = curves();
        let calc = Pv01Calculator::new();
        let bucketed = calc.bucketed(&point(), &curves).unwrap();
        let pv01 = calc.calculate(&point(), &curves).unwrap();
        assert_eq!(pv01.len(), 2);
        for (name, values) in bucketed.iter() {
            assert_relative_eq!(pv01[name], values.iter().sum::<f64>(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_matches_one_basis_point_parallel_shift() {
        let curves = curves();
        let pv01 = Pv01Calculator::new().calculate(&point(), &curves).unwrap();
        let parameters = CurveParameterSensitivityCalculator::new()
            .calculate(&point(), &curves)
            .unwrap();
        for name in [DSC, FWD] {
            let parallel: f64 = parameters.get(name).unwrap().iter().sum();
            assert_relative_eq!(pv01[name], parallel * BASIS_POINT, max_relative = 1e-14);
        }
        assert!(pv01[FWD] > 0.0);
    }

    #[test]
    fn test_empty_sensitivity() {
        let pv01 = Pv01Calculator::new()
            .calculate(&MulticurveSensitivity::new(), &curves())
            .unwrap();
        assert!(pv01.is_empty());
    }
}
