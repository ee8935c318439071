//! Hull-White one-factor model with piecewise-constant volatility.
//!
//! A futures price is the expectation of the underlying under the
//! spot-measure, which differs from the forward by a convexity factor. For
//! a cash flow at `t_i` of an underlying delivered at `t_d`, with margining
//! up to `t_0`:
//!
//! ```text
//! γ = exp( (e^{-a t_i} - e^{-a t_d}) / (2a³)
//!          · Σ_k σ_k² (e^{a s_{k+1}} - e^{a s_k})
//!                     (2 - e^{-a (t_d - s_{k+1})} - e^{-a (t_d - s_k)}) )
//! ```
//!
//! where `s_k` are the volatility change times truncated at `t_0`.
//! `γ <= 1` whenever `t_i >= t_d`.

use crate::error::ModelError;
use futopt_core::sensitivity::ModelParameter;

/// Upper bound of the last volatility period.
const TIME_HORIZON: f64 = 1000.0;

/// Hull-White one-factor parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HullWhiteOneFactorParameters {
    mean_reversion: f64,
    volatility: Vec<f64>,
    /// Period boundaries `[0, change times.., TIME_HORIZON]`
    volatility_time: Vec<f64>,
}

/// Convexity factor with its volatility derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexityFactorAdjoint {
    /// Factor γ
    pub factor: f64,
    /// ∂γ/∂σ_k per volatility period
    pub d_volatility: Vec<f64>,
}

impl HullWhiteOneFactorParameters {
    /// Parameters with `volatility[k]` applying between consecutive
    /// `volatility_change_times` (the first from 0, the last to infinity).
    ///
    /// # Examples
    /// ```
    /// use futopt_models::rates::HullWhiteOneFactorParameters;
    ///
    /// let hw = HullWhiteOneFactorParameters::new(0.01, vec![0.01, 0.011, 0.012], vec![0.5, 1.0]).unwrap();
    /// let gamma = hw.futures_convexity_factor(0.25, 0.25, 2.0).unwrap();
    /// assert!(gamma < 1.0);
    /// ```
    pub fn new(
        mean_reversion: f64,
        volatility: Vec<f64>,
        volatility_change_times: Vec<f64>,
    ) -> Result<Self, ModelError> {
        if !(mean_reversion.is_finite() && mean_reversion > 0.0) {
            return Err(ModelError::InvalidParameter {
                name: "mean_reversion",
                value: mean_reversion,
                constraint: "mean_reversion > 0",
            });
        }
        if volatility.len() != volatility_change_times.len() + 1 {
            return Err(ModelError::InvalidQuery(format!(
                "{} volatilities need {} change times, got {}",
                volatility.len(),
                volatility.len().saturating_sub(1),
                volatility_change_times.len()
            )));
        }
        if let Some(&bad) = volatility.iter().find(|v| !(v.is_finite() && **v >= 0.0)) {
            return Err(ModelError::InvalidParameter {
                name: "volatility",
                value: bad,
                constraint: "volatility >= 0",
            });
        }
        let mut volatility_time = Vec::with_capacity(volatility.len() + 1);
        volatility_time.push(0.0);
        volatility_time.extend_from_slice(&volatility_change_times);
        volatility_time.push(TIME_HORIZON);
        if let Some(w) = volatility_time.windows(2).find(|w| !(w[0] < w[1])) {
            return Err(ModelError::InvalidParameter {
                name: "volatility_change_time",
                value: w[1],
                constraint: "increasing, in (0, 1000)",
            });
        }
        Ok(Self {
            mean_reversion,
            volatility,
            volatility_time,
        })
    }

    /// Constant volatility.
    pub fn constant(mean_reversion: f64, volatility: f64) -> Result<Self, ModelError> {
        Self::new(mean_reversion, vec![volatility], Vec::new())
    }

    /// Mean reversion `a`.
    pub fn mean_reversion(&self) -> f64 {
        self.mean_reversion
    }

    /// Volatility per period.
    pub fn volatility(&self) -> &[f64] {
        &self.volatility
    }

    /// Period boundaries, starting at 0 and ending at the model horizon.
    pub fn volatility_time(&self) -> &[f64] {
        &self.volatility_time
    }

    /// Copy with `volatility[index]` moved by `shift`.
    pub fn with_shifted_volatility(&self, index: usize, shift: f64) -> Result<Self, ModelError> {
        let mut volatility = self.volatility.clone();
        match volatility.get_mut(index) {
            Some(v) => *v += shift,
            None => {
                return Err(ModelError::InvalidQuery(format!(
                    "volatility index {} out of range for {} periods",
                    index,
                    self.volatility.len()
                )))
            }
        }
        let change_times = self.volatility_time[1..self.volatility_time.len() - 1].to_vec();
        Self::new(self.mean_reversion, volatility, change_times)
    }

    /// Volatilities as addressable parameters.
    pub fn parameters(&self) -> Vec<(ModelParameter, f64)> {
        self.volatility
            .iter()
            .enumerate()
            .map(|(index, &v)| (ModelParameter::HullWhiteVolatility { index }, v))
            .collect()
    }

    /// Copy with a volatility parameter moved by `shift`.
    pub fn with_shifted_parameter(&self, parameter: &ModelParameter, shift: f64) -> Result<Self, ModelError> {
        match *parameter {
            ModelParameter::HullWhiteVolatility { index } => self.with_shifted_volatility(index, shift),
            ref other => Err(ModelError::UnknownParameter {
                parameter: other.to_string(),
                model: "HullWhite",
            }),
        }
    }

    /// Convexity factor γ for a cash flow at `cash_flow_time` of an
    /// underlying delivered at `delivery_time`, margined until `last_margin_time`.
    pub fn futures_convexity_factor(
        &self,
        last_margin_time: f64,
        delivery_time: f64,
        cash_flow_time: f64,
    ) -> Result<f64, ModelError> {
        Ok(self
            .futures_convexity_factor_adjoint(last_margin_time, delivery_time, cash_flow_time)?
            .factor)
    }

    /// Convexity factor and its derivatives with respect to each volatility.
    pub fn futures_convexity_factor_adjoint(
        &self,
        last_margin_time: f64,
        delivery_time: f64,
        cash_flow_time: f64,
    ) -> Result<ConvexityFactorAdjoint, ModelError> {
        if cash_flow_time < delivery_time {
            return Err(ModelError::CashFlowBeforeDelivery {
                cash_flow_time,
                delivery_time,
            });
        }
        if last_margin_time > delivery_time {
            return Err(ModelError::InvalidQuery(format!(
                "last margin time {} after delivery {}",
                last_margin_time, delivery_time
            )));
        }
        let mut d_volatility = vec![0.0; self.volatility.len()];
        if last_margin_time <= 0.0 {
            return Ok(ConvexityFactorAdjoint {
                factor: 1.0,
                d_volatility,
            });
        }
        let a = self.mean_reversion;
        let factor1 = (-a * cash_flow_time).exp() - (-a * delivery_time).exp();
        let scale = factor1 / (2.0 * a * a * a);

        let mut index_t0 = 1;
        while index_t0 < self.volatility_time.len() - 1 && last_margin_time > self.volatility_time[index_t0] {
            index_t0 += 1;
        }
        let mut s: Vec<f64> = self.volatility_time[..index_t0].to_vec();
        s.push(last_margin_time);

        let mut factor2 = 0.0;
        let mut factor_exp = Vec::with_capacity(index_t0);
        for k in 0..index_t0 {
            let e = ((a * s[k + 1]).exp() - (a * s[k]).exp())
                * (2.0 - (-a * (delivery_time - s[k + 1])).exp() - (-a * (delivery_time - s[k])).exp());
            factor2 += self.volatility[k] * self.volatility[k] * e;
            factor_exp.push(e);
        }
        let factor = (scale * factor2).exp();
        for (k, e) in factor_exp.into_iter().enumerate() {
            d_volatility[k] = 2.0 * self.volatility[k] * e * scale * factor;
        }
        Ok(ConvexityFactorAdjoint {
            factor,
            d_volatility,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn model() -> HullWhiteOneFactorParameters {
        HullWhiteOneFactorParameters::new(0.01, vec![0.01, 0.011, 0.012, 0.013, 0.014], vec![0.5, 1.0, 2.0, 5.0])
            .unwrap()
    }

    /// `exp(-∫₀^{t0} ν(s,t_d)(ν(s,t_i) - ν(s,t_d)) ds)` by Simpson's rule.
    fn integrated_factor(hw: &HullWhiteOneFactorParameters, t0: f64, td: f64, ti: f64) -> f64 {
        let a = hw.mean_reversion();
        let mut bounds: Vec<f64> = hw.volatility_time().iter().copied().filter(|&b| b < t0).collect();
        bounds.push(t0);
        let mut total = 0.0;
        for (k, w) in bounds.windows(2).enumerate() {
            let sigma = hw.volatility()[k];
            let nu = |s: f64, t: f64| sigma * (1.0 - (-a * (t - s)).exp()) / a;
            let integrand = |s: f64| -nu(s, td) * (nu(s, ti) - nu(s, td));
            let n = 200;
            let h = (w[1] - w[0]) / n as f64;
            for i in 0..n {
                let l = w[0] + i as f64 * h;
                total += h / 6.0 * (integrand(l) + 4.0 * integrand(l + 0.5 * h) + integrand(l + h));
            }
        }
        total.exp()
    }

    // ========================================
    // Construction Tests
    // ========================================

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(HullWhiteOneFactorParameters::new(0.0, vec![0.01], vec![]).is_err());
        assert!(HullWhiteOneFactorParameters::new(0.01, vec![0.01, 0.02], vec![]).is_err());
        assert!(HullWhiteOneFactorParameters::new(0.01, vec![-0.01], vec![]).is_err());
        assert!(HullWhiteOneFactorParameters::new(0.01, vec![0.01, 0.02, 0.03], vec![1.0, 0.5]).is_err());
    }

    #[test]
    fn test_shift_volatility() {
        let hw = model().with_shifted_volatility(2, 0.001).unwrap();
        assert_relative_eq!(hw.volatility()[2], 0.013, epsilon = 1e-15);
        assert_eq!(hw.volatility_time(), model().volatility_time());
        assert!(model().with_shifted_volatility(7, 0.001).is_err());
    }

    // ========================================
    // Convexity Factor Tests
    // ========================================

    #[test]
    fn test_factor_matches_integral() {
        let hw = model();
        for &(t0, td, ti) in &[(0.25, 0.25, 0.5), (1.5, 1.6, 3.0), (4.0, 4.0, 14.0)] {
            let gamma = hw.futures_convexity_factor(t0, td, ti).unwrap();
            assert_relative_eq!(gamma, integrated_factor(&hw, t0, td, ti), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_factor_is_one_at_delivery_cash_flow() {
        let gamma = model().futures_convexity_factor(1.0, 1.2, 1.2).unwrap();
        assert_relative_eq!(gamma, 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_expired_margining_gives_one() {
        let adj = model().futures_convexity_factor_adjoint(0.0, 1.0, 3.0).unwrap();
        assert_eq!(adj.factor, 1.0);
        assert!(adj.d_volatility.iter().all(|d| *d == 0.0));
    }

    #[test]
    fn test_cash_flow_before_delivery_rejected() {
        let err = model().futures_convexity_factor(0.5, 1.0, 0.9).unwrap_err();
        assert!(matches!(err, ModelError::CashFlowBeforeDelivery { .. }));
    }

    #[test]
    fn test_adjoint_by_finite_difference() {
        let hw = model();
        let (t0, td, ti) = (1.5, 1.6, 10.0);
        let adj = hw.futures_convexity_factor_adjoint(t0, td, ti).unwrap();
        let h = 1e-6;
        for k in 0..hw.volatility().len() {
            let up = hw.with_shifted_volatility(k, h).unwrap().futures_convexity_factor(t0, td, ti).unwrap();
            let down = hw.with_shifted_volatility(k, -h).unwrap().futures_convexity_factor(t0, td, ti).unwrap();
            assert_relative_eq!(adj.d_volatility[k], (up - down) / (2.0 * h), epsilon = 1e-8);
        }
        // periods after t0 do not contribute
        assert_eq!(adj.d_volatility[3], 0.0);
        assert_eq!(adj.d_volatility[4], 0.0);
    }

    proptest! {
        #[test]
        fn prop_factor_bounded_by_one(
            t0 in 0.0..5.0_f64,
            gap in 0.0..1.0_f64,
            tenor in 0.0..20.0_f64,
        ) {
            let td = t0 + gap;
            let gamma = model().futures_convexity_factor(t0, td, td + tenor).unwrap();
            prop_assert!(gamma <= 1.0);
            prop_assert!(gamma > 0.0);
        }
    }
}
