//! Deliverable swap futures with a Hull-White convexity adjustment.
//!
//! Daily margining makes the futures price the risk-neutral expectation of
//! the delivered swap value rather than its forward value. In the one-factor
//! Hull-White model each cash flow of the swap's cash-flow equivalent is
//! scaled by the convexity factor `γ(t0, t_d, t_i) ≤ 1`:
//!
//! ```text
//! price = 1 + Σ_i cfe_i · D(t_i) · γ_i / D(t_d)
//! ```

use crate::instruments::{FuturesSecurity, IborCoupon, SwapFuturesDeliverableSecurity};
use futopt_core::market_data::{CurveProvider, MulticurveProvider};
use futopt_core::sensitivity::{ForwardSensitivity, ModelParameter, ModelParameterSensitivity, MulticurveSensitivity};
use futopt_core::types::{Currency, PricingError};
use futopt_models::rates::HullWhiteOneFactorParameters;

/// Curves plus the Hull-White parameters of one currency.
#[derive(Debug, Clone)]
pub struct HullWhiteProvider {
    curves: MulticurveProvider,
    parameters: HullWhiteOneFactorParameters,
    currency: Currency,
}

impl HullWhiteProvider {
    /// Hull-White dynamics for `currency` on top of `curves`.
    pub fn new(curves: MulticurveProvider, parameters: HullWhiteOneFactorParameters, currency: Currency) -> Self {
        Self {
            curves,
            parameters,
            currency,
        }
    }

    /// Underlying curves.
    pub fn curves(&self) -> &MulticurveProvider {
        &self.curves
    }

    /// Model parameters.
    pub fn parameters(&self) -> &HullWhiteOneFactorParameters {
        &self.parameters
    }

    /// Currency the parameters apply to.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Same parameters on other curves.
    pub fn with_curves(&self, curves: MulticurveProvider) -> Self {
        Self {
            curves,
            ..self.clone()
        }
    }

    /// Same curves with other parameters.
    pub fn with_parameters(&self, parameters: HullWhiteOneFactorParameters) -> Self {
        Self {
            parameters,
            ..self.clone()
        }
    }
}

/// `amount · D(discount_time) · γ(convexity_time)`, one per cash-flow-equivalent piece.
struct Term {
    discount_time: f64,
    convexity_time: f64,
    amount: f64,
    coupon: Option<IborCoupon>,
}

fn terms(future: &SwapFuturesDeliverableSecurity, curves: &MulticurveProvider) -> Result<Vec<Term>, PricingError> {
    let swap = future.underlying();
    let mut terms: Vec<Term> = swap
        .fixed_cash_flows()
        .map(|(t, amount)| Term {
            discount_time: t,
            convexity_time: t,
            amount,
            coupon: None,
        })
        .collect();
    for c in swap.ibor_coupons() {
        let ratio = c.payment_accrual / c.fixing_accrual;
        let forward = curves.forward_rate(swap.index(), c.start, c.end, c.fixing_accrual)?;
        terms.push(Term {
            discount_time: c.payment_time,
            convexity_time: c.payment_time,
            amount: ratio,
            coupon: None,
        });
        // -β·ratio at the fixing start, with β·D(s) = (1 + δF)·D(p)
        terms.push(Term {
            discount_time: c.payment_time,
            convexity_time: c.start,
            amount: -ratio * (1.0 + c.fixing_accrual * forward),
            coupon: Some(c),
        });
    }
    Ok(terms)
}

fn check_currency(future: &SwapFuturesDeliverableSecurity, hw: &HullWhiteProvider) -> Result<(), PricingError> {
    if future.currency() != hw.currency {
        return Err(PricingError::InvalidInput(format!(
            "Hull-White parameters for {} used on a {} future",
            hw.currency,
            future.currency()
        )));
    }
    Ok(())
}

impl SwapFuturesDeliverableSecurity {
    /// Convexity factor of each cash-flow-equivalent time, sorted by time.
    pub fn convexity_factors(&self, hw: &HullWhiteProvider) -> Result<Vec<(f64, f64)>, PricingError> {
        check_currency(self, hw)?;
        let cfe = self.underlying().cash_flow_equivalent(&hw.curves)?;
        cfe.into_iter()
            .map(|(t, _)| {
                let gamma = hw
                    .parameters
                    .futures_convexity_factor(self.last_trading_time(), self.delivery_time(), t)?;
                Ok((t, gamma))
            })
            .collect()
    }

    /// Futures price with the Hull-White convexity adjustment.
    pub fn futures_price_hull_white(&self, hw: &HullWhiteProvider) -> Result<f64, PricingError> {
        check_currency(self, hw)?;
        let curves = &hw.curves;
        let ccy = self.currency();
        let mut pv = 0.0;
        for term in terms(self, curves)? {
            let gamma = hw.parameters.futures_convexity_factor(
                self.last_trading_time(),
                self.delivery_time(),
                term.convexity_time,
            )?;
            pv += term.amount * curves.discount_factor(ccy, term.discount_time)? * gamma;
        }
        Ok(1.0 + pv / curves.discount_factor(ccy, self.delivery_time())?)
    }

    /// Point curve sensitivity of [`Self::futures_price_hull_white`], convexity factors held fixed.
    pub fn futures_price_hull_white_curve_sensitivity(
        &self,
        hw: &HullWhiteProvider,
    ) -> Result<MulticurveSensitivity, PricingError> {
        check_currency(self, hw)?;
        let curves = &hw.curves;
        let ccy = self.currency();
        let td = self.delivery_time();
        let dd = curves.discount_factor(ccy, td)?;
        let discount = curves.discount_curve_name(ccy)?;
        let forward = curves.forward_curve_name(self.underlying().index())?;

        let mut pv = 0.0;
        let mut points = Vec::new();
        let mut forwards = MulticurveSensitivity::new();
        for term in terms(self, curves)? {
            let gamma =
                hw.parameters
                    .futures_convexity_factor(self.last_trading_time(), td, term.convexity_time)?;
            let df = curves.discount_factor(ccy, term.discount_time)?;
            let value = term.amount * df * gamma;
            pv += value;
            points.push((term.discount_time, -term.discount_time * value / dd));
            if let Some(c) = term.coupon {
                forwards += MulticurveSensitivity::of_forward(
                    forward,
                    ForwardSensitivity {
                        start: c.start,
                        end: c.end,
                        accrual: c.fixing_accrual,
                        value: -c.payment_accrual * df * gamma / dd,
                    },
                );
            }
        }
        points.push((td, td * pv / dd));
        Ok((MulticurveSensitivity::of_yield_discounting_points(discount, points) + forwards).cleaned())
    }

    /// `∂price/∂σ_k` for each Hull-White volatility.
    pub fn futures_price_hull_white_sensitivity(
        &self,
        hw: &HullWhiteProvider,
    ) -> Result<ModelParameterSensitivity, PricingError> {
        check_currency(self, hw)?;
        let curves = &hw.curves;
        let ccy = self.currency();
        let dd = curves.discount_factor(ccy, self.delivery_time())?;
        let mut d_volatility = vec![0.0; hw.parameters.volatility().len()];
        for term in terms(self, curves)? {
            let adjoint = hw.parameters.futures_convexity_factor_adjoint(
                self.last_trading_time(),
                self.delivery_time(),
                term.convexity_time,
            )?;
            let weight = term.amount * curves.discount_factor(ccy, term.discount_time)? / dd;
            for (total, d) in d_volatility.iter_mut().zip(&adjoint.d_volatility) {
                *total += weight * d;
            }
        }
        Ok(d_volatility
            .into_iter()
            .enumerate()
            .map(|(index, value)| (ModelParameter::HullWhiteVolatility { index }, value))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::futures::test_support::{curves, libor3m, parallel_total, DSC, FWD};
    use crate::futures::FuturesPricing;
    use crate::instruments::FixedIborSwap;
    use approx::assert_relative_eq;

    fn future() -> SwapFuturesDeliverableSecurity {
        let swap = FixedIborSwap::regular(Currency::USD, libor3m(), 0.0175, 1.0, 10, 2, 4).unwrap();
        SwapFuturesDeliverableSecurity::new("CTPZ6", 0.98, 1.0, swap, 100_000.0).unwrap()
    }

    fn provider() -> HullWhiteProvider {
        let parameters =
            HullWhiteOneFactorParameters::new(0.01, vec![0.008, 0.009, 0.01], vec![0.5, 2.0]).unwrap();
        HullWhiteProvider::new(curves(), parameters, Currency::USD)
    }

    #[test]
    fn test_zero_volatility_matches_discounting() {
        let zero = HullWhiteOneFactorParameters::constant(0.01, 0.0).unwrap();
        let hw = provider().with_parameters(zero);
        assert_relative_eq!(
            future().futures_price_hull_white(&hw).unwrap(),
            future().futures_price(hw.curves()).unwrap(),
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_convexity_factors_bounded() {
        let factors = future().convexity_factors(&provider()).unwrap();
        assert!(!factors.is_empty());
        assert!(factors.iter().all(|(_, g)| *g <= 1.0 && *g > 0.99));
        assert!(factors.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_curve_sensitivity() {
        let hw = provider();
        let sensitivity = future().futures_price_hull_white_curve_sensitivity(&hw).unwrap();
        let h = 1e-6;
        for name in [DSC, FWD] {
            let up = hw.with_curves(hw.curves().with_parallel_shift(name, h).unwrap());
            let down = hw.with_curves(hw.curves().with_parallel_shift(name, -h).unwrap());
            let bumped = (future().futures_price_hull_white(&up).unwrap()
                - future().futures_price_hull_white(&down).unwrap())
                / (2.0 * h);
            assert_relative_eq!(parallel_total(&sensitivity, hw.curves(), name), bumped, epsilon = 1e-7);
        }
    }

    #[test]
    fn test_volatility_sensitivity() {
        let hw = provider();
        let sensitivity = future().futures_price_hull_white_sensitivity(&hw).unwrap();
        let h = 1e-6;
        for k in 0..3 {
            let up = hw.with_parameters(hw.parameters().with_shifted_volatility(k, h).unwrap());
            let down = hw.with_parameters(hw.parameters().with_shifted_volatility(k, -h).unwrap());
            let bumped = (future().futures_price_hull_white(&up).unwrap()
                - future().futures_price_hull_white(&down).unwrap())
                / (2.0 * h);
            assert_relative_eq!(
                sensitivity.get(&ModelParameter::HullWhiteVolatility { index: k }),
                bumped,
                epsilon = 1e-8
            );
        }
    }

    #[test]
    fn test_currency_mismatch() {
        let hw = HullWhiteProvider::new(curves(), provider().parameters().clone(), Currency::EUR);
        assert!(future().futures_price_hull_white(&hw).is_err());
    }
}
