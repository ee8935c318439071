//! STIR futures: price = 1 − F.

use super::FuturesPricing;
use crate::instruments::InterestRateFutureSecurity;
use futopt_core::market_data::CurveProvider;
use futopt_core::sensitivity::{ForwardSensitivity, MulticurveSensitivity};
use futopt_core::types::PricingError;

impl FuturesPricing for InterestRateFutureSecurity {
    fn futures_price<C: CurveProvider + ?Sized>(&self, curves: &C) -> Result<f64, PricingError> {
        let forward =
            curves.forward_rate(self.index(), self.fixing_start(), self.fixing_end(), self.fixing_accrual())?;
        Ok(1.0 - forward)
    }

    fn futures_price_curve_sensitivity<C: CurveProvider + ?Sized>(
        &self,
        curves: &C,
    ) -> Result<MulticurveSensitivity, PricingError> {
        let curve = curves.forward_curve_name(self.index())?;
        Ok(MulticurveSensitivity::of_forward(
            curve,
            ForwardSensitivity {
                start: self.fixing_start(),
                end: self.fixing_end(),
                accrual: self.fixing_accrual(),
                value: -1.0,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::futures::test_support::{assert_parallel_sensitivity, curves, libor3m, FWD};
    use approx::assert_relative_eq;

    fn future() -> InterestRateFutureSecurity {
        InterestRateFutureSecurity::new("EDU6", libor3m(), 0.5, 0.5, 0.75, 0.25, 1_000_000.0, 0.25).unwrap()
    }

    #[test]
    fn test_price_is_one_minus_forward() {
        let curves = curves();
        let forward = curves.forward_rate(&libor3m(), 0.5, 0.75, 0.25).unwrap();
        assert_relative_eq!(future().futures_price(&curves).unwrap(), 1.0 - forward, epsilon = 1e-15);
    }

    #[test]
    fn test_curve_sensitivity() {
        let curves = curves();
        let sensitivity = future().futures_price_curve_sensitivity(&curves).unwrap();
        assert!(sensitivity.yield_discounting().is_empty());
        assert_eq!(sensitivity.forward()[FWD][0].value, -1.0);
        assert_parallel_sensitivity(&future(), &curves, FWD, 1e-8);
    }

    #[test]
    fn test_missing_forward_curve() {
        let curves = futopt_core::market_data::MulticurveProvider::new();
        assert!(matches!(
            future().futures_price(&curves),
            Err(PricingError::MarketData(
                futopt_core::market_data::MarketDataError::MissingForwardCurve { .. }
            ))
        ));
    }
}
