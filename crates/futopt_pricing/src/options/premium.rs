//! Premium options: Black price discounted from expiry.

use super::FuturesOptionPricing;
use crate::futures::FuturesPricing;
use crate::instruments::{FuturesOption, FuturesOptionPremiumSecurity, FuturesSecurity};
use futopt_core::market_data::CurveProvider;
use futopt_core::sensitivity::MulticurveSensitivity;
use futopt_core::types::PricingError;

impl<U: FuturesPricing> FuturesOptionPricing for FuturesOptionPremiumSecurity<U> {
    fn numeraire<C: CurveProvider + ?Sized>(&self, curves: &C) -> Result<f64, PricingError> {
        Ok(curves.discount_factor(self.underlying().currency(), self.expiry())?)
    }

    fn numeraire_curve_sensitivity<C: CurveProvider + ?Sized>(
        &self,
        curves: &C,
        price: f64,
    ) -> Result<MulticurveSensitivity, PricingError> {
        let curve = curves.discount_curve_name(self.underlying().currency())?;
        Ok(MulticurveSensitivity::of_yield_discounting(
            curve,
            self.expiry(),
            -self.expiry() * price,
        ))
    }
}
