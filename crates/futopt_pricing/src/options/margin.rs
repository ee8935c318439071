//! Margined options: numeraire 1, no discounting.

use super::FuturesOptionPricing;
use crate::futures::FuturesPricing;
use crate::instruments::FuturesOptionMarginSecurity;
use futopt_core::market_data::CurveProvider;
use futopt_core::sensitivity::MulticurveSensitivity;
use futopt_core::types::PricingError;

impl<U: FuturesPricing> FuturesOptionPricing for FuturesOptionMarginSecurity<U> {
    fn numeraire<C: CurveProvider + ?Sized>(&self, _curves: &C) -> Result<f64, PricingError> {
        Ok(1.0)
    }

    fn numeraire_curve_sensitivity<C: CurveProvider + ?Sized>(
        &self,
        _curves: &C,
        _price: f64,
    ) -> Result<MulticurveSensitivity, PricingError> {
        Ok(MulticurveSensitivity::new())
    }
}
