//! Futures pricing by discounting.
//!
//! Every contract implements [`FuturesPricing`]: a futures price from a
//! [`CurveProvider`] and its point sensitivity to the curves, with the
//! convention that `∂price/∂r(t)` is taken with respect to the continuously
//! compounded zero rate at `t` and forward sensitivities with respect to the
//! simply compounded forward rate.
//!
//! Deliverable swap futures can also be priced with a Hull-White convexity
//! adjustment, see [`HullWhiteProvider`].

mod bond;
mod federal_funds;
mod hull_white;
mod interest_rate;
mod swap_deliverable;
mod yield_average;

pub use hull_white::HullWhiteProvider;

use crate::instruments::{dispatch_future, FutureSecurity, FuturesSecurity};
use futopt_core::market_data::CurveProvider;
use futopt_core::sensitivity::MulticurveSensitivity;
use futopt_core::types::PricingError;

/// Futures price and its curve sensitivity.
pub trait FuturesPricing: FuturesSecurity {
    /// Futures price implied by the curves.
    fn futures_price<C: CurveProvider + ?Sized>(&self, curves: &C) -> Result<f64, PricingError>;

    /// Point sensitivity of [`Self::futures_price`] to the curves.
    fn futures_price_curve_sensitivity<C: CurveProvider + ?Sized>(
        &self,
        curves: &C,
    ) -> Result<MulticurveSensitivity, PricingError>;
}

impl FuturesPricing for FutureSecurity {
    fn futures_price<C: CurveProvider + ?Sized>(&self, curves: &C) -> Result<f64, PricingError> {
        dispatch_future!(self, f => f.futures_price(curves))
    }

    fn futures_price_curve_sensitivity<C: CurveProvider + ?Sized>(
        &self,
        curves: &C,
    ) -> Result<MulticurveSensitivity, PricingError> {
        dispatch_future!(self, f => f.futures_price_curve_sensitivity(curves))
    }
}
