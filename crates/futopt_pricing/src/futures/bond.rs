//! Bond futures priced off the cheapest-to-deliver bond.

use super::FuturesPricing;
use crate::instruments::BondFuturesSecurity;
use futopt_core::market_data::CurveProvider;
use futopt_core::sensitivity::MulticurveSensitivity;
use futopt_core::types::PricingError;
use tracing::trace;

impl BondFuturesSecurity {
    /// Index of the cheapest-to-deliver bond and the futures price it sets:
    /// `min_i (P_i(t_d) − AI_i) / CF_i`.
    pub fn cheapest_to_deliver<C: CurveProvider + ?Sized>(&self, curves: &C) -> Result<(usize, f64), PricingError> {
        let mut best: Option<(usize, f64)> = None;
        for (i, (bond, cf)) in self.deliverables().iter().zip(self.conversion_factors()).enumerate() {
            let price = (bond.dirty_price_from_curves(curves)? - bond.accrued_interest()) / cf;
            if best.map_or(true, |(_, b)| price < b) {
                best = Some((i, price));
            }
        }
        best.ok_or_else(|| PricingError::InvalidInput("empty deliverable basket".into()))
    }
}

impl FuturesPricing for BondFuturesSecurity {
    fn futures_price<C: CurveProvider + ?Sized>(&self, curves: &C) -> Result<f64, PricingError> {
        Ok(self.cheapest_to_deliver(curves)?.1)
    }

    fn futures_price_curve_sensitivity<C: CurveProvider + ?Sized>(
        &self,
        curves: &C,
    ) -> Result<MulticurveSensitivity, PricingError> {
        let (ctd, _) = self.cheapest_to_deliver(curves)?;
        trace!(ctd, name = self.name(), "bond futures sensitivity");
        Ok(self.deliverables()[ctd]
            .dirty_price_from_curves_sensitivity(curves)?
            .multiplied_by(1.0 / self.conversion_factors()[ctd]))
    }
}
