//! Yield-average bond futures: price = 1 − mean yield of the basket.

use super::FuturesPricing;
use crate::instruments::YieldAverageBondFuturesSecurity;
use futopt_core::market_data::CurveProvider;
use futopt_core::sensitivity::MulticurveSensitivity;
use futopt_core::types::PricingError;

impl YieldAverageBondFuturesSecurity {
    /// Yield of each deliverable at its forward dirty price.
    pub fn deliverable_yields<C: CurveProvider + ?Sized>(&self, curves: &C) -> Result<Vec<f64>, PricingError> {
        self.deliverables()
            .iter()
            .map(|bond| bond.yield_from_dirty_price(bond.dirty_price_from_curves(curves)?))
            .collect()
    }
}

impl FuturesPricing for YieldAverageBondFuturesSecurity {
    fn futures_price<C: CurveProvider + ?Sized>(&self, curves: &C) -> Result<f64, PricingError> {
        let yields = self.deliverable_yields(curves)?;
        Ok(1.0 - yields.iter().sum::<f64>() / yields.len() as f64)
    }

    /// `∂y_i/∂r = (∂P_i/∂r) / (dP_i/dy)` by the implicit function theorem.
    fn futures_price_curve_sensitivity<C: CurveProvider + ?Sized>(
        &self,
        curves: &C,
    ) -> Result<MulticurveSensitivity, PricingError> {
        let n = self.deliverables().len() as f64;
        let mut total = MulticurveSensitivity::new();
        for bond in self.deliverables() {
            let dirty = bond.dirty_price_from_curves(curves)?;
            let y = bond.yield_from_dirty_price(dirty)?;
            let (_, dp_dy) = bond.price_and_derivative_from_yield(y);
            total += bond
                .dirty_price_from_curves_sensitivity(curves)?
                .multiplied_by(-1.0 / (n * dp_dy));
        }
        Ok(total.cleaned())
    }
}
