//! Federal funds futures: price = 1 − (accrued + Σ δ_i F_i) / δ_total.

use super::FuturesPricing;
use crate::instruments::FederalFundsFutureSecurity;
use futopt_core::market_data::CurveProvider;
use futopt_core::sensitivity::{ForwardSensitivity, MulticurveSensitivity};
use futopt_core::types::PricingError;

fn periods(future: &FederalFundsFutureSecurity) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
    future
        .fixing_times()
        .windows(2)
        .zip(future.fixing_accruals())
        .map(|(w, &accrual)| (w[0], w[1], accrual))
}

impl FuturesPricing for FederalFundsFutureSecurity {
    fn futures_price<C: CurveProvider + ?Sized>(&self, curves: &C) -> Result<f64, PricingError> {
        let mut interest = self.accrued_interest();
        for (start, end, accrual) in periods(self) {
            interest += accrual * curves.forward_rate(self.index(), start, end, accrual)?;
        }
        Ok(1.0 - interest / self.total_accrual())
    }

    fn futures_price_curve_sensitivity<C: CurveProvider + ?Sized>(
        &self,
        curves: &C,
    ) -> Result<MulticurveSensitivity, PricingError> {
        let curve = curves.forward_curve_name(self.index())?;
        Ok(periods(self)
            .map(|(start, end, accrual)| {
                MulticurveSensitivity::of_forward(
                    curve,
                    ForwardSensitivity {
                        start,
                        end,
                        accrual,
                        value: -accrual / self.total_accrual(),
                    },
                )
            })
            .sum())
    }
}
