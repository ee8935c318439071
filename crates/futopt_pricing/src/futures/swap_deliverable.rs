//! Deliverable swap futures: price = 1 + value of the swap at delivery.

use super::FuturesPricing;
use crate::instruments::{FuturesSecurity, SwapFuturesDeliverableSecurity};
use futopt_core::market_data::CurveProvider;
use futopt_core::sensitivity::{ForwardSensitivity, MulticurveSensitivity};
use futopt_core::types::PricingError;

impl FuturesPricing for SwapFuturesDeliverableSecurity {
    fn futures_price<C: CurveProvider + ?Sized>(&self, curves: &C) -> Result<f64, PricingError> {
        let pv = self.underlying().present_value(curves)?;
        let dd = curves.discount_factor(self.currency(), self.delivery_time())?;
        Ok(1.0 + pv / dd)
    }

    fn futures_price_curve_sensitivity<C: CurveProvider + ?Sized>(
        &self,
        curves: &C,
    ) -> Result<MulticurveSensitivity, PricingError> {
        let swap = self.underlying();
        let ccy = self.currency();
        let td = self.delivery_time();
        let dd = curves.discount_factor(ccy, td)?;
        let discount = curves.discount_curve_name(ccy)?;
        let forward = curves.forward_curve_name(swap.index())?;

        let mut pv = 0.0;
        let mut points = Vec::new();
        for (t, amount) in swap.fixed_cash_flows() {
            let df = curves.discount_factor(ccy, t)?;
            pv += amount * df;
            points.push((t, -t * amount * df / dd));
        }
        let mut forwards = MulticurveSensitivity::new();
        for c in swap.ibor_coupons() {
            let rate = curves.forward_rate(swap.index(), c.start, c.end, c.fixing_accrual)?;
            let df = curves.discount_factor(ccy, c.payment_time)?;
            let amount = -c.payment_accrual * rate;
            pv += amount * df;
            points.push((c.payment_time, -c.payment_time * amount * df / dd));
            forwards += MulticurveSensitivity::of_forward(
                forward,
                ForwardSensitivity {
                    start: c.start,
                    end: c.end,
                    accrual: c.fixing_accrual,
                    value: -c.payment_accrual * df / dd,
                },
            );
        }
        points.push((td, td * pv / dd));
        Ok((MulticurveSensitivity::of_yield_discounting_points(discount, points) + forwards).cleaned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::futures::test_support::{assert_parallel_sensitivity, curves, libor3m, DSC, FWD};
    use crate::instruments::FixedIborSwap;
    use approx::assert_relative_eq;
    use futopt_core::types::Currency;

    fn future() -> SwapFuturesDeliverableSecurity {
        let swap = FixedIborSwap::regular(Currency::USD, libor3m(), 0.0175, 0.25, 5, 2, 4).unwrap();
        SwapFuturesDeliverableSecurity::new("CTPU6", 0.24, 0.25, swap, 100_000.0).unwrap()
    }

    #[test]
    fn test_price_matches_cash_flow_equivalent() {
        let curves = curves();
        let future = future();
        let dd = curves.discount_factor(Currency::USD, 0.25).unwrap();
        let cfe = future.underlying().cash_flow_equivalent(&curves).unwrap();
        let mut pv = 0.0;
        for (t, amount) in cfe {
            pv += amount * curves.discount_factor(Currency::USD, t).unwrap();
        }
        assert_relative_eq!(future.futures_price(&curves).unwrap(), 1.0 + pv / dd, epsilon = 1e-13);
    }

    #[test]
    fn test_curve_sensitivity() {
        let curves = curves();
        assert_parallel_sensitivity(&future(), &curves, DSC, 1e-7);
        assert_parallel_sensitivity(&future(), &curves, FWD, 1e-7);
    }
}
