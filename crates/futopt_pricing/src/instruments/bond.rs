//! Fixed-coupon bond as seen from its settlement date.

use super::{ensure, ensure_increasing};
use futopt_core::market_data::CurveProvider;
use futopt_core::math::solvers::{bracket_root, BrentSolver, SolverConfig};
use futopt_core::sensitivity::MulticurveSensitivity;
use futopt_core::types::{Currency, IssuerId, PricingError};

/// Fixed-coupon bond with coupons after `settlement_time`.
///
/// Amounts are per unit notional; the notional is repaid at the last coupon
/// time. `accrual_factor_to_next_coupon` is the fraction of the first coupon
/// period remaining at settlement, used by the yield conventions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FixedCouponBond {
    issuer: IssuerId,
    currency: Currency,
    coupon_rate: f64,
    coupons_per_year: u32,
    settlement_time: f64,
    coupon_times: Vec<f64>,
    coupon_amounts: Vec<f64>,
    accrual_factor_to_next_coupon: f64,
    accrued_interest: f64,
}

impl FixedCouponBond {
    /// Bond from explicit coupon times and amounts.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        issuer: IssuerId,
        currency: Currency,
        coupon_rate: f64,
        coupons_per_year: u32,
        settlement_time: f64,
        coupon_times: Vec<f64>,
        coupon_amounts: Vec<f64>,
        accrual_factor_to_next_coupon: f64,
        accrued_interest: f64,
    ) -> Result<Self, PricingError> {
        ensure(coupons_per_year > 0, || "coupons per year must be positive".into())?;
        ensure_increasing("coupon times", &coupon_times)?;
        ensure(coupon_times.len() == coupon_amounts.len(), || {
            format!(
                "{} coupon times but {} amounts",
                coupon_times.len(),
                coupon_amounts.len()
            )
        })?;
        ensure(coupon_times[0] > settlement_time, || {
            format!(
                "first coupon {} not after settlement {}",
                coupon_times[0], settlement_time
            )
        })?;
        ensure((0.0..=1.0).contains(&accrual_factor_to_next_coupon), || {
            format!(
                "accrual factor to next coupon {} outside [0, 1]",
                accrual_factor_to_next_coupon
            )
        })?;
        Ok(Self {
            issuer,
            currency,
            coupon_rate,
            coupons_per_year,
            settlement_time,
            coupon_times,
            coupon_amounts,
            accrual_factor_to_next_coupon,
            accrued_interest,
        })
    }

    /// Regular bond: `coupon_count` coupons of `coupon_rate / coupons_per_year`
    /// every `1 / coupons_per_year` years from `first_coupon_time`.
    ///
    /// # Examples
    /// ```
    /// use futopt_core::types::{Currency, IssuerId};
    /// use futopt_pricing::instruments::FixedCouponBond;
    ///
    /// let bond = FixedCouponBond::regular(IssuerId::new("UST"), Currency::USD, 0.04, 2, 0.25, 0.4, 10).unwrap();
    /// assert_eq!(bond.coupon_times().len(), 10);
    /// assert!((bond.accrued_interest() - 0.02 * 0.7).abs() < 1e-15);
    /// ```
    pub fn regular(
        issuer: IssuerId,
        currency: Currency,
        coupon_rate: f64,
        coupons_per_year: u32,
        settlement_time: f64,
        first_coupon_time: f64,
        coupon_count: usize,
    ) -> Result<Self, PricingError> {
        ensure(coupons_per_year > 0, || "coupons per year must be positive".into())?;
        let m = f64::from(coupons_per_year);
        let coupon = coupon_rate / m;
        let times = (0..coupon_count)
            .map(|i| first_coupon_time + i as f64 / m)
            .collect();
        let accrual_factor = ((first_coupon_time - settlement_time) * m).clamp(0.0, 1.0);
        Self::new(
            issuer,
            currency,
            coupon_rate,
            coupons_per_year,
            settlement_time,
            times,
            vec![coupon; coupon_count],
            accrual_factor,
            coupon * (1.0 - accrual_factor),
        )
    }

    /// Issuer whose curve discounts the bond.
    pub fn issuer(&self) -> &IssuerId {
        &self.issuer
    }

    /// Currency.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Annual coupon rate.
    pub fn coupon_rate(&self) -> f64 {
        self.coupon_rate
    }

    /// Coupon frequency.
    pub fn coupons_per_year(&self) -> u32 {
        self.coupons_per_year
    }

    /// Settlement time.
    pub fn settlement_time(&self) -> f64 {
        self.settlement_time
    }

    /// Coupon payment times.
    pub fn coupon_times(&self) -> &[f64] {
        &self.coupon_times
    }

    /// Coupon amounts per unit notional.
    pub fn coupon_amounts(&self) -> &[f64] {
        &self.coupon_amounts
    }

    /// Fraction of the first coupon period left at settlement.
    pub fn accrual_factor_to_next_coupon(&self) -> f64 {
        self.accrual_factor_to_next_coupon
    }

    /// Accrued interest at settlement per unit notional.
    pub fn accrued_interest(&self) -> f64 {
        self.accrued_interest
    }

    fn nominal_time(&self) -> f64 {
        self.coupon_times[self.coupon_times.len() - 1]
    }

    /// Cash flows `(time, amount)` including the notional repayment.
    pub fn cash_flows(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.coupon_times
            .iter()
            .copied()
            .zip(self.coupon_amounts.iter().copied())
            .chain(std::iter::once((self.nominal_time(), 1.0)))
    }

    /// Dirty price at settlement from the issuer curve:
    /// `Σ c_i D(t_i) / D(t_s)`.
    pub fn dirty_price_from_curves<C: CurveProvider + ?Sized>(&self, curves: &C) -> Result<f64, PricingError> {
        let ds = curves.issuer_discount_factor(&self.issuer, self.settlement_time)?;
        let mut pv = 0.0;
        for (t, amount) in self.cash_flows() {
            pv += amount * curves.issuer_discount_factor(&self.issuer, t)?;
        }
        Ok(pv / ds)
    }

    /// Point sensitivity of [`Self::dirty_price_from_curves`] to the issuer curve.
    pub fn dirty_price_from_curves_sensitivity<C: CurveProvider + ?Sized>(
        &self,
        curves: &C,
    ) -> Result<MulticurveSensitivity, PricingError> {
        let curve = curves.issuer_curve_name(&self.issuer)?.to_string();
        let ds = curves.issuer_discount_factor(&self.issuer, self.settlement_time)?;
        let mut points = Vec::with_capacity(self.coupon_times.len() + 2);
        let mut pv = 0.0;
        for (t, amount) in self.cash_flows() {
            let df = curves.issuer_discount_factor(&self.issuer, t)?;
            pv += amount * df;
            points.push((t, -t * amount * df / ds));
        }
        points.push((self.settlement_time, self.settlement_time * pv / ds));
        Ok(MulticurveSensitivity::of_yield_discounting_points(curve, points).cleaned())
    }

    /// Dirty price from a yield with `coupons_per_year` compounding:
    ///
    /// ```text
    /// P(y) = Σ_i c_i v^(α + i) + v^(α + n - 1),  v = 1 / (1 + y/m)
    /// ```
    pub fn dirty_price_from_yield(&self, y: f64) -> f64 {
        self.price_and_derivative_from_yield(y).0
    }

    /// `P(y)` and `dP/dy`.
    pub fn price_and_derivative_from_yield(&self, y: f64) -> (f64, f64) {
        let m = f64::from(self.coupons_per_year);
        let v = 1.0 / (1.0 + y / m);
        let dv_dy = -v * v / m;
        let alpha = self.accrual_factor_to_next_coupon;
        let n = self.coupon_times.len();
        let mut price = 0.0;
        let mut dp_dv = 0.0;
        for (i, &c) in self.coupon_amounts.iter().enumerate() {
            let e = alpha + i as f64;
            price += c * v.powf(e);
            dp_dv += c * e * v.powf(e - 1.0);
        }
        let e = alpha + (n - 1) as f64;
        price += v.powf(e);
        dp_dv += e * v.powf(e - 1.0);
        (price, dp_dv * dv_dy)
    }

    /// Yield reproducing `dirty_price` under [`Self::dirty_price_from_yield`].
    pub fn yield_from_dirty_price(&self, dirty_price: f64) -> Result<f64, PricingError> {
        ensure(dirty_price > 0.0, || {
            format!("dirty price must be positive, got {}", dirty_price)
        })?;
        let f = |y: f64| self.dirty_price_from_yield(y) - dirty_price;
        let (a, b) = bracket_root(&f, -0.01, 0.1, 50)?;
        let solver = BrentSolver::new(SolverConfig {
            tolerance: 1e-14,
            max_iterations: 200,
        });
        Ok(solver.find_root(f, a, b)?)
    }
}
