//! Fixed-for-Ibor swap underlying deliverable swap futures.

use super::{ensure, ensure_increasing};
use futopt_core::market_data::CurveProvider;
use futopt_core::types::{Currency, PricingError, RateIndex};

/// Swap receiving a fixed rate and paying an Ibor index, unit notional.
///
/// Ibor coupon `j` fixes over `[ibor_start[j], ibor_end[j]]` with accrual
/// `ibor_fixing_accruals[j]` and pays `ibor_payment_accruals[j] · F_j` at
/// `ibor_payment_times[j]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FixedIborSwap {
    currency: Currency,
    index: RateIndex,
    fixed_rate: f64,
    fixed_payment_times: Vec<f64>,
    fixed_accruals: Vec<f64>,
    ibor_start: Vec<f64>,
    ibor_end: Vec<f64>,
    ibor_fixing_accruals: Vec<f64>,
    ibor_payment_times: Vec<f64>,
    ibor_payment_accruals: Vec<f64>,
}

/// One Ibor coupon of the floating leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct IborCoupon {
    pub start: f64,
    pub end: f64,
    pub fixing_accrual: f64,
    pub payment_time: f64,
    pub payment_accrual: f64,
}

impl FixedIborSwap {
    /// Swap from explicit schedules.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        currency: Currency,
        index: RateIndex,
        fixed_rate: f64,
        fixed_payment_times: Vec<f64>,
        fixed_accruals: Vec<f64>,
        ibor_start: Vec<f64>,
        ibor_end: Vec<f64>,
        ibor_fixing_accruals: Vec<f64>,
        ibor_payment_times: Vec<f64>,
        ibor_payment_accruals: Vec<f64>,
    ) -> Result<Self, PricingError> {
        ensure_increasing("fixed payment times", &fixed_payment_times)?;
        ensure_increasing("ibor payment times", &ibor_payment_times)?;
        ensure(fixed_accruals.len() == fixed_payment_times.len(), || {
            "fixed leg accruals and payment times differ in length".into()
        })?;
        let n = ibor_payment_times.len();
        ensure(
            [ibor_start.len(), ibor_end.len(), ibor_fixing_accruals.len(), ibor_payment_accruals.len()]
                .iter()
                .all(|&len| len == n),
            || "ibor leg schedules differ in length".into(),
        )?;
        ensure(
            ibor_start.iter().zip(&ibor_end).all(|(s, e)| s < e)
                && ibor_fixing_accruals.iter().all(|a| *a > 0.0),
            || "ibor fixing periods must have positive length".into(),
        )?;
        Ok(Self {
            currency,
            index,
            fixed_rate,
            fixed_payment_times,
            fixed_accruals,
            ibor_start,
            ibor_end,
            ibor_fixing_accruals,
            ibor_payment_times,
            ibor_payment_accruals,
        })
    }

    /// Regular swap starting at `start` for `tenor_years`, with exact
    /// `1/frequency` accruals and payment at period end.
    ///
    /// # Examples
    /// ```
    /// use futopt_core::types::{Currency, RateIndex};
    /// use futopt_pricing::instruments::FixedIborSwap;
    ///
    /// let index = RateIndex::new("USD-LIBOR-3M", Currency::USD);
    /// let swap = FixedIborSwap::regular(Currency::USD, index, 0.02, 0.5, 5, 2, 4).unwrap();
    /// assert_eq!(swap.fixed_payment_times().len(), 10);
    /// ```
    pub fn regular(
        currency: Currency,
        index: RateIndex,
        fixed_rate: f64,
        start: f64,
        tenor_years: u32,
        fixed_per_year: u32,
        ibor_per_year: u32,
    ) -> Result<Self, PricingError> {
        ensure(tenor_years > 0 && fixed_per_year > 0 && ibor_per_year > 0, || {
            "tenor and frequencies must be positive".into()
        })?;
        let schedule = |per_year: u32| -> Vec<f64> {
            (1..=tenor_years * per_year)
                .map(|i| start + f64::from(i) / f64::from(per_year))
                .collect()
        };
        let fixed_times = schedule(fixed_per_year);
        let ibor_end = schedule(ibor_per_year);
        let ibor_start: Vec<f64> = std::iter::once(start)
            .chain(ibor_end[..ibor_end.len() - 1].iter().copied())
            .collect();
        let fixed_accrual = 1.0 / f64::from(fixed_per_year);
        let ibor_accrual = 1.0 / f64::from(ibor_per_year);
        let fixed_accruals = vec![fixed_accrual; fixed_times.len()];
        let n = ibor_end.len();
        Self::new(
            currency,
            index,
            fixed_rate,
            fixed_times,
            fixed_accruals,
            ibor_start,
            ibor_end.clone(),
            vec![ibor_accrual; n],
            ibor_end,
            vec![ibor_accrual; n],
        )
    }

    /// Currency of both legs.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Ibor index of the floating leg.
    pub fn index(&self) -> &RateIndex {
        &self.index
    }

    /// Fixed rate received.
    pub fn fixed_rate(&self) -> f64 {
        self.fixed_rate
    }

    /// Fixed leg payment times.
    pub fn fixed_payment_times(&self) -> &[f64] {
        &self.fixed_payment_times
    }

    /// Fixed leg accrual factors.
    pub fn fixed_accruals(&self) -> &[f64] {
        &self.fixed_accruals
    }

    /// Fixed cash flows `(time, c · δ)`.
    pub(crate) fn fixed_cash_flows(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.fixed_payment_times
            .iter()
            .zip(&self.fixed_accruals)
            .map(move |(&t, &a)| (t, self.fixed_rate * a))
    }

    /// Ibor coupons of the paid leg.
    pub(crate) fn ibor_coupons(&self) -> impl Iterator<Item = IborCoupon> + '_ {
        (0..self.ibor_payment_times.len()).map(move |j| IborCoupon {
            start: self.ibor_start[j],
            end: self.ibor_end[j],
            fixing_accrual: self.ibor_fixing_accruals[j],
            payment_time: self.ibor_payment_times[j],
            payment_accrual: self.ibor_payment_accruals[j],
        })
    }

    /// Earliest time any coupon depends on.
    pub fn start_time(&self) -> f64 {
        let first_fixed = self.fixed_payment_times[0];
        self.ibor_start.iter().copied().fold(first_fixed, f64::min)
    }

    /// Cash flows whose discounted sum equals the swap value.
    ///
    /// Fixed coupons stay as they are; Ibor coupon `j` becomes
    /// `-β_j · δ_p/δ_f` at its fixing start and `+δ_p/δ_f` at payment, with
    /// `β_j = (1 + δ_f F_j) D(t_p) / D(t_s)` so that forward-curve and
    /// discount-curve basis is carried by the start amount. Equal times are
    /// merged; the result is sorted by time.
    pub fn cash_flow_equivalent<C: CurveProvider + ?Sized>(&self, curves: &C) -> Result<Vec<(f64, f64)>, PricingError> {
        let mut flows: Vec<(f64, f64)> = self.fixed_cash_flows().collect();
        for c in self.ibor_coupons() {
            let forward = curves.forward_rate(&self.index, c.start, c.end, c.fixing_accrual)?;
            let ratio = c.payment_accrual / c.fixing_accrual;
            let beta = (1.0 + c.fixing_accrual * forward)
                * curves.discount_factor(self.currency, c.payment_time)?
                / curves.discount_factor(self.currency, c.start)?;
            flows.push((c.start, -beta * ratio));
            flows.push((c.payment_time, ratio));
        }
        flows.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mut merged: Vec<(f64, f64)> = Vec::with_capacity(flows.len());
        for (t, amount) in flows {
            match merged.last_mut() {
                Some(last) if last.0 == t => last.1 += amount,
                _ => merged.push((t, amount)),
            }
        }
        Ok(merged)
    }

    /// Present value at time 0, unit notional.
    pub fn present_value<C: CurveProvider + ?Sized>(&self, curves: &C) -> Result<f64, PricingError> {
        let mut pv = 0.0;
        for (t, amount) in self.fixed_cash_flows() {
            pv += amount * curves.discount_factor(self.currency, t)?;
        }
        for c in self.ibor_coupons() {
            let forward = curves.forward_rate(&self.index, c.start, c.end, c.fixing_accrual)?;
            pv -= c.payment_accrual * forward * curves.discount_factor(self.currency, c.payment_time)?;
        }
        Ok(pv)
    }
}
