//! Futures security definitions.

use super::{ensure, ensure_increasing, FixedCouponBond, FixedIborSwap};
use futopt_core::types::{Currency, PricingError, RateIndex};

/// Contract terms shared by every futures contract.
pub trait FuturesSecurity {
    /// Settlement currency.
    fn currency(&self) -> Currency;

    /// Last trading (last margining) time.
    fn last_trading_time(&self) -> f64;

    /// Contract notional.
    fn notional(&self) -> f64;

    /// Accrual factor applied to price moves in the daily margin.
    fn margin_accrual_factor(&self) -> f64;

    /// Margin per contract when the price moves from `reference_price` to `price`.
    fn margin_value_difference(&self, price: f64, reference_price: f64) -> f64 {
        (price - reference_price) * self.notional() * self.margin_accrual_factor()
    }

    /// Derivative of [`Self::margin_value_difference`] with respect to `price`.
    fn margin_value_derivative(&self, _price: f64) -> f64 {
        self.notional() * self.margin_accrual_factor()
    }
}

fn ensure_notional(notional: f64) -> Result<(), PricingError> {
    ensure(notional.is_finite() && notional > 0.0, || {
        format!("notional must be positive, got {}", notional)
    })
}

// ========================================
// STIR futures
// ========================================

/// Short-term interest rate future on an Ibor index: price = 1 − F.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterestRateFutureSecurity {
    name: String,
    index: RateIndex,
    last_trading_time: f64,
    fixing_start: f64,
    fixing_end: f64,
    fixing_accrual: f64,
    notional: f64,
    margin_accrual_factor: f64,
}

impl InterestRateFutureSecurity {
    /// STIR future fixing `index` over `[fixing_start, fixing_end]`.
    ///
    /// # Examples
    /// ```
    /// use futopt_core::types::{Currency, RateIndex};
    /// use futopt_pricing::instruments::{FuturesSecurity, InterestRateFutureSecurity};
    ///
    /// let index = RateIndex::new("USD-LIBOR-3M", Currency::USD);
    /// let ed = InterestRateFutureSecurity::new("EDU6", index, 0.5, 0.5, 0.75, 0.25, 1_000_000.0, 0.25).unwrap();
    /// assert_eq!(ed.currency(), Currency::USD);
    /// ```
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        index: RateIndex,
        last_trading_time: f64,
        fixing_start: f64,
        fixing_end: f64,
        fixing_accrual: f64,
        notional: f64,
        margin_accrual_factor: f64,
    ) -> Result<Self, PricingError> {
        ensure_notional(notional)?;
        ensure(fixing_start < fixing_end && fixing_accrual > 0.0, || {
            format!(
                "invalid fixing period [{}, {}] with accrual {}",
                fixing_start, fixing_end, fixing_accrual
            )
        })?;
        ensure(last_trading_time <= fixing_start, || {
            "last trading after fixing period start".into()
        })?;
        Ok(Self {
            name: name.into(),
            index,
            last_trading_time,
            fixing_start,
            fixing_end,
            fixing_accrual,
            notional,
            margin_accrual_factor,
        })
    }

    /// Contract code.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Underlying index.
    pub fn index(&self) -> &RateIndex {
        &self.index
    }

    /// Fixing period start.
    pub fn fixing_start(&self) -> f64 {
        self.fixing_start
    }

    /// Fixing period end.
    pub fn fixing_end(&self) -> f64 {
        self.fixing_end
    }

    /// Fixing period accrual factor.
    pub fn fixing_accrual(&self) -> f64 {
        self.fixing_accrual
    }
}

impl FuturesSecurity for InterestRateFutureSecurity {
    fn currency(&self) -> Currency {
        self.index.currency()
    }

    fn last_trading_time(&self) -> f64 {
        self.last_trading_time
    }

    fn notional(&self) -> f64 {
        self.notional
    }

    fn margin_accrual_factor(&self) -> f64 {
        self.margin_accrual_factor
    }
}

// ========================================
// Federal funds futures
// ========================================

/// Future on the average overnight rate over a month: price = 1 − rate,
/// `rate = (accrued + Σ δ_i F_i) / total accrual`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FederalFundsFutureSecurity {
    name: String,
    index: RateIndex,
    last_trading_time: f64,
    fixing_times: Vec<f64>,
    fixing_accruals: Vec<f64>,
    accrued_interest: f64,
    total_accrual: f64,
    notional: f64,
    margin_accrual_factor: f64,
}

impl FederalFundsFutureSecurity {
    /// Future with unfixed overnight periods `[fixing_times[i], fixing_times[i+1]]`.
    ///
    /// `accrued_interest` is `Σ δ_i r_i` over the periods already fixed.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        index: RateIndex,
        last_trading_time: f64,
        fixing_times: Vec<f64>,
        fixing_accruals: Vec<f64>,
        accrued_interest: f64,
        total_accrual: f64,
        notional: f64,
        margin_accrual_factor: f64,
    ) -> Result<Self, PricingError> {
        ensure_notional(notional)?;
        ensure_increasing("fixing times", &fixing_times)?;
        ensure(fixing_accruals.len() + 1 == fixing_times.len(), || {
            format!(
                "{} fixing times need {} accruals, got {}",
                fixing_times.len(),
                fixing_times.len() - 1,
                fixing_accruals.len()
            )
        })?;
        ensure(total_accrual > 0.0, || "total accrual must be positive".into())?;
        Ok(Self {
            name: name.into(),
            index,
            last_trading_time,
            fixing_times,
            fixing_accruals,
            accrued_interest,
            total_accrual,
            notional,
            margin_accrual_factor,
        })
    }

    /// Contract code.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Overnight index.
    pub fn index(&self) -> &RateIndex {
        &self.index
    }

    /// Boundaries of the unfixed overnight periods.
    pub fn fixing_times(&self) -> &[f64] {
        &self.fixing_times
    }

    /// Accrual factor of each unfixed period.
    pub fn fixing_accruals(&self) -> &[f64] {
        &self.fixing_accruals
    }

    /// Interest already fixed.
    pub fn accrued_interest(&self) -> f64 {
        self.accrued_interest
    }

    /// Accrual factor of the whole month.
    pub fn total_accrual(&self) -> f64 {
        self.total_accrual
    }
}

impl FuturesSecurity for FederalFundsFutureSecurity {
    fn currency(&self) -> Currency {
        self.index.currency()
    }

    fn last_trading_time(&self) -> f64 {
        self.last_trading_time
    }

    fn notional(&self) -> f64 {
        self.notional
    }

    fn margin_accrual_factor(&self) -> f64 {
        self.margin_accrual_factor
    }
}

// ========================================
// Bond futures
// ========================================

/// Bond future with a deliverable basket and conversion factors; the price
/// is set by the cheapest-to-deliver bond.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BondFuturesSecurity {
    name: String,
    currency: Currency,
    last_trading_time: f64,
    delivery_time: f64,
    deliverables: Vec<FixedCouponBond>,
    conversion_factors: Vec<f64>,
    notional: f64,
}

impl BondFuturesSecurity {
    /// Bond future; every deliverable must settle at `delivery_time`.
    pub fn new(
        name: impl Into<String>,
        last_trading_time: f64,
        delivery_time: f64,
        deliverables: Vec<FixedCouponBond>,
        conversion_factors: Vec<f64>,
        notional: f64,
    ) -> Result<Self, PricingError> {
        ensure_notional(notional)?;
        let currency = validate_basket(&deliverables, delivery_time)?;
        ensure(conversion_factors.len() == deliverables.len(), || {
            "one conversion factor per deliverable required".into()
        })?;
        ensure(conversion_factors.iter().all(|cf| *cf > 0.0), || {
            "conversion factors must be positive".into()
        })?;
        ensure(last_trading_time <= delivery_time, || {
            "last trading after delivery".into()
        })?;
        Ok(Self {
            name: name.into(),
            currency,
            last_trading_time,
            delivery_time,
            deliverables,
            conversion_factors,
            notional,
        })
    }

    /// Contract code.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Delivery (bond settlement) time.
    pub fn delivery_time(&self) -> f64 {
        self.delivery_time
    }

    /// Deliverable basket.
    pub fn deliverables(&self) -> &[FixedCouponBond] {
        &self.deliverables
    }

    /// Conversion factor of each deliverable.
    pub fn conversion_factors(&self) -> &[f64] {
        &self.conversion_factors
    }
}

impl FuturesSecurity for BondFuturesSecurity {
    fn currency(&self) -> Currency {
        self.currency
    }

    fn last_trading_time(&self) -> f64 {
        self.last_trading_time
    }

    fn notional(&self) -> f64 {
        self.notional
    }

    fn margin_accrual_factor(&self) -> f64 {
        1.0
    }
}

fn validate_basket(deliverables: &[FixedCouponBond], delivery_time: f64) -> Result<Currency, PricingError> {
    let first = deliverables
        .first()
        .ok_or_else(|| PricingError::InvalidInput("empty deliverable basket".into()))?;
    ensure(
        deliverables
            .iter()
            .all(|b| b.settlement_time() == delivery_time && b.currency() == first.currency()),
        || "deliverables must share currency and settle at delivery".into(),
    )?;
    Ok(first.currency())
}

// ========================================
// Yield-average bond futures
// ========================================

/// Bond future quoted as 1 − average yield of the basket; the margin is
/// computed on the dirty price of a synthetic bond at the quoted yield.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct YieldAverageBondFuturesSecurity {
    name: String,
    currency: Currency,
    last_trading_time: f64,
    delivery_time: f64,
    deliverables: Vec<FixedCouponBond>,
    coupon_rate: f64,
    tenor_years: u32,
    coupons_per_year: u32,
    notional: f64,
}

impl YieldAverageBondFuturesSecurity {
    /// Yield-average future on `deliverables`, synthetic bond of `tenor_years`
    /// paying `coupon_rate` `coupons_per_year` times a year.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        last_trading_time: f64,
        delivery_time: f64,
        deliverables: Vec<FixedCouponBond>,
        coupon_rate: f64,
        tenor_years: u32,
        coupons_per_year: u32,
        notional: f64,
    ) -> Result<Self, PricingError> {
        ensure_notional(notional)?;
        let currency = validate_basket(&deliverables, delivery_time)?;
        ensure(tenor_years > 0 && coupons_per_year > 0, || {
            "tenor and coupon frequency must be positive".into()
        })?;
        Ok(Self {
            name: name.into(),
            currency,
            last_trading_time,
            delivery_time,
            deliverables,
            coupon_rate,
            tenor_years,
            coupons_per_year,
            notional,
        })
    }

    /// Contract code.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Delivery time.
    pub fn delivery_time(&self) -> f64 {
        self.delivery_time
    }

    /// Deliverable basket.
    pub fn deliverables(&self) -> &[FixedCouponBond] {
        &self.deliverables
    }

    /// Synthetic bond coupon rate.
    pub fn coupon_rate(&self) -> f64 {
        self.coupon_rate
    }

    /// Synthetic bond tenor.
    pub fn tenor_years(&self) -> u32 {
        self.tenor_years
    }

    /// Synthetic bond coupon frequency.
    pub fn coupons_per_year(&self) -> u32 {
        self.coupons_per_year
    }

    /// Margin index and its derivative with respect to the quoted price.
    ///
    /// ```text
    /// index = notional · (Σ_{i=1..n} (c/m) v^i + v^n),  v = 1/(1 + y/m),  y = 1 - price
    /// ```
    pub fn margin_index_adjoint(&self, price: f64) -> (f64, f64) {
        let m = f64::from(self.coupons_per_year);
        let n = self.tenor_years * self.coupons_per_year;
        let y = 1.0 - price;
        let v = 1.0 / (1.0 + y / m);
        let coupon = self.coupon_rate / m;
        let mut value = 0.0;
        let mut d_v = 0.0;
        let mut vi = 1.0;
        for i in 1..=n {
            d_v += coupon * f64::from(i) * vi;
            vi *= v;
            value += coupon * vi;
        }
        value += vi;
        d_v += f64::from(n) * vi / v;
        // dv/dy = -v²/m and dy/dprice = -1
        let d_price = d_v * v * v / m;
        (self.notional * value, self.notional * d_price)
    }

    /// Margin index at `price`.
    pub fn margin_index(&self, price: f64) -> f64 {
        self.margin_index_adjoint(price).0
    }
}

impl FuturesSecurity for YieldAverageBondFuturesSecurity {
    fn currency(&self) -> Currency {
        self.currency
    }

    fn last_trading_time(&self) -> f64 {
        self.last_trading_time
    }

    fn notional(&self) -> f64 {
        self.notional
    }

    fn margin_accrual_factor(&self) -> f64 {
        1.0
    }

    fn margin_value_difference(&self, price: f64, reference_price: f64) -> f64 {
        self.margin_index(price) - self.margin_index(reference_price)
    }

    fn margin_value_derivative(&self, price: f64) -> f64 {
        self.margin_index_adjoint(price).1
    }
}

// ========================================
// Deliverable swap futures
// ========================================

/// Deliverable swap future: price = 1 + value of the underlying swap at delivery.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwapFuturesDeliverableSecurity {
    name: String,
    last_trading_time: f64,
    delivery_time: f64,
    underlying: FixedIborSwap,
    notional: f64,
}

impl SwapFuturesDeliverableSecurity {
    /// Future delivering `underlying` at `delivery_time`.
    pub fn new(
        name: impl Into<String>,
        last_trading_time: f64,
        delivery_time: f64,
        underlying: FixedIborSwap,
        notional: f64,
    ) -> Result<Self, PricingError> {
        ensure_notional(notional)?;
        ensure(last_trading_time <= delivery_time, || {
            "last trading after delivery".into()
        })?;
        ensure(underlying.start_time() >= delivery_time, || {
            format!(
                "swap starts at {} before delivery {}",
                underlying.start_time(),
                delivery_time
            )
        })?;
        Ok(Self {
            name: name.into(),
            last_trading_time,
            delivery_time,
            underlying,
            notional,
        })
    }

    /// Contract code.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Delivery time.
    pub fn delivery_time(&self) -> f64 {
        self.delivery_time
    }

    /// Underlying swap.
    pub fn underlying(&self) -> &FixedIborSwap {
        &self.underlying
    }
}

impl FuturesSecurity for SwapFuturesDeliverableSecurity {
    fn currency(&self) -> Currency {
        self.underlying.currency()
    }

    fn last_trading_time(&self) -> f64 {
        self.last_trading_time
    }

    fn notional(&self) -> f64 {
        self.notional
    }

    fn margin_accrual_factor(&self) -> f64 {
        1.0
    }
}

// ========================================
// Enum dispatch
// ========================================

/// Any supported futures contract.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FutureSecurity {
    /// STIR future
    InterestRate(InterestRateFutureSecurity),
    /// Fed funds future
    FederalFunds(FederalFundsFutureSecurity),
    /// Bond future (cheapest to deliver)
    Bond(BondFuturesSecurity),
    /// Yield-average bond future
    YieldAverageBond(YieldAverageBondFuturesSecurity),
    /// Deliverable swap future
    SwapDeliverable(SwapFuturesDeliverableSecurity),
}

macro_rules! dispatch {
    ($self:ident, $f:ident => $body:expr) => {
        match $self {
            FutureSecurity::InterestRate($f) => $body,
            FutureSecurity::FederalFunds($f) => $body,
            FutureSecurity::Bond($f) => $body,
            FutureSecurity::YieldAverageBond($f) => $body,
            FutureSecurity::SwapDeliverable($f) => $body,
        }
    };
}
pub(crate) use dispatch;

impl FuturesSecurity for FutureSecurity {
    fn currency(&self) -> Currency {
        dispatch!(self, f => f.currency())
    }

    fn last_trading_time(&self) -> f64 {
        dispatch!(self, f => f.last_trading_time())
    }

    fn notional(&self) -> f64 {
        dispatch!(self, f => f.notional())
    }

    fn margin_accrual_factor(&self) -> f64 {
        dispatch!(self, f => f.margin_accrual_factor())
    }

    fn margin_value_difference(&self, price: f64, reference_price: f64) -> f64 {
        dispatch!(self, f => f.margin_value_difference(price, reference_price))
    }

    fn margin_value_derivative(&self, price: f64) -> f64 {
        dispatch!(self, f => f.margin_value_derivative(price))
    }
}

macro_rules! impl_from {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for FutureSecurity {
            fn from(security: $ty) -> Self {
                FutureSecurity::$variant(security)
            }
        }
    };
}

impl_from!(InterestRate, InterestRateFutureSecurity);
impl_from!(FederalFunds, FederalFundsFutureSecurity);
impl_from!(Bond, BondFuturesSecurity);
impl_from!(YieldAverageBond, YieldAverageBondFuturesSecurity);
impl_from!(SwapDeliverable, SwapFuturesDeliverableSecurity);
