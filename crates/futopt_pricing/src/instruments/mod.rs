//! Resolved instrument definitions.
//!
//! All times are year fractions from the valuation date. Definitions are
//! plain immutable values; pricing lives in [`crate::futures`],
//! [`crate::options`] and [`crate::transactions`].

mod bond;
mod futures;
mod options;
mod swap;
mod transactions;

pub use bond::FixedCouponBond;
pub use futures::{
    BondFuturesSecurity, FederalFundsFutureSecurity, FutureSecurity, FuturesSecurity,
    InterestRateFutureSecurity, SwapFuturesDeliverableSecurity, YieldAverageBondFuturesSecurity,
};
pub use options::{FuturesOption, FuturesOptionMarginSecurity, FuturesOptionPremiumSecurity};
pub(crate) use futures::dispatch as dispatch_future;
pub use swap::FixedIborSwap;
pub(crate) use swap::IborCoupon;
pub use transactions::{
    FuturesOptionMarginTransaction, FuturesOptionPremiumTransaction, FuturesTransaction, Payment,
};

use futopt_core::types::PricingError;

/// `InvalidInput` unless `cond` holds.
pub(crate) fn ensure(cond: bool, message: impl FnOnce() -> String) -> Result<(), PricingError> {
    if cond {
        Ok(())
    } else {
        Err(PricingError::InvalidInput(message()))
    }
}

/// Checks that `times` is non-empty and strictly increasing.
pub(crate) fn ensure_increasing(what: &str, times: &[f64]) -> Result<(), PricingError> {
    ensure(!times.is_empty(), || format!("{} must not be empty", what))?;
    ensure(
        times.iter().all(|t| t.is_finite()) && times.windows(2).all(|w| w[0] < w[1]),
        || format!("{} must be strictly increasing", what),
    )
}
