//! Options on futures.

use super::{ensure, FuturesSecurity};
use crate::futures::FuturesPricing;
use futopt_core::types::PricingError;

/// European option on a futures contract.
///
/// The option expires at [`Self::expiry`]; the underlying future keeps
/// trading until its own last trading time, which may be later.
pub trait FuturesOption {
    /// Underlying futures contract type.
    type Underlying: FuturesPricing;

    /// Underlying future.
    fn underlying(&self) -> &Self::Underlying;

    /// Option expiry time.
    fn expiry(&self) -> f64;

    /// Strike, in futures price units.
    fn strike(&self) -> f64;

    /// `true` for a call.
    fn is_call(&self) -> bool;

    /// Time between option expiry and the underlying's last trading time.
    fn delay(&self) -> f64 {
        self.underlying().last_trading_time() - self.expiry()
    }
}

fn validate<U: FuturesPricing>(underlying: &U, expiry: f64, strike: f64) -> Result<(), PricingError> {
    ensure(expiry.is_finite() && expiry > 0.0, || {
        format!("option expiry must be positive, got {}", expiry)
    })?;
    ensure(strike.is_finite() && strike > 0.0, || {
        format!("option strike must be positive, got {}", strike)
    })?;
    ensure(expiry <= underlying.last_trading_time(), || {
        format!(
            "option expiry {} after underlying last trading time {}",
            expiry,
            underlying.last_trading_time()
        )
    })
}

macro_rules! futures_option_security {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name<U> {
            underlying: U,
            expiry: f64,
            strike: f64,
            is_call: bool,
        }

        impl<U: FuturesPricing> $name<U> {
            /// Option on `underlying`; expiry and strike must be positive and
            /// expiry cannot follow the underlying's last trading time.
            pub fn new(underlying: U, expiry: f64, strike: f64, is_call: bool) -> Result<Self, PricingError> {
                validate(&underlying, expiry, strike)?;
                Ok(Self {
                    underlying,
                    expiry,
                    strike,
                    is_call,
                })
            }

            /// Same option with a different strike.
            pub fn with_strike(&self, strike: f64) -> Result<Self, PricingError>
            where
                U: Clone,
            {
                Self::new(self.underlying.clone(), self.expiry, strike, self.is_call)
            }

            /// Opposite option type, same terms.
            pub fn with_opposite_type(&self) -> Self
            where
                U: Clone,
            {
                Self {
                    underlying: self.underlying.clone(),
                    expiry: self.expiry,
                    strike: self.strike,
                    is_call: !self.is_call,
                }
            }
        }

        impl<U: FuturesPricing> FuturesOption for $name<U> {
            type Underlying = U;

            fn underlying(&self) -> &U {
                &self.underlying
            }

            fn expiry(&self) -> f64 {
                self.expiry
            }

            fn strike(&self) -> f64 {
                self.strike
            }

            fn is_call(&self) -> bool {
                self.is_call
            }
        }
    };
}

futures_option_security!(
    /// Option with daily margining: no premium is paid and the option value
    /// is not discounted.
    FuturesOptionMarginSecurity
);

futures_option_security!(
    /// Option with an upfront premium: the value is discounted from expiry.
    FuturesOptionPremiumSecurity
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments::InterestRateFutureSecurity;
    use futopt_core::types::{Currency, RateIndex};

    fn future() -> InterestRateFutureSecurity {
        let index = RateIndex::new("EURIBOR3M", Currency::EUR);
        InterestRateFutureSecurity::new("ERZ6", index, 0.75, 0.75, 1.0, 0.25, 1_000_000.0, 0.25).unwrap()
    }

    #[test]
    fn test_delay() {
        let option = FuturesOptionMarginSecurity::new(future(), 0.5, 0.99, true).unwrap();
        assert!((option.delay() - 0.25).abs() < 1e-15);
        let put = option.with_opposite_type();
        assert!(!put.is_call());
        assert_eq!(put.strike(), option.strike());
    }

    #[test]
    fn test_rejects_invalid_terms() {
        assert!(FuturesOptionPremiumSecurity::new(future(), 0.0, 0.99, true).is_err());
        assert!(FuturesOptionPremiumSecurity::new(future(), 0.5, -0.99, true).is_err());
        assert!(FuturesOptionPremiumSecurity::new(future(), 1.0, 0.99, true).is_err());
        let option = FuturesOptionPremiumSecurity::new(future(), 0.5, 0.99, false).unwrap();
        assert!(option.with_strike(0.0).is_err());
    }
}
