//! Traded positions in futures and futures options.

use super::{FuturesOption, FuturesOptionMarginSecurity, FuturesOptionPremiumSecurity, FuturesSecurity};
use crate::futures::FuturesPricing;
use futopt_core::types::{Currency, PricingError};

/// Fixed payment, signed from the holder's point of view.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Payment {
    /// Payment currency
    pub currency: Currency,
    /// Payment time
    pub time: f64,
    /// Amount; negative when paid
    pub amount: f64,
}

impl Payment {
    /// Payment of `amount` in `currency` at `time`.
    pub fn new(currency: Currency, time: f64, amount: f64) -> Self {
        Self {
            currency,
            time,
            amount,
        }
    }
}

/// Position in a margined futures contract, marked against `reference_price`
/// (the last margin price or the trade price on trade date).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FuturesTransaction<S> {
    security: S,
    quantity: i64,
    reference_price: f64,
}

impl<S: FuturesSecurity> FuturesTransaction<S> {
    /// `quantity` contracts of `security`; negative for a short position.
    pub fn new(security: S, quantity: i64, reference_price: f64) -> Self {
        Self {
            security,
            quantity,
            reference_price,
        }
    }

    /// Traded contract.
    pub fn security(&self) -> &S {
        &self.security
    }

    /// Signed number of contracts.
    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// Margin reference price.
    pub fn reference_price(&self) -> f64 {
        self.reference_price
    }
}

/// Position in a margined futures option.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FuturesOptionMarginTransaction<U> {
    security: FuturesOptionMarginSecurity<U>,
    quantity: i64,
    reference_price: f64,
}

impl<U: FuturesPricing> FuturesOptionMarginTransaction<U> {
    /// `quantity` options marked against `reference_price`.
    pub fn new(security: FuturesOptionMarginSecurity<U>, quantity: i64, reference_price: f64) -> Self {
        Self {
            security,
            quantity,
            reference_price,
        }
    }

    /// Traded option.
    pub fn security(&self) -> &FuturesOptionMarginSecurity<U> {
        &self.security
    }

    /// Signed number of options.
    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// Margin reference price.
    pub fn reference_price(&self) -> f64 {
        self.reference_price
    }
}

/// Position in a premium-paying futures option.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FuturesOptionPremiumTransaction<U> {
    security: FuturesOptionPremiumSecurity<U>,
    quantity: i64,
    premium: Payment,
}

impl<U: FuturesPricing> FuturesOptionPremiumTransaction<U> {
    /// `quantity` options with `premium` exchanged; the premium must be in
    /// the option's currency.
    pub fn new(
        security: FuturesOptionPremiumSecurity<U>,
        quantity: i64,
        premium: Payment,
    ) -> Result<Self, PricingError> {
        let currency = security.underlying().currency();
        if premium.currency != currency {
            return Err(PricingError::InvalidInput(format!(
                "premium in {} for an option settled in {}",
                premium.currency, currency
            )));
        }
        Ok(Self {
            security,
            quantity,
            premium,
        })
    }

    /// Traded option.
    pub fn security(&self) -> &FuturesOptionPremiumSecurity<U> {
        &self.security
    }

    /// Signed number of options.
    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// Premium payment.
    pub fn premium(&self) -> &Payment {
        &self.premium
    }
}
