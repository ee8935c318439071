//! Currencies and the identifiers used to look up curves.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// ISO 4217 currency.
///
/// # Examples
/// ```
/// use futopt_core::types::Currency;
///
/// assert_eq!(Currency::AUD.code(), "AUD");
/// assert_eq!(format!("{}", Currency::USD), "USD");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Currency {
    /// US Dollar
    USD,
    /// Euro
    EUR,
    /// British Pound
    GBP,
    /// Japanese Yen
    JPY,
    /// Australian Dollar
    AUD,
    /// Swiss Franc
    CHF,
}

impl Currency {
    /// Three-letter ISO code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::AUD => "AUD",
            Currency::CHF => "CHF",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A floating-rate index (Ibor or overnight) identified by name.
///
/// Forward rates are looked up by index, so two indices with the same
/// name and currency are the same index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RateIndex {
    name: String,
    currency: Currency,
}

impl RateIndex {
    /// Creates an index.
    pub fn new(name: impl Into<String>, currency: Currency) -> Self {
        Self {
            name: name.into(),
            currency,
        }
    }

    /// Index name, e.g. `USD-LIBOR-3M`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index currency.
    pub fn currency(&self) -> Currency {
        self.currency
    }
}

impl fmt::Display for RateIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Issuer (legal entity) of a bond, used to select the issuer curve.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IssuerId(String);

impl IssuerId {
    /// Creates an issuer identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Issuer name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssuerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
