//! Core types: errors and market identifiers.

pub mod currency;
#[cfg(feature = "num-dual-mode")]
pub mod dual;
pub mod error;

pub use currency::{Currency, IssuerId, RateIndex};
pub use error::{InterpolationError, PricingError, SolverError};
