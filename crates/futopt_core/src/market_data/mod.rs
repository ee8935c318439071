//! Market data: yield curves and the multicurve provider.
//!
//! Pricing methods never build curves; they query a [`CurveProvider`]
//! for discount factors by currency or issuer and forward rates by index.
//! [`MulticurveProvider`] is the immutable snapshot implementation; every
//! bump returns a new provider.

pub mod curves;
pub mod error;
pub mod provider;

pub use curves::{Compounding, CurveInterpolation, InterpolatedCurve, YieldCurve};
pub use error::MarketDataError;
pub use provider::{CurveJacobian, CurveProvider, MulticurveProvider};
