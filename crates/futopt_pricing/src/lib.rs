//! # futopt_pricing: Futures and futures-option pricing methods
//!
//! ## Layer 3 Role
//!
//! futopt_pricing turns instrument definitions and market data into prices
//! and exact first-order sensitivities:
//! - [`instruments`]: resolved definitions of bonds, swaps, five futures
//!   contracts, options on them and traded positions
//! - [`futures`]: futures prices by discounting, plus the Hull-White
//!   convexity-adjusted price of deliverable swap futures
//! - [`options`]: Black pricing of margined and premium options under any
//!   [`VolatilityModel`](futopt_models::volatility::VolatilityModel), with
//!   curve, volatility-point and model-parameter sensitivities
//! - [`transactions`]: position present values
//! - [`calculators`]: enum dispatch over every position type
//!
//! ## Usage Example
//!
//! ```rust
//! use futopt_core::market_data::{InterpolatedCurve, MulticurveProvider};
//! use futopt_core::types::{Currency, RateIndex};
//! use futopt_models::volatility::SsviVolatility;
//! use futopt_pricing::instruments::{FuturesOptionPremiumSecurity, InterestRateFutureSecurity};
//! use futopt_pricing::options::FuturesOptionPricing;
//! use futopt_pricing::providers::BlackFuturesProvider;
//!
//! let index = RateIndex::new("USD-LIBOR-3M", Currency::USD);
//! let curve = InterpolatedCurve::linear(&[0.25, 1.0, 5.0], &[0.004, 0.006, 0.015]).unwrap();
//! let curves = MulticurveProvider::new()
//!     .with_discount_curve(Currency::USD, "USD-DSC", curve.clone())
//!     .with_forward_curve(index.clone(), "USD-FWD3M", curve);
//! let ssvi = SsviVolatility::new(&[0.0, 0.5, 1.0, 5.0], &[0.01, 0.011, 0.012, 0.01], 0.25, 0.5).unwrap();
//! let provider = BlackFuturesProvider::new(curves, ssvi);
//!
//! let future = InterestRateFutureSecurity::new("EDZ6", index, 1.0, 1.0, 1.25, 0.25, 1_000_000.0, 0.25).unwrap();
//! let option = FuturesOptionPremiumSecurity::new(future, 0.75, 0.99, true).unwrap();
//!
//! let price = option.price(&provider).unwrap();
//! let ssvi_risk = option.price_ssvi_sensitivity(&provider).unwrap();
//! assert!(price > 0.0);
//! assert_eq!(ssvi_risk.atm_volatility.len(), 4);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: serialisation of instrument definitions and positions

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod calculators;
pub mod futures;
pub mod instruments;
pub mod options;
pub mod providers;
pub mod transactions;
