//! # futopt_risk (L4: Risk)
//!
//! Bucketed sensitivities and their finite-difference validation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            futopt_risk (L4)             │
//! ├─────────────────────────────────────────┤
//! │  curve/             - point → node →    │
//! │                       market quote      │
//! │  pv01/              - per-curve 1bp     │
//! │  finite_difference/ - bump & revalue    │
//! │  comparison/        - abs + rel bands   │
//! │  config/            - TOML settings     │
//! │  parallel/          - Rayon utilities   │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │          futopt_pricing (L3)            │
//! │  futures, options, transactions         │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use futopt_core::market_data::{InterpolatedCurve, MulticurveProvider};
//! use futopt_core::types::{Currency, RateIndex};
//! use futopt_models::volatility::FlatVolatility;
//! use futopt_pricing::instruments::{FuturesOptionMarginSecurity, InterestRateFutureSecurity};
//! use futopt_pricing::options::FuturesOptionPricing;
//! use futopt_pricing::providers::BlackFuturesProvider;
//! use futopt_risk::{
//!     compare_curve_sensitivities, CurveParameterSensitivityCalculator,
//!     FiniteDifferenceCurveCalculator, SensitivityConfig,
//! };
//!
//! let index = RateIndex::new("EUR-EURIBOR-3M", Currency::EUR);
//! let curve = InterpolatedCurve::linear(&[0.5, 1.0, 2.0, 5.0], &[0.010, 0.012, 0.015, 0.020]).unwrap();
//! let curves = MulticurveProvider::new()
//!     .with_discount_curve(Currency::EUR, "EUR-DSC", curve.clone())
//!     .with_forward_curve(index.clone(), "EUR-FWD3M", curve);
//! let provider = BlackFuturesProvider::new(curves, FlatVolatility::new(0.3).unwrap());
//!
//! let future = InterestRateFutureSecurity::new("ERZ6", index, 1.0, 1.0, 1.25, 0.25, 1_000_000.0, 0.25).unwrap();
//! let option = FuturesOptionMarginSecurity::new(future, 0.9, 0.985, true).unwrap();
//!
//! let config = SensitivityConfig::from_toml_str("relative_tolerance = 1e-4").unwrap();
//! let point = option.price_curve_sensitivity(&provider).unwrap();
//! let analytic = CurveParameterSensitivityCalculator::new()
//!     .calculate(&point, provider.curves())
//!     .unwrap();
//! let numerical = FiniteDifferenceCurveCalculator::from_config(&config)
//!     .unwrap()
//!     .calculate(&provider, |p| option.price(p))
//!     .unwrap();
//! let report = compare_curve_sensitivities(&analytic, &numerical, &config.tolerance()).unwrap();
//! assert!(report.passed(), "{}", report);
//! ```

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod comparison;
pub mod config;
pub mod curve;
pub mod error;
pub mod finite_difference;
pub mod parallel;
pub mod pv01;

pub use comparison::{
    compare_curve_sensitivities, compare_parameter_sensitivities, ComparisonReport, SensitivityKey,
    SensitivityMismatch, SensitivityTolerance,
};
pub use config::{ConfigError, LogLevel, SensitivityConfig};
pub use curve::{CurveParameterSensitivityCalculator, MarketQuoteSensitivityCalculator};
pub use error::SensitivityError;
pub use finite_difference::{
    CurveMarket, FiniteDifferenceCurveCalculator, FiniteDifferenceHullWhiteCalculator,
    FiniteDifferenceModelCalculator,
};
pub use parallel::ParallelConfig;
pub use pv01::{Pv01Calculator, BASIS_POINT};
