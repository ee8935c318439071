//! # futopt_core: Foundation for futures and futures-option pricing
//!
//! ## Layer 1 (Foundation) Role
//!
//! futopt_core is the bottom layer of the 4-layer architecture, providing:
//! - Error types: `PricingError`, `InterpolationError`, `SolverError` (`types::error`)
//! - Identifiers: `Currency`, `RateIndex`, `IssuerId` (`types`)
//! - Gaussian distribution, interpolators with node weights, Brent solver and the
//!   finite-difference differentiator (`math`)
//! - Yield curves and the multicurve provider consumed by every pricing method (`market_data`)
//! - Point and bucketed sensitivity containers (`sensitivity`)
//!
//! ## Minimal Dependencies
//!
//! Layer 1 has no dependencies on other futopt_* crates:
//! - num-traits: generic numerical code for interpolators and solvers
//! - num-dual: dual numbers for verifying hand-written adjoints (optional)
//! - statrs: `erfc` behind the Gaussian CDF
//! - thiserror / tracing: errors and diagnostics
//!
//! ## Usage Examples
//!
//! ```rust
//! use futopt_core::market_data::{CurveProvider, InterpolatedCurve, MulticurveProvider};
//! use futopt_core::types::{Currency, RateIndex};
//!
//! let curve = InterpolatedCurve::linear(&[0.5, 1.0, 5.0], &[0.01, 0.012, 0.02]).unwrap();
//! let index = RateIndex::new("USD-LIBOR-3M", Currency::USD);
//! let provider = MulticurveProvider::new()
//!     .with_discount_curve(Currency::USD, "USD-DSC", curve.clone())
//!     .with_forward_curve(index.clone(), "USD-FWD3M", curve);
//!
//! let df = provider.discount_factor(Currency::USD, 1.0).unwrap();
//! assert!((df - (-0.012_f64).exp()).abs() < 1e-14);
//!
//! let fwd = provider.forward_rate(&index, 0.5, 0.75, 0.25).unwrap();
//! assert!(fwd > 0.0);
//! ```
//!
//! ## Feature Flags
//!
//! - `num-dual-mode` (default): dual numbers available for adjoint verification
//! - `serde`: serialisation of identifiers and sensitivity containers

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod market_data;
pub mod math;
pub mod sensitivity;
pub mod types;
