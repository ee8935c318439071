//! # futopt_models: Option kernels and volatility models
//!
//! ## Layer 2 Role
//!
//! - [`analytical`]: Black-76 and normal (Bachelier) prices with first and
//!   second order adjoint derivatives and implied volatility
//! - [`volatility`]: the volatility model family behind the
//!   [`volatility::VolatilityModel`] capability trait: flat, three Black
//!   surfaces, SABR, SSVI and a normal simple-moneyness surface
//! - [`rates`]: Hull-White one-factor parameters and the futures convexity factor
//!
//! Models know nothing about instruments. A pricing method asks a model for
//! the volatility at `(expiry, delay, strike, forward)` and feeds it to the
//! kernel the model's volatility type names; sensitivities flow back through
//! each model's adjoint.
//!
//! ```
//! use futopt_models::analytical::{black_price_adjoint, BlackFunctionData, EuropeanOption};
//! use futopt_models::volatility::{SsviVolatility, VolatilityModel, VolatilityQuery};
//!
//! let ssvi = SsviVolatility::new(&[0.0, 0.5, 1.0, 5.0], &[0.01, 0.011, 0.012, 0.01], 0.25, 0.5).unwrap();
//! let query = VolatilityQuery::new(0.75, 0.25, 0.985, 0.9875);
//! let vol = ssvi.volatility(&query).unwrap();
//!
//! let option = EuropeanOption::new(0.985, 0.75, true);
//! let data = BlackFunctionData::new(0.9875, 1.0, vol);
//! let adjoint = black_price_adjoint(&option, &data).unwrap();
//! assert!(adjoint.price > 0.0025);
//! assert!(adjoint.d_forward > 0.5);
//! ```

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod analytical;
pub mod error;
pub mod rates;
pub mod volatility;

pub use error::ModelError;
