//! Root-finding for yields and implied volatilities.
//!
//! - [`BrentSolver`]: robust bracketing method without derivative requirement
//! - [`bracket_root`]: widens an initial interval until the function changes sign
//!
//! ```
//! use futopt_core::math::solvers::{bracket_root, BrentSolver, SolverConfig};
//!
//! let f = |x: f64| x * x - 9.0;
//! let (a, b) = bracket_root(&f, 0.0, 1.0, 50).unwrap();
//! let root = BrentSolver::new(SolverConfig::default()).find_root(f, a, b).unwrap();
//! assert!((root - 3.0).abs() < 1e-10);
//! ```

mod brent;
mod config;

pub use brent::{bracket_root, BrentSolver};
pub use config::SolverConfig;
