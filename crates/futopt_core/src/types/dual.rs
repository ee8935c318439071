//! Dual numbers for verifying hand-written adjoints.
//!
//! Pricing code propagates derivatives by hand (adjoint mode). Tests check
//! those derivatives against forward-mode dual numbers evaluated through
//! the same formulas.
//!
//! ```
//! use futopt_core::types::dual::{norm_cdf_dual, DualNumber};
//!
//! let x = DualNumber::new(0.3, 1.0);
//! let n = norm_cdf_dual(x);
//! assert!((n.eps - futopt_core::math::norm_pdf(0.3)).abs() < 1e-15);
//! ```

use crate::math::{norm_cdf, norm_pdf};

/// f64-based dual number: `re` is the value, `eps` the derivative.
pub type DualNumber = num_dual::Dual64;

/// Gaussian CDF lifted to dual numbers.
pub fn norm_cdf_dual(x: DualNumber) -> DualNumber {
    DualNumber::new(norm_cdf(x.re), x.eps * norm_pdf(x.re))
}

/// Value and derivative of `f` at `x` by forward-mode differentiation.
pub fn value_and_derivative<F>(f: F, x: f64) -> (f64, f64)
where
    F: Fn(DualNumber) -> DualNumber,
{
    let y = f(DualNumber::new(x, 1.0));
    (y.re, y.eps)
}
