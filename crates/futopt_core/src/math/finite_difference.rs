//! Finite-difference differentiation of pure evaluators.
//!
//! The differentiator is a plain value (`shift`, `scheme`) and its methods
//! are higher-order functions: they take an evaluator and return numerical
//! derivatives. Evaluators are expected to be side-effect free; bumped
//! market data is built as new instances inside the closure.
//!
//! ```
//! use futopt_core::math::{FiniteDifferenceDifferentiator, FiniteDifferenceType};
//! use std::convert::Infallible;
//!
//! let fd = FiniteDifferenceDifferentiator::new(1e-6, FiniteDifferenceType::Central).unwrap();
//! let grad = fd.gradient_fn(|x: &[f64]| Ok::<_, Infallible>(x[0] * x[0] + 3.0 * x[1]));
//! let g = grad(&[2.0, 5.0]).unwrap();
//! assert!((g[0] - 4.0).abs() < 1e-6);
//! assert!((g[1] - 3.0).abs() < 1e-6);
//! ```

use crate::types::PricingError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default relative bump size.
pub const DEFAULT_SHIFT: f64 = 1e-6;

/// Finite-difference scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FiniteDifferenceType {
    /// `(f(x + h) - f(x)) / h`
    Forward,
    /// `(f(x + h) - f(x - h)) / 2h`
    #[default]
    Central,
    /// `(f(x) - f(x - h)) / h`
    Backward,
}

impl FiniteDifferenceType {
    /// Number of evaluations per derivative, excluding a shared base value.
    pub fn evaluations(&self) -> usize {
        match self {
            FiniteDifferenceType::Central => 2,
            FiniteDifferenceType::Forward | FiniteDifferenceType::Backward => 1,
        }
    }
}

/// Numerical differentiator with a fixed shift and scheme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiniteDifferenceDifferentiator {
    shift: f64,
    scheme: FiniteDifferenceType,
}

impl Default for FiniteDifferenceDifferentiator {
    fn default() -> Self {
        Self {
            shift: DEFAULT_SHIFT,
            scheme: FiniteDifferenceType::Central,
        }
    }
}

impl FiniteDifferenceDifferentiator {
    /// Creates a differentiator; the shift must be positive and finite.
    pub fn new(shift: f64, scheme: FiniteDifferenceType) -> Result<Self, PricingError> {
        if !(shift.is_finite() && shift > 0.0) {
            return Err(PricingError::InvalidInput(format!(
                "finite-difference shift must be positive, got {}",
                shift
            )));
        }
        Ok(Self { shift, scheme })
    }

    /// Bump size.
    pub fn shift(&self) -> f64 {
        self.shift
    }

    /// Difference scheme.
    pub fn scheme(&self) -> FiniteDifferenceType {
        self.scheme
    }

    /// Derivative of a scalar function at `x`.
    pub fn derivative<F, E>(&self, f: F, x: f64) -> Result<f64, E>
    where
        F: Fn(f64) -> Result<f64, E>,
    {
        let h = self.shift;
        match self.scheme {
            FiniteDifferenceType::Central => Ok((f(x + h)? - f(x - h)?) / (2.0 * h)),
            FiniteDifferenceType::Forward => Ok((f(x + h)? - f(x)?) / h),
            FiniteDifferenceType::Backward => Ok((f(x)? - f(x - h)?) / h),
        }
    }

    /// Derivative of a function of a bump size, evaluated at zero bump.
    ///
    /// `bumped(s)` returns the value with the input moved by `s`; this is
    /// the form used with bumped market-data snapshots.
    pub fn derivative_at_zero<F, E>(&self, bumped: F) -> Result<f64, E>
    where
        F: Fn(f64) -> Result<f64, E>,
    {
        self.derivative(bumped, 0.0)
    }

    /// Gradient of a multivariate function at `x`, one coordinate at a time.
    pub fn gradient<F, E>(&self, f: &F, x: &[f64]) -> Result<Vec<f64>, E>
    where
        F: Fn(&[f64]) -> Result<f64, E>,
    {
        let base = match self.scheme {
            FiniteDifferenceType::Central => None,
            _ => Some(f(x)?),
        };
        let mut point = x.to_vec();
        let mut grad = Vec::with_capacity(x.len());
        for i in 0..x.len() {
            let mut at = |s: f64| -> Result<f64, E> {
                point[i] = x[i] + s;
                let value = f(&point);
                point[i] = x[i];
                value
            };
            let h = self.shift;
            let d = match (self.scheme, base) {
                (FiniteDifferenceType::Forward, Some(b)) => (at(h)? - b) / h,
                (FiniteDifferenceType::Backward, Some(b)) => (b - at(-h)?) / h,
                _ => (at(h)? - at(-h)?) / (2.0 * h),
            };
            grad.push(d);
        }
        Ok(grad)
    }

    /// Turns an evaluator into its numerical gradient function.
    pub fn gradient_fn<F, E>(self, f: F) -> impl Fn(&[f64]) -> Result<Vec<f64>, E>
    where
        F: Fn(&[f64]) -> Result<f64, E>,
    {
        move |x: &[f64]| self.gradient(&f, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::convert::Infallible;

    fn ok(x: f64) -> Result<f64, Infallible> {
        Ok(x.exp())
    }

    #[test]
    fn test_new_rejects_bad_shift() {
        assert!(FiniteDifferenceDifferentiator::new(0.0, FiniteDifferenceType::Central).is_err());
        assert!(
            FiniteDifferenceDifferentiator::new(f64::NAN, FiniteDifferenceType::Forward).is_err()
        );
    }

    #[test]
    fn test_schemes_on_exponential() {
        for scheme in [
            FiniteDifferenceType::Central,
            FiniteDifferenceType::Forward,
            FiniteDifferenceType::Backward,
        ] {
            let fd = FiniteDifferenceDifferentiator::new(1e-6, scheme).unwrap();
            let d = fd.derivative(ok, 1.0).unwrap();
            assert_relative_eq!(d, 1.0_f64.exp(), max_relative = 1e-5);
        }
    }

    #[test]
    fn test_central_is_second_order() {
        let fd = FiniteDifferenceDifferentiator::new(1e-3, FiniteDifferenceType::Central).unwrap();
        let d = fd.derivative(ok, 0.5).unwrap();
        assert_relative_eq!(d, 0.5_f64.exp(), max_relative = 1e-6);
    }

    #[test]
    fn test_gradient_restores_point() {
        let fd = FiniteDifferenceDifferentiator::default();
        let f = |x: &[f64]| Ok::<_, Infallible>(x[0] * x[1] + x[2].sin());
        let g = fd.gradient(&f, &[2.0, 3.0, 0.0]).unwrap();
        assert_relative_eq!(g[0], 3.0, epsilon = 1e-8);
        assert_relative_eq!(g[1], 2.0, epsilon = 1e-8);
        assert_relative_eq!(g[2], 1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_errors_propagate() {
        let fd = FiniteDifferenceDifferentiator::default();
        let f = |_: f64| Err::<f64, &str>("boom");
        assert_eq!(fd.derivative(f, 0.0), Err("boom"));
    }

    #[test]
    fn test_evaluation_counts() {
        assert_eq!(FiniteDifferenceType::Central.evaluations(), 2);
        assert_eq!(FiniteDifferenceType::Forward.evaluations(), 1);
    }
}
