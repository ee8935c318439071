//! Brent's method root-finding solver.

use super::SolverConfig;
use crate::types::SolverError;
use num_traits::Float;
use tracing::{debug, warn};

/// Brent's method root finder.
///
/// Combines bisection, secant and inverse quadratic interpolation. Converges
/// for any continuous function given a bracket with a sign change.
///
/// # Example
///
/// ```
/// use futopt_core::math::solvers::{BrentSolver, SolverConfig};
///
/// let solver = BrentSolver::new(SolverConfig::default());
/// let f = |x: f64| x * x * x - x - 2.0;
/// let root = solver.find_root(f, 1.0, 2.0).unwrap();
/// assert!(f(root).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct BrentSolver<T: Float> {
    config: SolverConfig<T>,
}

impl<T: Float> BrentSolver<T> {
    /// Create a new Brent solver with the given configuration.
    pub fn new(config: SolverConfig<T>) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(SolverConfig::default())
    }

    /// Find a root of `f` in the bracket `[a, b]`.
    ///
    /// # Errors
    ///
    /// * `SolverError::NoBracket` - `f(a)` and `f(b)` have the same sign
    /// * `SolverError::NonFinite` - `f` returned NaN or infinity
    /// * `SolverError::MaxIterationsExceeded` - failed to converge
    pub fn find_root<F>(&self, f: F, a: T, b: T) -> Result<T, SolverError>
    where
        F: Fn(T) -> T,
    {
        let eval = |x: T| {
            let y = f(x);
            if y.is_finite() {
                Ok(y)
            } else {
                Err(SolverError::NonFinite {
                    x: x.to_f64().unwrap_or(f64::NAN),
                })
            }
        };

        let mut a = a;
        let mut b = b;
        let mut fa = eval(a)?;
        let mut fb = eval(b)?;
        if fa == T::zero() {
            return Ok(a);
        }
        if fb == T::zero() {
            return Ok(b);
        }
        if fa.signum() == fb.signum() {
            return Err(SolverError::NoBracket {
                a: a.to_f64().unwrap_or(f64::NAN),
                b: b.to_f64().unwrap_or(f64::NAN),
            });
        }

        let two = T::one() + T::one();
        let three = two + T::one();
        let half = T::one() / two;
        let tolerance = self.config.tolerance;

        let mut c = b;
        let mut fc = fb;
        let mut d = b - a;
        let mut e = d;

        for _iteration in 0..self.config.max_iterations {
            // c is kept on the opposite side of the root from b
            if fb.signum() == fc.signum() {
                c = a;
                fc = fa;
                d = b - a;
                e = d;
            }
            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }

            let tol1 = two * T::epsilon() * b.abs() + half * tolerance;
            let xm = half * (c - b);
            if xm.abs() <= tol1 || fb.abs() < tolerance {
                return Ok(b);
            }

            if e.abs() >= tol1 && fa.abs() > fb.abs() {
                let s = fb / fa;
                let mut p;
                let mut q;
                if a == c {
                    // secant
                    p = two * xm * s;
                    q = T::one() - s;
                } else {
                    // inverse quadratic interpolation
                    let qq = fa / fc;
                    let r = fb / fc;
                    p = s * (two * xm * qq * (qq - r) - (b - a) * (r - T::one()));
                    q = (qq - T::one()) * (r - T::one()) * (s - T::one());
                }
                if p > T::zero() {
                    q = -q;
                }
                p = p.abs();
                let min1 = three * xm * q - (tol1 * q).abs();
                let min2 = (e * q).abs();
                if two * p < min1.min(min2) {
                    e = d;
                    d = p / q;
                } else {
                    d = xm;
                    e = d;
                }
            } else {
                d = xm;
                e = d;
            }

            a = b;
            fa = fb;
            if d.abs() > tol1 {
                b = b + d;
            } else {
                b = b + if xm > T::zero() { tol1 } else { -tol1 };
            }
            fb = eval(b)?;
        }

        warn!(
            iterations = self.config.max_iterations,
            last = b.to_f64().unwrap_or(f64::NAN),
            residual = fb.to_f64().unwrap_or(f64::NAN),
            "Brent solver did not converge"
        );
        Err(SolverError::MaxIterationsExceeded {
            iterations: self.config.max_iterations,
        })
    }

    /// Returns a reference to the solver configuration.
    pub fn config(&self) -> &SolverConfig<T> {
        &self.config
    }
}

/// Expands `[a, b]` geometrically until `f` changes sign over it.
///
/// Returns the bracketing interval or `SolverError::NoBracket` after
/// `max_expansions` attempts.
pub fn bracket_root<T, F>(f: &F, a: T, b: T, max_expansions: usize) -> Result<(T, T), SolverError>
where
    T: Float,
    F: Fn(T) -> T,
{
    let factor = T::from(1.6).unwrap_or_else(|| T::one() + T::one());
    let (mut a, mut b) = if a < b { (a, b) } else { (b, a) };
    let mut fa = f(a);
    let mut fb = f(b);
    for _ in 0..max_expansions {
        if fa.is_finite() && fb.is_finite() && fa.signum() != fb.signum() {
            return Ok((a, b));
        }
        if fa == T::zero() || fb == T::zero() {
            return Ok((a, b));
        }
        if fa.abs() < fb.abs() {
            a = a + factor * (a - b);
            fa = f(a);
        } else {
            b = b + factor * (b - a);
            fb = f(b);
        }
    }
    debug!(
        a = a.to_f64().unwrap_or(f64::NAN),
        b = b.to_f64().unwrap_or(f64::NAN),
        max_expansions,
        "no sign change found while bracketing"
    );
    Err(SolverError::NoBracket {
        a: a.to_f64().unwrap_or(f64::NAN),
        b: b.to_f64().unwrap_or(f64::NAN),
    })
}
