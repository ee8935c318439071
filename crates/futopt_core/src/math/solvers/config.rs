//! Solver configuration types.

use num_traits::Float;

/// Configuration for root-finding algorithms.
///
/// # Example
///
/// ```
/// use futopt_core::math::solvers::SolverConfig;
///
/// let config: SolverConfig<f64> = SolverConfig::default();
/// assert!(config.tolerance < 1e-8);
///
/// let tight = SolverConfig::new(1e-14, 200).unwrap();
/// assert_eq!(tight.max_iterations, 200);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig<T: Float> {
    /// The solver stops when `|f(x)| < tolerance` or the bracket is narrower than it.
    pub tolerance: T,

    /// Maximum number of iterations before giving up.
    pub max_iterations: usize,
}

impl<T: Float> Default for SolverConfig<T> {
    /// `tolerance` 1e-10, `max_iterations` 100.
    fn default() -> Self {
        Self {
            tolerance: T::from(1e-10).unwrap_or_else(T::epsilon),
            max_iterations: 100,
        }
    }
}

impl<T: Float> SolverConfig<T> {
    /// Create a validated configuration.
    ///
    /// Returns `None` when `tolerance <= 0` or `max_iterations == 0`.
    pub fn new(tolerance: T, max_iterations: usize) -> Option<Self> {
        if tolerance <= T::zero() || max_iterations == 0 {
            return None;
        }
        Some(Self {
            tolerance,
            max_iterations,
        })
    }
}
