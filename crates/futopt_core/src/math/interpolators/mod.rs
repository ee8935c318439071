//! Interpolation methods with node sensitivities.
//!
//! Every interpolator here is linear in its node values, so the derivative of
//! an interpolated value with respect to the nodes is the vector of
//! interpolation weights. Curves and volatility surfaces use those weights to
//! turn point sensitivities into bucketed (per-node) sensitivities.
//!
//! ## Available Interpolators
//!
//! - [`LinearInterpolator`]: piecewise linear in one dimension, optional flat extrapolation
//! - [`BilinearInterpolator`]: 2D grid interpolation for surfaces, flat extrapolation
//!
//! ## Example
//!
//! ```
//! use futopt_core::math::interpolators::{Interpolator, LinearInterpolator};
//!
//! let interp = LinearInterpolator::new(&[0.0_f64, 1.0, 2.0], &[0.0, 1.0, 4.0]).unwrap();
//! let y = interp.interpolate(1.5).unwrap();
//! assert!((y - 2.5).abs() < 1e-12);
//!
//! let weights = interp.node_sensitivity(1.5).unwrap();
//! assert_eq!(weights, vec![0.0, 0.5, 0.5]);
//! ```

mod bilinear;
mod linear;

pub use bilinear::BilinearInterpolator;
pub use linear::{Extrapolation, LinearInterpolator};

use crate::types::InterpolationError;
use num_traits::Float;

/// Common interface of one-dimensional interpolators.
pub trait Interpolator<T: Float> {
    /// Interpolated value at `x`.
    fn interpolate(&self, x: T) -> Result<T, InterpolationError>;

    /// Valid domain `(x_min, x_max)`; extrapolating interpolators accept any `x`.
    fn domain(&self) -> (T, T);
}

/// Position of a query point on a sorted axis.
///
/// The interpolated value is `(1 - weight) * v[lower] + weight * v[upper]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Bracket<T> {
    pub lower: usize,
    pub upper: usize,
    pub weight: T,
}

/// Locates `x` on `axis` (sorted, non-empty), clamping outside the range.
pub(crate) fn locate_clamped<T: Float>(axis: &[T], x: T) -> Bracket<T> {
    let n = axis.len();
    if n == 1 || x <= axis[0] {
        return Bracket {
            lower: 0,
            upper: 0,
            weight: T::zero(),
        };
    }
    if x >= axis[n - 1] {
        return Bracket {
            lower: n - 1,
            upper: n - 1,
            weight: T::zero(),
        };
    }
    let pos = axis.partition_point(|&xi| xi <= x);
    let i = pos - 1;
    Bracket {
        lower: i,
        upper: i + 1,
        weight: (x - axis[i]) / (axis[i + 1] - axis[i]),
    }
}

/// Sorts `(x, y)` pairs by `x` and rejects repeated abscissae.
pub(crate) fn sorted_pairs<T: Float>(
    xs: &[T],
    ys: &[T],
) -> Result<(Vec<T>, Vec<T>), InterpolationError> {
    if xs.len() != ys.len() {
        return Err(InterpolationError::InvalidInput(format!(
            "xs and ys must have same length: got {} and {}",
            xs.len(),
            ys.len()
        )));
    }
    let mut pairs: Vec<(T, T)> = xs.iter().copied().zip(ys.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    for w in pairs.windows(2) {
        if w[0].0 >= w[1].0 {
            return Err(InterpolationError::DuplicateAbscissa {
                x: w[1].0.to_f64().unwrap_or(f64::NAN),
            });
        }
    }
    Ok(pairs.into_iter().unzip())
}
