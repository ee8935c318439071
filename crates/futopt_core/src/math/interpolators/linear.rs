//! Linear interpolation implementation.

use super::{locate_clamped, sorted_pairs, Interpolator};
use crate::types::InterpolationError;
use num_traits::Float;

/// Behaviour outside the node range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extrapolation {
    /// Queries outside `[x_min, x_max]` are errors.
    None,
    /// Queries outside the range return the nearest end value.
    Flat,
}

/// Piecewise linear interpolator.
///
/// Stores sorted (x, y) data points and interpolates linearly between
/// adjacent points. The node weights at a query point are exposed through
/// [`LinearInterpolator::node_sensitivity`].
///
/// # Example
///
/// ```
/// use futopt_core::math::interpolators::{Interpolator, LinearInterpolator};
///
/// let interp = LinearInterpolator::with_flat_extrapolation(&[1.0, 2.0], &[10.0, 20.0]).unwrap();
/// assert_eq!(interp.interpolate(0.0).unwrap(), 10.0);
/// assert_eq!(interp.interpolate(3.0).unwrap(), 20.0);
/// ```
#[derive(Debug, Clone)]
pub struct LinearInterpolator<T: Float> {
    xs: Vec<T>,
    ys: Vec<T>,
    extrapolation: Extrapolation,
}

impl<T: Float> LinearInterpolator<T> {
    /// Construct an interpolator that rejects queries outside its domain.
    ///
    /// Data points are sorted by x. Requires at least 2 points.
    pub fn new(xs: &[T], ys: &[T]) -> Result<Self, InterpolationError> {
        if xs.len() < 2 {
            return Err(InterpolationError::InsufficientData {
                got: xs.len(),
                need: 2,
            });
        }
        let (xs, ys) = sorted_pairs(xs, ys)?;
        Ok(Self {
            xs,
            ys,
            extrapolation: Extrapolation::None,
        })
    }

    /// Construct an interpolator with flat extrapolation on both sides.
    ///
    /// A single point is accepted and yields a constant function.
    pub fn with_flat_extrapolation(xs: &[T], ys: &[T]) -> Result<Self, InterpolationError> {
        if xs.is_empty() {
            return Err(InterpolationError::InsufficientData { got: 0, need: 1 });
        }
        let (xs, ys) = sorted_pairs(xs, ys)?;
        Ok(Self {
            xs,
            ys,
            extrapolation: Extrapolation::Flat,
        })
    }

    /// Sorted x-coordinates.
    #[inline]
    pub fn xs(&self) -> &[T] {
        &self.xs
    }

    /// Y-values in sorted x order.
    #[inline]
    pub fn ys(&self) -> &[T] {
        &self.ys
    }

    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Always false for a constructed interpolator.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Extrapolation mode.
    pub fn extrapolation(&self) -> Extrapolation {
        self.extrapolation
    }

    fn check_domain(&self, x: T) -> Result<(), InterpolationError> {
        let (x_min, x_max) = (self.xs[0], self.xs[self.xs.len() - 1]);
        if self.extrapolation == Extrapolation::None && (x < x_min || x > x_max) {
            return Err(InterpolationError::OutOfBounds {
                x: x.to_f64().unwrap_or(f64::NAN),
                min: x_min.to_f64().unwrap_or(f64::NAN),
                max: x_max.to_f64().unwrap_or(f64::NAN),
            });
        }
        Ok(())
    }

    /// Derivative of the interpolated value with respect to each node value.
    ///
    /// At most two entries are non-zero and they sum to one.
    pub fn node_sensitivity(&self, x: T) -> Result<Vec<T>, InterpolationError> {
        self.check_domain(x)?;
        let b = locate_clamped(&self.xs, x);
        let mut weights = vec![T::zero(); self.xs.len()];
        weights[b.lower] = weights[b.lower] + (T::one() - b.weight);
        weights[b.upper] = weights[b.upper] + b.weight;
        Ok(weights)
    }

    /// Slope `dy/dx` at `x` (right derivative at nodes, zero where extrapolating flat).
    pub fn derivative(&self, x: T) -> Result<T, InterpolationError> {
        self.check_domain(x)?;
        let n = self.xs.len();
        if n == 1 || x < self.xs[0] || x > self.xs[n - 1] {
            return Ok(T::zero());
        }
        let pos = self.xs.partition_point(|&xi| xi <= x).clamp(1, n - 1);
        let i = pos - 1;
        Ok((self.ys[i + 1] - self.ys[i]) / (self.xs[i + 1] - self.xs[i]))
    }

    /// A new interpolator with node `index` moved by `shift`.
    pub fn with_shifted_node(&self, index: usize, shift: T) -> Result<Self, InterpolationError> {
        if index >= self.ys.len() {
            return Err(InterpolationError::InvalidInput(format!(
                "node index {} out of range for {} nodes",
                index,
                self.ys.len()
            )));
        }
        let mut shifted = self.clone();
        shifted.ys[index] = shifted.ys[index] + shift;
        Ok(shifted)
    }

    /// A new interpolator with every node moved by `shift`.
    pub fn with_parallel_shift(&self, shift: T) -> Self {
        let mut shifted = self.clone();
        shifted.ys.iter_mut().for_each(|y| *y = *y + shift);
        shifted
    }
}

impl<T: Float> Interpolator<T> for LinearInterpolator<T> {
    /// Interpolate value at point `x`.
    ///
    /// ```text
    /// y = y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    /// ```
    fn interpolate(&self, x: T) -> Result<T, InterpolationError> {
        self.check_domain(x)?;
        let b = locate_clamped(&self.xs, x);
        let y0 = self.ys[b.lower];
        let y1 = self.ys[b.upper];
        Ok(y0 + (y1 - y0) * b.weight)
    }

    #[inline]
    fn domain(&self) -> (T, T) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }
}
