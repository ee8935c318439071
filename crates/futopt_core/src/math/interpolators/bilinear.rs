//! Bilinear 2D interpolation for surfaces.

use super::locate_clamped;
use crate::types::InterpolationError;
use num_traits::Float;

/// Bilinear interpolator for 2D grid data with flat extrapolation.
///
/// The grid is stored as `zs[i][j] = z(xs[i], ys[j])` where:
/// - `xs` defines the x-axis coordinates (rows)
/// - `ys` defines the y-axis coordinates (columns)
///
/// An axis may hold a single coordinate, in which case the surface is
/// constant along it.
///
/// # Example
///
/// ```
/// use futopt_core::math::interpolators::BilinearInterpolator;
///
/// let interp = BilinearInterpolator::new(
///     &[0.0_f64, 1.0],
///     &[0.0_f64, 1.0],
///     vec![vec![0.0, 1.0], vec![2.0, 3.0]],
/// )
/// .unwrap();
/// assert!((interp.interpolate(0.5, 0.5) - 1.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct BilinearInterpolator<T: Float> {
    xs: Vec<T>,
    ys: Vec<T>,
    zs: Vec<Vec<T>>,
}

impl<T: Float> BilinearInterpolator<T> {
    /// Construct from strictly increasing axes and a row-major grid.
    pub fn new(xs: &[T], ys: &[T], zs: Vec<Vec<T>>) -> Result<Self, InterpolationError> {
        for axis in [xs, ys] {
            if axis.is_empty() {
                return Err(InterpolationError::InsufficientData { got: 0, need: 1 });
            }
            if let Some(w) = axis.windows(2).find(|w| w[0] >= w[1]) {
                return Err(InterpolationError::InvalidInput(format!(
                    "axis must be strictly increasing, found {} after {}",
                    w[1].to_f64().unwrap_or(f64::NAN),
                    w[0].to_f64().unwrap_or(f64::NAN)
                )));
            }
        }
        if zs.len() != xs.len() || zs.iter().any(|row| row.len() != ys.len()) {
            return Err(InterpolationError::InvalidInput(format!(
                "grid must be {} x {}",
                xs.len(),
                ys.len()
            )));
        }
        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            zs,
        })
    }

    /// Interpolated value at `(x, y)`, clamped to the grid edges.
    pub fn interpolate(&self, x: T, y: T) -> T {
        self.node_sensitivity(x, y)
            .into_iter()
            .fold(T::zero(), |acc, ((i, j), w)| acc + w * self.zs[i][j])
    }

    /// Non-zero interpolation weights `((row, column), weight)` at `(x, y)`.
    ///
    /// The weights sum to one and are the derivative of the interpolated
    /// value with respect to each grid node.
    pub fn node_sensitivity(&self, x: T, y: T) -> Vec<((usize, usize), T)> {
        let bx = locate_clamped(&self.xs, x);
        let by = locate_clamped(&self.ys, y);
        let mut weights: Vec<((usize, usize), T)> = Vec::with_capacity(4);
        for (i, wx) in [(bx.lower, T::one() - bx.weight), (bx.upper, bx.weight)] {
            for (j, wy) in [(by.lower, T::one() - by.weight), (by.upper, by.weight)] {
                let w = wx * wy;
                if w == T::zero() {
                    continue;
                }
                match weights.iter_mut().find(|(node, _)| *node == (i, j)) {
                    Some((_, existing)) => *existing = *existing + w,
                    None => weights.push(((i, j), w)),
                }
            }
        }
        weights
    }

    /// Partial derivative `∂z/∂x` (zero outside the x range).
    pub fn derivative_x(&self, x: T, y: T) -> T {
        let bx = locate_clamped(&self.xs, x);
        if bx.lower == bx.upper {
            return T::zero();
        }
        let dx = self.xs[bx.upper] - self.xs[bx.lower];
        let by = locate_clamped(&self.ys, y);
        let row = |i: usize| {
            self.zs[i][by.lower] * (T::one() - by.weight) + self.zs[i][by.upper] * by.weight
        };
        (row(bx.upper) - row(bx.lower)) / dx
    }

    /// Partial derivative `∂z/∂y` (zero outside the y range).
    pub fn derivative_y(&self, x: T, y: T) -> T {
        let by = locate_clamped(&self.ys, y);
        if by.lower == by.upper {
            return T::zero();
        }
        let dy = self.ys[by.upper] - self.ys[by.lower];
        let bx = locate_clamped(&self.xs, x);
        let column = |j: usize| {
            self.zs[bx.lower][j] * (T::one() - bx.weight) + self.zs[bx.upper][j] * bx.weight
        };
        (column(by.upper) - column(by.lower)) / dy
    }

    /// A new interpolator with node `(row, column)` moved by `shift`.
    pub fn with_shifted_node(
        &self,
        row: usize,
        column: usize,
        shift: T,
    ) -> Result<Self, InterpolationError> {
        if row >= self.xs.len() || column >= self.ys.len() {
            return Err(InterpolationError::InvalidInput(format!(
                "node ({}, {}) outside {} x {} grid",
                row,
                column,
                self.xs.len(),
                self.ys.len()
            )));
        }
        let mut shifted = self.clone();
        shifted.zs[row][column] = shifted.zs[row][column] + shift;
        Ok(shifted)
    }

    /// X-axis coordinates.
    pub fn xs(&self) -> &[T] {
        &self.xs
    }

    /// Y-axis coordinates.
    pub fn ys(&self) -> &[T] {
        &self.ys
    }

    /// Grid values.
    pub fn zs(&self) -> &[Vec<T>] {
        &self.zs
    }
}
