//! Yield curves.

mod interpolated;
mod traits;

pub use interpolated::{Compounding, CurveInterpolation, InterpolatedCurve};
pub use traits::YieldCurve;
