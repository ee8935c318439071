//! Numerical building blocks: Gaussian distribution, interpolation,
//! root finding and finite differences.

pub mod distributions;
pub mod finite_difference;
pub mod interpolators;
pub mod solvers;

pub use distributions::{norm_cdf, norm_pdf};
pub use finite_difference::{FiniteDifferenceDifferentiator, FiniteDifferenceType};
