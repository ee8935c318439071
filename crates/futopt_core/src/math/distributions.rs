//! Standard normal distribution functions.
//!
//! The CDF goes through `statrs`'s complementary error function so that the
//! tails are accurate to machine precision; option prices and implied
//! volatilities are compared at `1e-8` and need more than a polynomial
//! approximation offers.

use statrs::function::erf::erfc;
use std::f64::consts::FRAC_1_SQRT_2;

/// `1 / sqrt(2π)`
const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Standard normal cumulative distribution function N(x).
///
/// # Examples
/// ```
/// use futopt_core::math::norm_cdf;
///
/// assert!((norm_cdf(0.0) - 0.5).abs() < 1e-15);
/// assert!((norm_cdf(1.0) + norm_cdf(-1.0) - 1.0).abs() < 1e-15);
/// ```
#[inline]
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x * FRAC_1_SQRT_2)
}

/// Standard normal probability density function n(x).
#[inline]
pub fn norm_pdf(x: f64) -> f64 {
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_norm_cdf_reference_values() {
        assert_relative_eq!(norm_cdf(1.0), 0.841_344_746_068_542_9, epsilon = 1e-15);
        assert_relative_eq!(norm_cdf(-1.96), 0.024_997_895_148_220_43, epsilon = 1e-15);
        assert_relative_eq!(norm_cdf(-8.0), 6.220_960_574_271_785e-16, max_relative = 1e-10);
    }

    #[test]
    fn test_norm_pdf_peak() {
        assert_relative_eq!(norm_pdf(0.0), 1.0 / (2.0 * PI).sqrt(), epsilon = 1e-16);
        assert_relative_eq!(norm_pdf(1.5), norm_pdf(-1.5), epsilon = 1e-16);
    }

    #[test]
    fn test_pdf_is_derivative_of_cdf() {
        let h = 1e-5;
        for &x in &[-2.0, -0.3, 0.0, 0.7, 3.1] {
            let fd = (norm_cdf(x + h) - norm_cdf(x - h)) / (2.0 * h);
            assert_relative_eq!(fd, norm_pdf(x), epsilon = 1e-9);
        }
    }
}
