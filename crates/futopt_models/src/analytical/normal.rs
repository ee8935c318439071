//! Normal (Bachelier) model for options on futures.
//!
//! ```text
//! d = (F - K) / (σ√T)
//! price = N · (ω (F - K) Φ(ω d) + σ√T φ(d))
//! ```
//!
//! with `ω = ±1` for calls and puts and `N` the numeraire. Forward and
//! strike may take any sign. When `σ√T < NORMAL_EPSILON` the price is the
//! intrinsic value.

use super::option::{intrinsic, EuropeanOption, OptionPriceAdjoint, OptionPriceAdjoint2};
use futopt_core::math::solvers::{bracket_root, BrentSolver, SolverConfig};
use futopt_core::math::{norm_cdf, norm_pdf};
use futopt_core::types::PricingError;
use tracing::trace;

/// Threshold on `σ√T` below which the intrinsic branch is taken.
pub const NORMAL_EPSILON: f64 = 1e-12;

/// Market inputs of the normal formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalFunctionData {
    /// Forward (futures) price
    pub forward: f64,
    /// Multiplier applied to price and derivatives
    pub numeraire: f64,
    /// Normal volatility, in price units per square-root year
    pub volatility: f64,
}

impl NormalFunctionData {
    /// Creates the input bundle.
    pub fn new(forward: f64, numeraire: f64, volatility: f64) -> Self {
        Self {
            forward,
            numeraire,
            volatility,
        }
    }
}

fn validate(option: &EuropeanOption, data: &NormalFunctionData) -> Result<(), PricingError> {
    if !option.strike.is_finite() || !data.forward.is_finite() || !data.numeraire.is_finite() {
        return Err(PricingError::InvalidInput(format!(
            "strike {}, forward {} and numeraire {} must be finite",
            option.strike, data.forward, data.numeraire
        )));
    }
    if !(option.expiry.is_finite() && option.expiry >= 0.0) {
        return Err(PricingError::InvalidInput(format!(
            "expiry must be non-negative, got {}",
            option.expiry
        )));
    }
    if !(data.volatility.is_finite() && data.volatility >= 0.0) {
        return Err(PricingError::InvalidInput(format!(
            "volatility must be non-negative, got {}",
            data.volatility
        )));
    }
    Ok(())
}

struct NormalTerms {
    sqrt_t: f64,
    std_dev: f64,
    d: f64,
    /// Φ(ω d)
    n_d: f64,
    /// φ(d)
    pdf_d: f64,
}

fn terms(option: &EuropeanOption, data: &NormalFunctionData) -> Option<NormalTerms> {
    let sqrt_t = option.expiry.sqrt();
    let std_dev = data.volatility * sqrt_t;
    if std_dev < NORMAL_EPSILON {
        return None;
    }
    let d = (data.forward - option.strike) / std_dev;
    Some(NormalTerms {
        sqrt_t,
        std_dev,
        d,
        n_d: norm_cdf(option.sign() * d),
        pdf_d: norm_pdf(d),
    })
}

/// Normal price.
///
/// # Examples
/// ```
/// use futopt_models::analytical::{normal_price, EuropeanOption, NormalFunctionData};
///
/// // at the money: σ√T / √(2π)
/// let call = EuropeanOption::new(0.99, 0.25, true);
/// let price = normal_price(&call, &NormalFunctionData::new(0.99, 1.0, 0.01)).unwrap();
/// let expected = 0.01 * 0.5 / (2.0 * std::f64::consts::PI).sqrt();
/// assert!((price - expected).abs() < 1e-15);
/// ```
pub fn normal_price(option: &EuropeanOption, data: &NormalFunctionData) -> Result<f64, PricingError> {
    validate(option, data)?;
    Ok(match terms(option, data) {
        Some(t) => {
            let omega = option.sign();
            data.numeraire * (omega * (data.forward - option.strike) * t.n_d + t.std_dev * t.pdf_d)
        }
        None => intrinsic(option, data.forward, data.numeraire).price,
    })
}

/// Normal price and its derivatives with respect to forward, volatility,
/// strike and expiry.
pub fn normal_price_adjoint(
    option: &EuropeanOption,
    data: &NormalFunctionData,
) -> Result<OptionPriceAdjoint, PricingError> {
    validate(option, data)?;
    let t = match terms(option, data) {
        Some(t) => t,
        None => {
            trace!(
                expiry = option.expiry,
                volatility = data.volatility,
                "normal kernel in intrinsic branch"
            );
            return Ok(intrinsic(option, data.forward, data.numeraire));
        }
    };
    let omega = option.sign();
    let num = data.numeraire;
    Ok(OptionPriceAdjoint {
        price: num * (omega * (data.forward - option.strike) * t.n_d + t.std_dev * t.pdf_d),
        d_forward: num * omega * t.n_d,
        d_volatility: num * t.sqrt_t * t.pdf_d,
        d_strike: -num * omega * t.n_d,
        d_expiry: num * data.volatility * t.pdf_d / (2.0 * t.sqrt_t),
    })
}

/// Normal price with gamma, vanna and volga.
pub fn normal_price_adjoint2(
    option: &EuropeanOption,
    data: &NormalFunctionData,
) -> Result<OptionPriceAdjoint2, PricingError> {
    let first = normal_price_adjoint(option, data)?;
    let t = match terms(option, data) {
        Some(t) => t,
        None => {
            return Ok(OptionPriceAdjoint2 {
                first,
                d2_forward: 0.0,
                d2_forward_volatility: 0.0,
                d2_volatility: 0.0,
            })
        }
    };
    let num = data.numeraire;
    Ok(OptionPriceAdjoint2 {
        first,
        d2_forward: num * t.pdf_d / t.std_dev,
        d2_forward_volatility: -num * t.pdf_d * t.d / data.volatility,
        d2_volatility: num * t.sqrt_t * t.pdf_d * t.d * t.d / data.volatility,
    })
}

/// Normal volatility reproducing `price`.
///
/// Prices within `1e-14` of intrinsic value return zero; prices below
/// intrinsic are rejected.
pub fn normal_implied_volatility(
    option: &EuropeanOption,
    forward: f64,
    numeraire: f64,
    price: f64,
) -> Result<f64, PricingError> {
    validate(option, &NormalFunctionData::new(forward, numeraire, 0.0))?;
    if !(numeraire > 0.0) {
        return Err(PricingError::InvalidInput(format!(
            "numeraire must be positive, got {}",
            numeraire
        )));
    }
    if option.expiry <= 0.0 {
        return Err(PricingError::InvalidInput(
            "implied volatility undefined at expiry".to_string(),
        ));
    }
    let intrinsic_price = intrinsic(option, forward, numeraire).price;
    if !price.is_finite() || price < intrinsic_price - 1e-14 {
        return Err(PricingError::InvalidInput(format!(
            "price {} below intrinsic value {}",
            price, intrinsic_price
        )));
    }
    if price <= intrinsic_price + 1e-14 {
        return Ok(0.0);
    }
    let f = |sigma: f64| {
        let data = NormalFunctionData::new(forward, numeraire, sigma);
        normal_price(option, &data).map_or(f64::NAN, |p| p - price)
    };
    let (a, b) = bracket_root(&f, 1e-10, 0.05, 60)?;
    let solver = BrentSolver::new(SolverConfig {
        tolerance: 1e-15,
        max_iterations: 300,
    });
    Ok(solver.find_root(f, a.max(0.0), b)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn data(forward: f64, volatility: f64) -> NormalFunctionData {
        NormalFunctionData::new(forward, 1.0, volatility)
    }

    fn price(f: f64, k: f64, sigma: f64, t: f64, is_call: bool) -> f64 {
        normal_price(&EuropeanOption::new(k, t, is_call), &data(f, sigma)).unwrap()
    }

    // ========================================
    // Price Tests
    // ========================================

    #[test]
    fn test_reference_price() {
        // F - K = σ√T: call = σ√T (Φ(1) + φ(1))
        let (f, k, sigma, t) = (0.995, 0.99, 0.01, 0.25);
        let expected = 0.005 * (norm_cdf(1.0) + norm_pdf(1.0));
        assert_relative_eq!(price(f, k, sigma, t, true), expected, epsilon = 1e-15);
    }

    #[test]
    fn test_negative_forward_and_strike_accepted() {
        let call = price(-0.002, -0.001, 0.006, 1.0, true);
        let put = price(-0.002, -0.001, 0.006, 1.0, false);
        assert!(call > 0.0 && put > 0.0);
        assert_relative_eq!(call - put, -0.001, epsilon = 1e-15);
    }

    #[test]
    fn test_intrinsic_branch() {
        let put = EuropeanOption::new(0.995, 0.5, false);
        let adj = normal_price_adjoint(&put, &data(0.99, 0.0)).unwrap();
        assert_relative_eq!(adj.price, 0.005, epsilon = 1e-15);
        assert_eq!(adj.d_forward, -1.0);
        assert_eq!(adj.d_volatility, 0.0);
        assert_eq!(price(0.99, 0.995, 0.01, 0.0, true), 0.0);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let option = EuropeanOption::new(0.99, 1.0, true);
        assert!(normal_price(&option, &data(f64::NAN, 0.01)).is_err());
        assert!(normal_price(&option, &data(0.99, -0.01)).is_err());
        let option = EuropeanOption::new(0.99, -1.0, true);
        assert!(normal_price(&option, &data(0.99, 0.01)).is_err());
    }

    // ========================================
    // Adjoint Tests
    // ========================================

    #[test]
    fn test_adjoint_by_finite_difference() {
        let (f, k, sigma, t) = (0.9872, 0.99, 0.0085, 0.75);
        for is_call in [true, false] {
            let option = EuropeanOption::new(k, t, is_call);
            let adj = normal_price_adjoint(&option, &NormalFunctionData::new(f, 0.97, sigma)).unwrap();
            let p = |f: f64, k: f64, s: f64, t: f64| 0.97 * price(f, k, s, t, is_call);
            let h = 1e-7;
            assert_relative_eq!(adj.price, p(f, k, sigma, t), epsilon = 1e-15);
            assert_relative_eq!(adj.d_forward, (p(f + h, k, sigma, t) - p(f - h, k, sigma, t)) / (2.0 * h), epsilon = 1e-7);
            assert_relative_eq!(adj.d_strike, (p(f, k + h, sigma, t) - p(f, k - h, sigma, t)) / (2.0 * h), epsilon = 1e-7);
            assert_relative_eq!(adj.d_volatility, (p(f, k, sigma + h, t) - p(f, k, sigma - h, t)) / (2.0 * h), epsilon = 1e-7);
            assert_relative_eq!(adj.d_expiry, (p(f, k, sigma, t + h) - p(f, k, sigma, t - h)) / (2.0 * h), epsilon = 1e-7);
        }
    }

    #[test]
    fn test_second_order_by_finite_difference() {
        let (f, k, sigma, t) = (0.9872, 0.99, 0.0085, 0.75);
        let option = EuropeanOption::new(k, t, false);
        let adj2 = normal_price_adjoint2(&option, &data(f, sigma)).unwrap();
        let first = |f: f64, s: f64| normal_price_adjoint(&option, &data(f, s)).unwrap();
        let h = 1e-6;
        let gamma_fd = (first(f + h, sigma).d_forward - first(f - h, sigma).d_forward) / (2.0 * h);
        let vanna_fd = (first(f, sigma + h).d_forward - first(f, sigma - h).d_forward) / (2.0 * h);
        let volga_fd = (first(f, sigma + h).d_volatility - first(f, sigma - h).d_volatility) / (2.0 * h);
        assert_relative_eq!(adj2.d2_forward, gamma_fd, max_relative = 1e-6);
        assert_relative_eq!(adj2.d2_forward_volatility, vanna_fd, max_relative = 1e-6);
        assert_relative_eq!(adj2.d2_volatility, volga_fd, max_relative = 1e-5);
    }

    // ========================================
    // Implied Volatility Tests
    // ========================================

    #[test]
    fn test_implied_volatility_round_trip() {
        for &(k, is_call) in &[(0.97, true), (0.985, false), (1.01, false), (0.99, true)] {
            let option = EuropeanOption::new(k, 0.75, is_call);
            let p = price(0.9875, k, 0.0072, 0.75, is_call);
            let vol = normal_implied_volatility(&option, 0.9875, 1.0, p).unwrap();
            assert_relative_eq!(vol, 0.0072, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_implied_volatility_bounds() {
        let option = EuropeanOption::new(0.98, 0.5, true);
        assert!(normal_implied_volatility(&option, 0.99, 1.0, 0.005).is_err());
        assert_eq!(normal_implied_volatility(&option, 0.99, 1.0, 0.01).unwrap(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_put_call_parity(
            f in 0.95..1.02_f64,
            k in 0.95..1.02_f64,
            sigma in 0.0..0.02_f64,
            t in 0.0..3.0_f64,
        ) {
            let parity = price(f, k, sigma, t, true) - price(f, k, sigma, t, false);
            prop_assert!((parity - (f - k)).abs() < 1e-13);
        }

        #[test]
        fn prop_price_not_below_intrinsic(
            f in 0.95..1.02_f64,
            k in 0.95..1.02_f64,
            sigma in 0.0..0.02_f64,
            t in 0.0..3.0_f64,
        ) {
            prop_assert!(price(f, k, sigma, t, true) >= (f - k).max(0.0) - 1e-15);
            prop_assert!(price(f, k, sigma, t, false) >= (k - f).max(0.0) - 1e-15);
        }
    }
}
