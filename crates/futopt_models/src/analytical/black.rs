//! Black-76 model for options on futures and forwards.
//!
//! ```text
//! d1 = (ln(F/K) + σ²T/2) / (σ√T),  d2 = d1 - σ√T
//! call = N · (F N(d1) - K N(d2))
//! put  = N · (K N(-d2) - F N(-d1))
//! ```
//!
//! where `N` is the numeraire (1 for margined options, a discount factor
//! otherwise). When `σ√T < BLACK_EPSILON` the price is the intrinsic value.

use super::option::{intrinsic, EuropeanOption, OptionPriceAdjoint, OptionPriceAdjoint2};
use futopt_core::math::solvers::{bracket_root, BrentSolver, SolverConfig};
use futopt_core::math::{norm_cdf, norm_pdf};
use futopt_core::types::PricingError;
use tracing::trace;

/// Threshold on `σ√T` below which the intrinsic branch is taken.
pub const BLACK_EPSILON: f64 = 1e-12;

/// Market inputs of the Black formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackFunctionData {
    /// Forward (futures) price
    pub forward: f64,
    /// Multiplier applied to price and derivatives
    pub numeraire: f64,
    /// Lognormal volatility
    pub volatility: f64,
}

impl BlackFunctionData {
    /// Creates the input bundle.
    pub fn new(forward: f64, numeraire: f64, volatility: f64) -> Self {
        Self {
            forward,
            numeraire,
            volatility,
        }
    }
}

fn validate(option: &EuropeanOption, data: &BlackFunctionData) -> Result<(), PricingError> {
    if !(option.strike.is_finite() && option.strike > 0.0) {
        return Err(PricingError::InvalidInput(format!(
            "strike must be positive, got {}",
            option.strike
        )));
    }
    if !(data.forward.is_finite() && data.forward > 0.0) {
        return Err(PricingError::InvalidInput(format!(
            "forward must be positive, got {}",
            data.forward
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
    if !data.numeraire.is_finite() {
        return Err(PricingError::InvalidInput(format!(
            "numeraire must be finite, got {}",
            data.numeraire
        )));
    }
    Ok(())
}

/// Intermediate quantities shared by the price and its derivatives.
struct BlackTerms {
    sqrt_t: f64,
    d1: f64,
    d2: f64,
    /// N(ω d1)
    n_d1: f64,
    /// N(ω d2)
    n_d2: f64,
    /// n(d1)
    pdf_d1: f64,
}

fn terms(option: &EuropeanOption, data: &BlackFunctionData) -> Option<BlackTerms> {
    let sqrt_t = option.expiry.sqrt();
    let std_dev = data.volatility * sqrt_t;
    if std_dev < BLACK_EPSILON {
        return None;
    }
    let omega = option.sign();
    let d1 = ((data.forward / option.strike).ln() + 0.5 * std_dev * std_dev) / std_dev;
    let d2 = d1 - std_dev;
    Some(BlackTerms {
        sqrt_t,
        d1,
        d2,
        n_d1: norm_cdf(omega * d1),
        n_d2: norm_cdf(omega * d2),
        pdf_d1: norm_pdf(d1),
    })
}

/// Black price.
///
/// # Examples
/// ```
/// use futopt_models::analytical::{black_price, BlackFunctionData, EuropeanOption};
///
/// let call = EuropeanOption::new(0.98, 0.5, true);
/// let put = EuropeanOption::new(0.98, 0.5, false);
/// let data = BlackFunctionData::new(0.985, 1.0, 0.01);
/// let parity = black_price(&call, &data).unwrap() - black_price(&put, &data).unwrap();
/// assert!((parity - (0.985 - 0.98)).abs() < 1e-14);
/// ```
pub fn black_price(option: &EuropeanOption, data: &BlackFunctionData) -> Result<f64, PricingError> {
    validate(option, data)?;
    Ok(match terms(option, data) {
        Some(t) => {
            let omega = option.sign();
            data.numeraire * omega * (data.forward * t.n_d1 - option.strike * t.n_d2)
        }
        None => intrinsic(option, data.forward, data.numeraire).price,
    })
}

/// Black price and its derivatives with respect to forward, volatility,
/// strike and expiry, in one pass.
pub fn black_price_adjoint(
    option: &EuropeanOption,
    data: &BlackFunctionData,
) -> Result<OptionPriceAdjoint, PricingError> {
    validate(option, data)?;
    let t = match terms(option, data) {
        Some(t) => t,
        None => {
            trace!(
                expiry = option.expiry,
                volatility = data.volatility,
                "Black kernel in intrinsic branch"
            );
            return Ok(intrinsic(option, data.forward, data.numeraire));
        }
    };
    let omega = option.sign();
    let num = data.numeraire;
    let vega = num * data.forward * t.pdf_d1 * t.sqrt_t;
    Ok(OptionPriceAdjoint {
        price: num * omega * (data.forward * t.n_d1 - option.strike * t.n_d2),
        d_forward: num * omega * t.n_d1,
        d_volatility: vega,
        d_strike: -num * omega * t.n_d2,
        d_expiry: vega * data.volatility / (2.0 * option.expiry),
    })
}

/// Black price with first and second order derivatives (gamma, vanna, volga).
pub fn black_price_adjoint2(
    option: &EuropeanOption,
    data: &BlackFunctionData,
) -> Result<OptionPriceAdjoint2, PricingError> {
    let first = black_price_adjoint(option, data)?;
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
    let std_dev = data.volatility * t.sqrt_t;
    Ok(OptionPriceAdjoint2 {
        first,
        d2_forward: num * t.pdf_d1 / (data.forward * std_dev),
        d2_forward_volatility: -num * t.pdf_d1 * t.d2 / data.volatility,
        d2_volatility: num * data.forward * t.pdf_d1 * t.sqrt_t * t.d1 * t.d2 / data.volatility,
    })
}

/// Volatility reproducing `price` in the Black formula.
///
/// Prices at (or within `1e-14` of) intrinsic value return zero. Prices below
/// intrinsic or above the forward (call) or strike (put), scaled by the
/// numeraire, are rejected.
pub fn black_implied_volatility(
    option: &EuropeanOption,
    forward: f64,
    numeraire: f64,
    price: f64,
) -> Result<f64, PricingError> {
    let zero_vol = BlackFunctionData::new(forward, numeraire, 0.0);
    validate(option, &zero_vol)?;
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
    let upper = numeraire * if option.is_call { forward } else { option.strike };
    if price < intrinsic_price - 1e-14 || price >= upper {
        return Err(PricingError::InvalidInput(format!(
            "price {} outside no-arbitrage bounds [{}, {})",
            price, intrinsic_price, upper
        )));
    }
    if price <= intrinsic_price + 1e-14 {
        return Ok(0.0);
    }
    let f = |sigma: f64| {
        let data = BlackFunctionData::new(forward, numeraire, sigma);
        black_price(option, &data).map_or(f64::NAN, |p| p - price)
    };
    let (a, b) = bracket_root(&f, 1e-8, 1.0, 60)?;
    let solver = BrentSolver::new(SolverConfig {
        tolerance: 1e-15,
        max_iterations: 300,
    });
    Ok(solver.find_root(f, a.max(0.0), b)?)
}
