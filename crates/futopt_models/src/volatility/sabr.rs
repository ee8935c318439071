//! SABR volatility with Hagan's lognormal expansion.
//!
//! ```text
//! σ(K) = α / sf1 · z/x(z) · sf2
//! sfK  = (F K)^((1-β)/2),  L = ln(F/K),  z = ν/α · sfK · L
//! x(z) = ln((√(1 - 2ρz + z²) + z - ρ) / (1 - ρ))
//! sf1  = sfK · (1 + (1-β)²/24 L² + (1-β)⁴/1920 L⁴)
//! sf2  = 1 + ((1-β)²α²/(24 sfK²) + ρβνα/(4 sfK) + (2 - 3ρ²)ν²/24) T
//! ```
//!
//! For `|z| < 1e-6` the ratio `z/x(z)` is replaced by its expansion
//! `1 - ρz/2`. Parameters are stored as bilinear grids over (expiry, delay).
//!
//! Reference: Hagan, Kumar, Lesniewski, Woodward, "Managing Smile Risk",
//! Wilmott Magazine (2002).

use super::{unknown_parameter, SabrParameterAccess, VolatilityAdjoint, VolatilityModel, VolatilityQuery};
use crate::error::ModelError;
use futopt_core::math::interpolators::BilinearInterpolator;
use futopt_core::sensitivity::{ModelParameter, ModelParameterSensitivity, SabrParameter};
use tracing::warn;

/// Strikes below `forward * CUTOFF_MONEYNESS` are floored.
const CUTOFF_MONEYNESS: f64 = 1e-12;

/// Below this `|z|` the small-z expansion of `z/x(z)` is used.
const SMALL_Z: f64 = 1e-6;

/// SABR parameters at one point.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SabrPoint {
    /// Initial volatility
    pub alpha: f64,
    /// CEV exponent
    pub beta: f64,
    /// Correlation between forward and volatility
    pub rho: f64,
    /// Volatility of volatility
    pub nu: f64,
}

impl SabrPoint {
    /// Validated parameter set.
    pub fn new(alpha: f64, beta: f64, rho: f64, nu: f64) -> Result<Self, ModelError> {
        validate(SabrParameter::Alpha, alpha)?;
        validate(SabrParameter::Beta, beta)?;
        validate(SabrParameter::Rho, rho)?;
        validate(SabrParameter::Nu, nu)?;
        Ok(Self {
            alpha,
            beta,
            rho,
            nu,
        })
    }
}

fn validate(parameter: SabrParameter, value: f64) -> Result<(), ModelError> {
    let (ok, name, constraint) = match parameter {
        SabrParameter::Alpha => (value > 0.0, "alpha", "alpha > 0"),
        SabrParameter::Beta => ((0.0..=1.0).contains(&value), "beta", "0 <= beta <= 1"),
        SabrParameter::Rho => (value.abs() < 1.0, "rho", "-1 < rho < 1"),
        SabrParameter::Nu => (value >= 0.0, "nu", "nu >= 0"),
    };
    if ok && value.is_finite() {
        Ok(())
    } else {
        Err(ModelError::InvalidParameter {
            name,
            value,
            constraint,
        })
    }
}

/// Hagan volatility with its derivatives.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SabrFormulaAdjoint {
    /// Black volatility
    pub volatility: f64,
    /// ∂σ/∂F
    pub d_forward: f64,
    /// ∂σ/∂K
    pub d_strike: f64,
    /// ∂σ/∂α
    pub d_alpha: f64,
    /// ∂σ/∂β
    pub d_beta: f64,
    /// ∂σ/∂ρ
    pub d_rho: f64,
    /// ∂σ/∂ν
    pub d_nu: f64,
}

impl SabrFormulaAdjoint {
    /// Derivative with respect to one SABR parameter.
    pub fn parameter(&self, parameter: SabrParameter) -> f64 {
        match parameter {
            SabrParameter::Alpha => self.d_alpha,
            SabrParameter::Beta => self.d_beta,
            SabrParameter::Rho => self.d_rho,
            SabrParameter::Nu => self.d_nu,
        }
    }
}

/// Intermediate values of the forward sweep.
struct HaganTape {
    strike: f64,
    strike_floored: bool,
    beta_star: f64,
    sf_k: f64,
    ln_fk: f64,
    z: f64,
    /// `√(1 - 2ρz + z²)` and `x(z)`; unused for small z
    root: f64,
    arg: f64,
    xz: f64,
    rzxz: f64,
    sf1: f64,
    sf2: f64,
    volatility: f64,
}

fn forward_sweep(p: &SabrPoint, forward: f64, strike: f64, expiry: f64) -> Option<HaganTape> {
    if p.alpha <= 0.0 {
        return None;
    }
    let cutoff = forward * CUTOFF_MONEYNESS;
    let (strike, strike_floored) = if strike < cutoff {
        (cutoff, true)
    } else {
        (strike, false)
    };
    let beta_star = 1.0 - p.beta;
    let sf_k = (forward * strike).powf(beta_star / 2.0);
    let ln_fk = (forward / strike).ln();
    let z = p.nu / p.alpha * sf_k * ln_fk;
    let (root, arg, xz, rzxz) = if z.abs() < SMALL_Z {
        (0.0, 0.0, 0.0, 1.0 - 0.5 * z * p.rho)
    } else {
        let root = (1.0 - 2.0 * p.rho * z + z * z).sqrt();
        let arg = root + z - p.rho;
        if arg <= 0.0 {
            return None;
        }
        let xz = (arg / (1.0 - p.rho)).ln();
        (root, arg, xz, z / xz)
    };
    let b2 = beta_star * beta_star;
    let l2 = ln_fk * ln_fk;
    let sf1 = sf_k * (1.0 + b2 / 24.0 * l2 + b2 * b2 / 1920.0 * l2 * l2);
    let sf2 = 1.0
        + (b2 * p.alpha * p.alpha / (24.0 * sf_k * sf_k)
            + p.rho * p.beta * p.nu * p.alpha / (4.0 * sf_k)
            + (2.0 - 3.0 * p.rho * p.rho) * p.nu * p.nu / 24.0)
            * expiry;
    let volatility = p.alpha / sf1 * rzxz * sf2;
    if !(volatility.is_finite() && volatility > 0.0) {
        warn!(
            alpha = p.alpha,
            beta = p.beta,
            rho = p.rho,
            nu = p.nu,
            forward,
            strike,
            "SABR expansion gave a non-positive volatility, using zero"
        );
        return None;
    }
    Some(HaganTape {
        strike,
        strike_floored,
        beta_star,
        sf_k,
        ln_fk,
        z,
        root,
        arg,
        xz,
        rzxz,
        sf1,
        sf2,
        volatility,
    })
}

/// Hagan volatility; zero when `α = 0` or the expansion breaks down.
pub fn hagan_volatility(point: &SabrPoint, forward: f64, strike: f64, expiry: f64) -> f64 {
    forward_sweep(point, forward, strike, expiry).map_or(0.0, |tape| tape.volatility)
}

/// Hagan volatility and its derivatives with respect to forward, strike and
/// the four parameters, by a reverse sweep over the forward computation.
pub fn hagan_volatility_adjoint(
    point: &SabrPoint,
    forward: f64,
    strike: f64,
    expiry: f64,
) -> SabrFormulaAdjoint {
    let tape = match forward_sweep(point, forward, strike, expiry) {
        Some(tape) => tape,
        None => return SabrFormulaAdjoint::default(),
    };
    let SabrPoint {
        alpha,
        beta,
        rho,
        nu,
    } = *point;
    let HaganTape {
        beta_star: b,
        sf_k,
        ln_fk: l,
        z,
        rzxz,
        sf1,
        sf2,
        ..
    } = tape;

    let sf2_bar = alpha / sf1 * rzxz;
    let sf1_bar = -alpha / (sf1 * sf1) * rzxz * sf2;
    let rzxz_bar = alpha / sf1 * sf2;

    let (z_bar, rho_bar_from_z) = if z.abs() < SMALL_Z {
        (-rho / 2.0 * rzxz_bar, -z / 2.0 * rzxz_bar)
    } else {
        let xz_bar = -z / (tape.xz * tape.xz) * rzxz_bar;
        let z_bar = rzxz_bar / tape.xz
            + (0.5 / tape.root * (2.0 * z - 2.0 * rho) + 1.0) / tape.arg * xz_bar;
        let rho_bar = ((-z / tape.root - 1.0) / tape.arg + 1.0 / (1.0 - rho)) * xz_bar;
        (z_bar, rho_bar)
    };

    let b2 = b * b;
    let ln_fk_bar = sf_k * (b2 / 12.0 * l + b2 * b2 / 480.0 * l * l * l) * sf1_bar
        + nu / alpha * sf_k * z_bar;
    let sf_k_bar = nu / alpha * l * z_bar + sf1 / sf_k * sf1_bar
        - (b2 * alpha * alpha / (12.0 * sf_k * sf_k * sf_k)
            + rho * beta * nu * alpha / (4.0 * sf_k * sf_k))
            * expiry
            * sf2_bar;

    let d_strike = if tape.strike_floored {
        0.0
    } else {
        -ln_fk_bar / tape.strike + b * sf_k / (2.0 * tape.strike) * sf_k_bar
    };
    let d_forward = ln_fk_bar / forward + b * sf_k / (2.0 * forward) * sf_k_bar;
    let d_nu = sf_k * l / alpha * z_bar
        + (rho * beta * alpha / (4.0 * sf_k) + (2.0 - 3.0 * rho * rho) * nu / 12.0)
            * expiry
            * sf2_bar;
    let d_rho =
        rho_bar_from_z + (beta * nu * alpha / (4.0 * sf_k) - rho * nu * nu / 4.0) * expiry * sf2_bar;
    let d_alpha = -nu / (alpha * alpha) * sf_k * l * z_bar
        + (b2 * alpha / (12.0 * sf_k * sf_k) + rho * beta * nu / (4.0 * sf_k)) * expiry * sf2_bar
        + rzxz * sf2 / sf1;
    let l2 = l * l;
    let d_beta = -0.5 * (forward * tape.strike).ln() * sf_k * sf_k_bar
        - sf_k * (b / 12.0 * l2 + b2 * b / 480.0 * l2 * l2) * sf1_bar
        + (-b * alpha * alpha / (12.0 * sf_k * sf_k) + rho * nu * alpha / (4.0 * sf_k))
            * expiry
            * sf2_bar;

    SabrFormulaAdjoint {
        volatility: tape.volatility,
        d_forward,
        d_strike,
        d_alpha,
        d_beta,
        d_rho,
        d_nu,
    }
}

const PARAMETERS: [SabrParameter; 4] = [
    SabrParameter::Alpha,
    SabrParameter::Beta,
    SabrParameter::Rho,
    SabrParameter::Nu,
];

/// SABR parameter surfaces over (expiry, delay).
///
/// # Examples
/// ```
/// use futopt_models::volatility::{SabrVolatility, VolatilityModel, VolatilityQuery};
///
/// // β = 1, ν = 0 is lognormal with volatility α
/// let sabr = SabrVolatility::flat(0.2, 1.0, 0.0, 0.0).unwrap();
/// let vol = sabr.volatility(&VolatilityQuery::new(1.0, 0.25, 0.97, 0.99)).unwrap();
/// assert!((vol - 0.2).abs() < 1e-14);
/// ```
#[derive(Debug, Clone)]
pub struct SabrVolatility {
    alpha: BilinearInterpolator<f64>,
    beta: BilinearInterpolator<f64>,
    rho: BilinearInterpolator<f64>,
    nu: BilinearInterpolator<f64>,
}

impl SabrVolatility {
    /// Parameter grids `grid[expiry][delay]` on common axes.
    pub fn new(
        expiries: &[f64],
        delays: &[f64],
        alpha: Vec<Vec<f64>>,
        beta: Vec<Vec<f64>>,
        rho: Vec<Vec<f64>>,
        nu: Vec<Vec<f64>>,
    ) -> Result<Self, ModelError> {
        let build = |parameter: SabrParameter, grid: Vec<Vec<f64>>| {
            grid.iter()
                .flatten()
                .try_for_each(|&v| validate(parameter, v))?;
            Ok::<_, ModelError>(BilinearInterpolator::new(expiries, delays, grid)?)
        };
        Ok(Self {
            alpha: build(SabrParameter::Alpha, alpha)?,
            beta: build(SabrParameter::Beta, beta)?,
            rho: build(SabrParameter::Rho, rho)?,
            nu: build(SabrParameter::Nu, nu)?,
        })
    }

    /// The same parameters at every expiry and delay.
    pub fn flat(alpha: f64, beta: f64, rho: f64, nu: f64) -> Result<Self, ModelError> {
        let single = |v: f64| vec![vec![v]];
        Self::new(
            &[0.0],
            &[0.0],
            single(alpha),
            single(beta),
            single(rho),
            single(nu),
        )
    }

    fn grid(&self, parameter: SabrParameter) -> &BilinearInterpolator<f64> {
        match parameter {
            SabrParameter::Alpha => &self.alpha,
            SabrParameter::Beta => &self.beta,
            SabrParameter::Rho => &self.rho,
            SabrParameter::Nu => &self.nu,
        }
    }

    /// Expiry axis.
    pub fn expiries(&self) -> &[f64] {
        self.alpha.xs()
    }

    /// Delay axis.
    pub fn delays(&self) -> &[f64] {
        self.alpha.ys()
    }
}

impl VolatilityModel for SabrVolatility {
    fn name(&self) -> &'static str {
        "SABR"
    }

    fn volatility(&self, query: &VolatilityQuery) -> Result<f64, ModelError> {
        query.validate_lognormal()?;
        let point = self.sabr_point(query.expiry, query.delay);
        Ok(hagan_volatility(&point, query.forward, query.strike, query.expiry))
    }

    fn volatility_adjoint(&self, query: &VolatilityQuery) -> Result<VolatilityAdjoint, ModelError> {
        let adjoint = self.sabr_adjoint(query)?;
        let weights = self.alpha.node_sensitivity(query.expiry, query.delay);
        let mut parameters = ModelParameterSensitivity::new();
        for parameter in PARAMETERS {
            let d = adjoint.parameter(parameter);
            for &((row, column), w) in &weights {
                parameters.add_value(
                    ModelParameter::Sabr {
                        parameter,
                        row,
                        column,
                    },
                    w * d,
                );
            }
        }
        Ok(VolatilityAdjoint {
            volatility: adjoint.volatility,
            d_forward: adjoint.d_forward,
            d_strike: adjoint.d_strike,
            parameters,
        })
    }

    fn parameters(&self) -> Vec<(ModelParameter, f64)> {
        let mut out = Vec::new();
        for parameter in PARAMETERS {
            for (row, values) in self.grid(parameter).zs().iter().enumerate() {
                for (column, &value) in values.iter().enumerate() {
                    out.push((
                        ModelParameter::Sabr {
                            parameter,
                            row,
                            column,
                        },
                        value,
                    ));
                }
            }
        }
        out
    }

    fn with_shifted_parameter(&self, parameter: &ModelParameter, shift: f64) -> Result<Self, ModelError> {
        let (which, row, column) = match *parameter {
            ModelParameter::Sabr {
                parameter,
                row,
                column,
            } => (parameter, row, column),
            ref other => return Err(unknown_parameter(other, self.name())),
        };
        let shifted = self.grid(which).with_shifted_node(row, column, shift)?;
        validate(which, shifted.zs()[row][column])?;
        let mut model = self.clone();
        match which {
            SabrParameter::Alpha => model.alpha = shifted,
            SabrParameter::Beta => model.beta = shifted,
            SabrParameter::Rho => model.rho = shifted,
            SabrParameter::Nu => model.nu = shifted,
        }
        Ok(model)
    }
}

impl SabrParameterAccess for SabrVolatility {
    fn sabr_point(&self, expiry: f64, delay: f64) -> SabrPoint {
        SabrPoint {
            alpha: self.alpha.interpolate(expiry, delay),
            beta: self.beta.interpolate(expiry, delay),
            rho: self.rho.interpolate(expiry, delay),
            nu: self.nu.interpolate(expiry, delay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn point() -> SabrPoint {
        SabrPoint::new(0.05, 0.5, -0.25, 0.5).unwrap()
    }

    fn fd<F: Fn(f64) -> f64>(f: F, x: f64) -> f64 {
        let h = 1e-6 * x.abs().max(1e-2);
        (f(x + h) - f(x - h)) / (2.0 * h)
    }

    fn check_adjoint(p: SabrPoint, forward: f64, strike: f64, expiry: f64, tol: f64) {
        let adj = hagan_volatility_adjoint(&p, forward, strike, expiry);
        let vol = |p: SabrPoint, f: f64, k: f64| hagan_volatility(&p, f, k, expiry);
        assert_relative_eq!(adj.volatility, vol(p, forward, strike), epsilon = 1e-15);
        assert_relative_eq!(adj.d_forward, fd(|f| vol(p, f, strike), forward), epsilon = tol);
        assert_relative_eq!(adj.d_strike, fd(|k| vol(p, forward, k), strike), epsilon = tol);
        assert_relative_eq!(
            adj.d_alpha,
            fd(|a| vol(SabrPoint { alpha: a, ..p }, forward, strike), p.alpha),
            epsilon = tol
        );
        assert_relative_eq!(
            adj.d_beta,
            fd(|b| vol(SabrPoint { beta: b, ..p }, forward, strike), p.beta),
            epsilon = tol
        );
        assert_relative_eq!(
            adj.d_rho,
            fd(|r| vol(SabrPoint { rho: r, ..p }, forward, strike), p.rho),
            epsilon = tol
        );
        assert_relative_eq!(
            adj.d_nu,
            fd(|n| vol(SabrPoint { nu: n, ..p }, forward, strike), p.nu),
            epsilon = tol
        );
    }

    // ========================================
    // Formula Tests
    // ========================================

    #[test]
    fn test_lognormal_limit() {
        let p = SabrPoint::new(0.3, 1.0, 0.0, 0.0).unwrap();
        assert_relative_eq!(hagan_volatility(&p, 0.99, 0.95, 2.0), 0.3, epsilon = 1e-15);
    }

    #[test]
    fn test_atm_closed_form() {
        let p = point();
        let (f, t): (f64, f64) = (0.98, 1.5);
        let b = 1.0 - p.beta;
        let fb = f.powf(b);
        let expected = p.alpha / fb
            * (1.0
                + (b * b * p.alpha * p.alpha / (24.0 * fb * fb)
                    + p.rho * p.beta * p.nu * p.alpha / (4.0 * fb)
                    + (2.0 - 3.0 * p.rho * p.rho) * p.nu * p.nu / 24.0)
                    * t);
        assert_relative_eq!(hagan_volatility(&p, f, f, t), expected, epsilon = 1e-15);
    }

    #[test]
    fn test_skew_follows_rho() {
        let negative = SabrPoint::new(0.05, 0.5, -0.5, 0.5).unwrap();
        let positive = SabrPoint::new(0.05, 0.5, 0.5, 0.5).unwrap();
        let slope = |p: &SabrPoint| hagan_volatility(p, 0.98, 1.0, 1.0) - hagan_volatility(p, 0.98, 0.96, 1.0);
        assert!(slope(&negative) < slope(&positive));
    }

    #[test]
    fn test_zero_alpha_gives_zero() {
        let p = SabrPoint {
            alpha: 0.0,
            ..point()
        };
        let adj = hagan_volatility_adjoint(&p, 0.98, 0.97, 1.0);
        assert_eq!(adj, SabrFormulaAdjoint::default());
    }

    #[test]
    fn test_parameter_validation() {
        assert!(SabrPoint::new(-0.01, 0.5, 0.0, 0.3).is_err());
        assert!(SabrPoint::new(0.05, 1.5, 0.0, 0.3).is_err());
        assert!(SabrPoint::new(0.05, 0.5, 1.0, 0.3).is_err());
        assert!(SabrPoint::new(0.05, 0.5, 0.0, -0.3).is_err());
        assert!(SabrPoint::new(0.05, 0.5, 0.0, f64::NAN).is_err());
    }

    // ========================================
    // Adjoint Tests
    // ========================================

    #[test]
    fn test_adjoint_away_from_the_money() {
        check_adjoint(point(), 0.98, 0.95, 1.0, 1e-7);
        check_adjoint(point(), 0.98, 1.01, 2.5, 1e-7);
        check_adjoint(SabrPoint::new(0.02, 0.0, 0.3, 0.8).unwrap(), 0.98, 0.96, 0.5, 1e-7);
        check_adjoint(SabrPoint::new(0.2, 1.0, -0.6, 1.2).unwrap(), 0.98, 1.02, 0.75, 1e-7);
    }

    #[test]
    fn test_adjoint_at_the_money() {
        check_adjoint(point(), 0.98, 0.98, 1.0, 1e-5);
    }

    // ========================================
    // Surface Tests
    // ========================================

    fn surface() -> SabrVolatility {
        SabrVolatility::new(
            &[0.5, 1.0],
            &[0.0, 0.25],
            vec![vec![0.05, 0.06], vec![0.055, 0.065]],
            vec![vec![0.5, 0.5], vec![0.5, 0.5]],
            vec![vec![-0.2, -0.25], vec![-0.3, -0.35]],
            vec![vec![0.4, 0.45], vec![0.5, 0.55]],
        )
        .unwrap()
    }

    #[test]
    fn test_point_interpolation() {
        let p = surface().sabr_point(0.75, 0.125);
        assert_relative_eq!(p.alpha, 0.0575, epsilon = 1e-15);
        assert_relative_eq!(p.rho, -0.275, epsilon = 1e-15);
    }

    #[test]
    fn test_node_sensitivity_by_shift() {
        let sabr = surface();
        let q = VolatilityQuery::new(0.7, 0.1, 0.96, 0.98);
        let adj = sabr.volatility_adjoint(&q).unwrap();
        let h = 1e-7;
        for parameter in PARAMETERS {
            let node = ModelParameter::Sabr {
                parameter,
                row: 1,
                column: 0,
            };
            let up = sabr.with_shifted_parameter(&node, h).unwrap();
            let down = sabr.with_shifted_parameter(&node, -h).unwrap();
            let fd = (up.volatility(&q).unwrap() - down.volatility(&q).unwrap()) / (2.0 * h);
            assert_relative_eq!(adj.parameters.get(&node), fd, epsilon = 1e-6);
        }
        assert_eq!(sabr.parameters().len(), 16);
    }

    #[test]
    fn test_shift_outside_domain_rejected() {
        let sabr = SabrVolatility::flat(0.05, 1.0, 0.0, 0.3).unwrap();
        let beta = ModelParameter::Sabr {
            parameter: SabrParameter::Beta,
            row: 0,
            column: 0,
        };
        assert!(sabr.with_shifted_parameter(&beta, 0.1).is_err());
        assert!(sabr
            .with_shifted_parameter(&ModelParameter::FlatVolatility, 0.1)
            .is_err());
    }
}
