//! SSVI volatility.
//!
//! ```text
//! θ(T) = σ_atm(T)² T,  φ = η / √θ,  k = ln(K/F)
//! w    = θ/2 · (1 + ρφk + √((φk + ρ)² + 1 - ρ²))
//! σ    = √(w / T)
//! ```
//!
//! `σ_atm` is interpolated linearly between curve nodes with flat
//! extrapolation. Expiries with `θ(T) <= 0` have zero volatility.

use super::{unknown_parameter, SsviParameterAccess, VolatilityAdjoint, VolatilityModel, VolatilityQuery};
use crate::error::ModelError;
use futopt_core::math::interpolators::{Interpolator, LinearInterpolator};
use futopt_core::sensitivity::{ModelParameter, ModelParameterSensitivity};
use tracing::trace;

/// SSVI volatility with its derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct SsviVolatilityAdjoint {
    /// Black volatility
    pub volatility: f64,
    /// ∂σ/∂F
    pub d_forward: f64,
    /// ∂σ/∂K
    pub d_strike: f64,
    /// ∂σ/∂σ_atm,j for each ATM curve node
    pub d_atm_volatility: Vec<f64>,
    /// ∂σ/∂ρ
    pub d_rho: f64,
    /// ∂σ/∂η
    pub d_eta: f64,
}

/// SSVI parameterisation: ATM volatility curve, correlation and curvature.
#[derive(Debug, Clone)]
pub struct SsviVolatility {
    atm: LinearInterpolator<f64>,
    rho: f64,
    eta: f64,
}

impl SsviVolatility {
    /// Model from ATM volatility nodes `(times, atm_volatilities)`, `|ρ| < 1`, `η > 0`.
    pub fn new(times: &[f64], atm_volatilities: &[f64], rho: f64, eta: f64) -> Result<Self, ModelError> {
        if let Some(&bad) = atm_volatilities
            .iter()
            .find(|v| !(v.is_finite() && **v >= 0.0))
        {
            return Err(ModelError::InvalidParameter {
                name: "atm_volatility",
                value: bad,
                constraint: "atm_volatility >= 0",
            });
        }
        Self::from_parts(
            LinearInterpolator::with_flat_extrapolation(times, atm_volatilities)?,
            rho,
            eta,
        )
    }

    fn from_parts(atm: LinearInterpolator<f64>, rho: f64, eta: f64) -> Result<Self, ModelError> {
        if !(rho.is_finite() && rho.abs() < 1.0) {
            return Err(ModelError::InvalidParameter {
                name: "rho",
                value: rho,
                constraint: "-1 < rho < 1",
            });
        }
        if !(eta.is_finite() && eta > 0.0) {
            return Err(ModelError::InvalidParameter {
                name: "eta",
                value: eta,
                constraint: "eta > 0",
            });
        }
        Ok(Self { atm, rho, eta })
    }

    /// ATM curve node times.
    pub fn atm_times(&self) -> &[f64] {
        self.atm.xs()
    }

    /// ATM curve node volatilities.
    pub fn atm_volatilities(&self) -> &[f64] {
        self.atm.ys()
    }
}

impl VolatilityModel for SsviVolatility {
    fn name(&self) -> &'static str {
        "SSVI"
    }

    fn volatility(&self, query: &VolatilityQuery) -> Result<f64, ModelError> {
        Ok(self.ssvi_adjoint(query)?.volatility)
    }

    fn volatility_adjoint(&self, query: &VolatilityQuery) -> Result<VolatilityAdjoint, ModelError> {
        let adjoint = self.ssvi_adjoint(query)?;
        let mut parameters: ModelParameterSensitivity = adjoint
            .d_atm_volatility
            .iter()
            .enumerate()
            .filter(|(_, d)| **d != 0.0)
            .map(|(node, &d)| (ModelParameter::SsviAtmVolatility { node }, d))
            .collect();
        parameters.add_value(ModelParameter::SsviRho, adjoint.d_rho);
        parameters.add_value(ModelParameter::SsviEta, adjoint.d_eta);
        Ok(VolatilityAdjoint {
            volatility: adjoint.volatility,
            d_forward: adjoint.d_forward,
            d_strike: adjoint.d_strike,
            parameters,
        })
    }

    fn parameters(&self) -> Vec<(ModelParameter, f64)> {
        let mut out: Vec<_> = self
            .atm
            .ys()
            .iter()
            .enumerate()
            .map(|(node, &v)| (ModelParameter::SsviAtmVolatility { node }, v))
            .collect();
        out.push((ModelParameter::SsviRho, self.rho));
        out.push((ModelParameter::SsviEta, self.eta));
        out
    }

    fn with_shifted_parameter(&self, parameter: &ModelParameter, shift: f64) -> Result<Self, ModelError> {
        match *parameter {
            ModelParameter::SsviAtmVolatility { node } => {
                Self::from_parts(self.atm.with_shifted_node(node, shift)?, self.rho, self.eta)
            }
            ModelParameter::SsviRho => Self::from_parts(self.atm.clone(), self.rho + shift, self.eta),
            ModelParameter::SsviEta => Self::from_parts(self.atm.clone(), self.rho, self.eta + shift),
            ref other => Err(unknown_parameter(other, self.name())),
        }
    }
}

impl SsviParameterAccess for SsviVolatility {
    fn atm_volatility(&self, expiry: f64) -> Result<f64, ModelError> {
        Ok(self.atm.interpolate(expiry)?)
    }

    fn rho(&self) -> f64 {
        self.rho
    }

    fn eta(&self) -> f64 {
        self.eta
    }

    fn ssvi_adjoint(&self, query: &VolatilityQuery) -> Result<SsviVolatilityAdjoint, ModelError> {
        query.validate_lognormal()?;
        let t = query.expiry;
        let atm_vol = self.atm.interpolate(t)?;
        let theta = atm_vol * atm_vol * t;
        if t <= 0.0 || theta <= 0.0 {
            trace!(expiry = t, theta, "SSVI total variance not positive, volatility is zero");
            return Ok(SsviVolatilityAdjoint {
                volatility: 0.0,
                d_forward: 0.0,
                d_strike: 0.0,
                d_atm_volatility: vec![0.0; self.atm.len()],
                d_rho: 0.0,
                d_eta: 0.0,
            });
        }
        let rho = self.rho;
        let sqrt_theta = theta.sqrt();
        let phi = self.eta / sqrt_theta;
        let k = (query.strike / query.forward).ln();
        let u = phi * k + rho;
        let s = (u * u + 1.0 - rho * rho).sqrt();
        let w = 0.5 * theta * (1.0 + rho * phi * k + s);
        let volatility = (w / t).sqrt();

        // Reverse sweep
        let w_bar = 1.0 / (2.0 * volatility * t);
        let dw_dphi = 0.5 * theta * (rho * k + u * k / s);
        let dw_dk = 0.5 * theta * (rho * phi + u * phi / s);
        let dw_drho = 0.5 * theta * (phi * k + (u - rho) / s);
        let dw_dtheta = w / theta - dw_dphi * phi / (2.0 * theta);
        let atm_bar = w_bar * dw_dtheta * 2.0 * atm_vol * t;
        let weights = self.atm.node_sensitivity(t)?;

        Ok(SsviVolatilityAdjoint {
            volatility,
            d_forward: -w_bar * dw_dk / query.forward,
            d_strike: w_bar * dw_dk / query.strike,
            d_atm_volatility: weights.into_iter().map(|weight| weight * atm_bar).collect(),
            d_rho: w_bar * dw_drho,
            d_eta: w_bar * dw_dphi / sqrt_theta,
        })
    }
}
