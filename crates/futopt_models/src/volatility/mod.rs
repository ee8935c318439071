//! Volatility models for options on futures.
//!
//! Every model answers the same question: the volatility at
//! `(expiry, delay, strike, forward)`, optionally with its derivatives with
//! respect to forward, strike and each of the model's own parameters. The
//! number is a Black volatility unless the model's
//! [`VolatilityModel::volatility_type`] says it is normal.
//! Pricing methods are generic over [`VolatilityModel`]; methods that need a
//! specific parameterisation bound on [`SabrParameterAccess`] or
//! [`SsviParameterAccess`] instead.
//!
//! | Model | Grid / parameters |
//! |-------|-------------------|
//! | [`FlatVolatility`] | one number |
//! | [`BlackSurfaceExpiryStrike`] | (expiry, strike) |
//! | [`BlackSurfaceExpiryMoneyness`] | (expiry, ln(K/F)) |
//! | [`BlackSurfaceExpiryDelay`] | (expiry, last trading − expiry) |
//! | [`SabrVolatility`] | α, β, ρ, ν over (expiry, delay) |
//! | [`SsviVolatility`] | ATM volatility curve, ρ, η |
//! | [`NormalSurfaceExpirySimpleMoneyness`] | (expiry, F − K or K − F), normal |

mod flat;
mod sabr;
mod ssvi;
mod surface;

pub use flat::FlatVolatility;
pub use sabr::{
    hagan_volatility, hagan_volatility_adjoint, SabrFormulaAdjoint, SabrPoint, SabrVolatility,
};
pub use ssvi::{SsviVolatility, SsviVolatilityAdjoint};
pub use surface::{
    BlackSurfaceExpiryDelay, BlackSurfaceExpiryMoneyness, BlackSurfaceExpiryStrike,
    NormalSurfaceExpirySimpleMoneyness,
};

use crate::analytical::VolatilityType;
use crate::error::ModelError;
use futopt_core::sensitivity::{ModelParameter, ModelParameterSensitivity};
use std::fmt::Debug;

/// Point at which a volatility is requested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolatilityQuery {
    /// Option expiry (years)
    pub expiry: f64,
    /// Underlying last trading time minus option expiry (years)
    pub delay: f64,
    /// Strike price
    pub strike: f64,
    /// Underlying futures price
    pub forward: f64,
}

impl VolatilityQuery {
    /// Creates a query.
    pub fn new(expiry: f64, delay: f64, strike: f64, forward: f64) -> Self {
        Self {
            expiry,
            delay,
            strike,
            forward,
        }
    }

    /// Copy with the forward replaced.
    pub fn with_forward(&self, forward: f64) -> Self {
        Self { forward, ..*self }
    }

    /// Copy with the strike replaced.
    pub fn with_strike(&self, strike: f64) -> Self {
        Self { strike, ..*self }
    }

    /// Checks that every coordinate is finite.
    pub(crate) fn validate_finite(&self) -> Result<(), ModelError> {
        if !self.expiry.is_finite() || !self.delay.is_finite() {
            return Err(ModelError::InvalidQuery(format!(
                "expiry {} and delay {} must be finite",
                self.expiry, self.delay
            )));
        }
        if !self.strike.is_finite() || !self.forward.is_finite() {
            return Err(ModelError::InvalidQuery(format!(
                "strike {} and forward {} must be finite",
                self.strike, self.forward
            )));
        }
        Ok(())
    }

    /// Checks that strike and forward are positive and expiry is finite.
    pub(crate) fn validate_lognormal(&self) -> Result<(), ModelError> {
        self.validate_finite()?;
        if !(self.strike > 0.0) {
            return Err(ModelError::InvalidQuery(format!(
                "strike must be positive, got {}",
                self.strike
            )));
        }
        if !(self.forward > 0.0) {
            return Err(ModelError::InvalidQuery(format!(
                "forward must be positive, got {}",
                self.forward
            )));
        }
        Ok(())
    }
}

/// Volatility with its first order derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct VolatilityAdjoint {
    /// Black volatility
    pub volatility: f64,
    /// ∂σ/∂F
    pub d_forward: f64,
    /// ∂σ/∂K
    pub d_strike: f64,
    /// ∂σ/∂p for every model parameter `p` the point depends on
    pub parameters: ModelParameterSensitivity,
}

impl VolatilityAdjoint {
    /// Volatility that depends on nothing.
    pub(crate) fn zero() -> Self {
        Self {
            volatility: 0.0,
            d_forward: 0.0,
            d_strike: 0.0,
            parameters: ModelParameterSensitivity::new(),
        }
    }
}

/// Common interface of all volatility models.
pub trait VolatilityModel: Debug + Send + Sync {
    /// Short model name used in error messages.
    fn name(&self) -> &'static str;

    /// Whether [`Self::volatility`] is a Black or a normal volatility.
    fn volatility_type(&self) -> VolatilityType {
        VolatilityType::Lognormal
    }

    /// Black volatility at `query`.
    fn volatility(&self, query: &VolatilityQuery) -> Result<f64, ModelError>;

    /// Black volatility and its derivatives at `query`.
    fn volatility_adjoint(&self, query: &VolatilityQuery) -> Result<VolatilityAdjoint, ModelError>;

    /// Every individually addressable parameter with its current value.
    fn parameters(&self) -> Vec<(ModelParameter, f64)>;

    /// A new model with `parameter` moved by `shift`.
    fn with_shifted_parameter(&self, parameter: &ModelParameter, shift: f64) -> Result<Self, ModelError>
    where
        Self: Sized;
}

/// Models parameterised by SABR parameters.
pub trait SabrParameterAccess: VolatilityModel {
    /// Interpolated SABR parameters at `(expiry, delay)`.
    fn sabr_point(&self, expiry: f64, delay: f64) -> SabrPoint;

    /// Volatility with derivatives with respect to forward, strike and the
    /// four SABR parameters at the query point.
    fn sabr_adjoint(&self, query: &VolatilityQuery) -> Result<SabrFormulaAdjoint, ModelError> {
        query.validate_lognormal()?;
        let point = self.sabr_point(query.expiry, query.delay);
        Ok(hagan_volatility_adjoint(&point, query.forward, query.strike, query.expiry))
    }
}

/// Models parameterised as SSVI.
pub trait SsviParameterAccess: VolatilityModel {
    /// At-the-money volatility at `expiry`.
    fn atm_volatility(&self, expiry: f64) -> Result<f64, ModelError>;

    /// Correlation parameter.
    fn rho(&self) -> f64;

    /// Curvature parameter.
    fn eta(&self) -> f64;

    /// Volatility with derivatives with respect to forward, strike, the ATM
    /// curve nodes, ρ and η.
    fn ssvi_adjoint(&self, query: &VolatilityQuery) -> Result<SsviVolatilityAdjoint, ModelError>;
}

/// Any of the supported volatility models.
///
/// Delegates [`VolatilityModel`] to the held model. Model-specific accessors
/// fail with [`ModelError::ModelMismatch`] on the wrong variant.
#[derive(Debug, Clone)]
pub enum VolatilityModelEnum {
    /// Single volatility
    Flat(FlatVolatility),
    /// Surface over (expiry, strike)
    ExpiryStrike(BlackSurfaceExpiryStrike),
    /// Surface over (expiry, log-moneyness)
    ExpiryMoneyness(BlackSurfaceExpiryMoneyness),
    /// Surface over (expiry, delay)
    ExpiryDelay(BlackSurfaceExpiryDelay),
    /// SABR parameters over (expiry, delay)
    Sabr(SabrVolatility),
    /// SSVI
    Ssvi(SsviVolatility),
    /// Normal surface over (expiry, simple moneyness)
    NormalExpirySimpleMoneyness(NormalSurfaceExpirySimpleMoneyness),
}

macro_rules! delegate {
    ($self:ident, $model:ident => $body:expr) => {
        match $self {
            VolatilityModelEnum::Flat($model) => $body,
            VolatilityModelEnum::ExpiryStrike($model) => $body,
            VolatilityModelEnum::ExpiryMoneyness($model) => $body,
            VolatilityModelEnum::ExpiryDelay($model) => $body,
            VolatilityModelEnum::Sabr($model) => $body,
            VolatilityModelEnum::Ssvi($model) => $body,
            VolatilityModelEnum::NormalExpirySimpleMoneyness($model) => $body,
        }
    };
}

impl VolatilityModelEnum {
    /// The SABR model held, if any.
    pub fn as_sabr(&self) -> Result<&SabrVolatility, ModelError> {
        match self {
            VolatilityModelEnum::Sabr(model) => Ok(model),
            other => Err(ModelError::ModelMismatch {
                expected: "SABR",
                found: other.name(),
            }),
        }
    }

    /// The SSVI model held, if any.
    pub fn as_ssvi(&self) -> Result<&SsviVolatility, ModelError> {
        match self {
            VolatilityModelEnum::Ssvi(model) => Ok(model),
            other => Err(ModelError::ModelMismatch {
                expected: "SSVI",
                found: other.name(),
            }),
        }
    }

    /// SABR parameters at `(expiry, delay)`; SABR variant only.
    pub fn sabr_point(&self, expiry: f64, delay: f64) -> Result<SabrPoint, ModelError> {
        Ok(self.as_sabr()?.sabr_point(expiry, delay))
    }

    /// SSVI correlation; SSVI variant only.
    pub fn ssvi_rho(&self) -> Result<f64, ModelError> {
        Ok(self.as_ssvi()?.rho())
    }

    /// SSVI curvature; SSVI variant only.
    pub fn ssvi_eta(&self) -> Result<f64, ModelError> {
        Ok(self.as_ssvi()?.eta())
    }
}

impl VolatilityModel for VolatilityModelEnum {
    fn name(&self) -> &'static str {
        delegate!(self, m => m.name())
    }

    fn volatility_type(&self) -> VolatilityType {
        delegate!(self, m => m.volatility_type())
    }

    fn volatility(&self, query: &VolatilityQuery) -> Result<f64, ModelError> {
        delegate!(self, m => m.volatility(query))
    }

    fn volatility_adjoint(&self, query: &VolatilityQuery) -> Result<VolatilityAdjoint, ModelError> {
        delegate!(self, m => m.volatility_adjoint(query))
    }

    fn parameters(&self) -> Vec<(ModelParameter, f64)> {
        delegate!(self, m => m.parameters())
    }

    fn with_shifted_parameter(&self, parameter: &ModelParameter, shift: f64) -> Result<Self, ModelError> {
        Ok(match self {
            VolatilityModelEnum::Flat(m) => {
                VolatilityModelEnum::Flat(m.with_shifted_parameter(parameter, shift)?)
            }
            VolatilityModelEnum::ExpiryStrike(m) => {
                VolatilityModelEnum::ExpiryStrike(m.with_shifted_parameter(parameter, shift)?)
            }
            VolatilityModelEnum::ExpiryMoneyness(m) => {
                VolatilityModelEnum::ExpiryMoneyness(m.with_shifted_parameter(parameter, shift)?)
            }
            VolatilityModelEnum::ExpiryDelay(m) => {
                VolatilityModelEnum::ExpiryDelay(m.with_shifted_parameter(parameter, shift)?)
            }
            VolatilityModelEnum::Sabr(m) => {
                VolatilityModelEnum::Sabr(m.with_shifted_parameter(parameter, shift)?)
            }
            VolatilityModelEnum::Ssvi(m) => {
                VolatilityModelEnum::Ssvi(m.with_shifted_parameter(parameter, shift)?)
            }
            VolatilityModelEnum::NormalExpirySimpleMoneyness(m) => {
                VolatilityModelEnum::NormalExpirySimpleMoneyness(m.with_shifted_parameter(parameter, shift)?)
            }
        })
    }
}

impl From<FlatVolatility> for VolatilityModelEnum {
    fn from(model: FlatVolatility) -> Self {
        VolatilityModelEnum::Flat(model)
    }
}

impl From<SabrVolatility> for VolatilityModelEnum {
    fn from(model: SabrVolatility) -> Self {
        VolatilityModelEnum::Sabr(model)
    }
}

impl From<SsviVolatility> for VolatilityModelEnum {
    fn from(model: SsviVolatility) -> Self {
        VolatilityModelEnum::Ssvi(model)
    }
}

/// Unknown-parameter error for `model`.
pub(crate) fn unknown_parameter(parameter: &ModelParameter, model: &'static str) -> ModelError {
    ModelError::UnknownParameter {
        parameter: parameter.to_string(),
        model,
    }
}
