//! Interpolated volatility surfaces.
//!
//! The surfaces share one bilinear grid with flat extrapolation; they
//! differ in the second coordinate and in how the volatility is read:
//!
//! - [`BlackSurfaceExpiryStrike`]: strike price
//! - [`BlackSurfaceExpiryMoneyness`]: log-moneyness `ln(K/F)`
//! - [`BlackSurfaceExpiryDelay`]: delay between option expiry and the
//!   underlying's last trading date
//! - [`NormalSurfaceExpirySimpleMoneyness`]: simple moneyness, normal
//!   volatility
//!
//! The sensitivity to each grid node is its bilinear weight at the query.

use super::{unknown_parameter, VolatilityAdjoint, VolatilityModel, VolatilityQuery};
use crate::analytical::VolatilityType;
use crate::error::ModelError;
use futopt_core::math::interpolators::BilinearInterpolator;
use futopt_core::sensitivity::{ModelParameter, ModelParameterSensitivity};

#[derive(Debug, Clone)]
struct VolatilityGrid {
    grid: BilinearInterpolator<f64>,
}

impl VolatilityGrid {
    fn new(expiries: &[f64], columns: &[f64], volatilities: Vec<Vec<f64>>) -> Result<Self, ModelError> {
        if let Some(&bad) = volatilities
            .iter()
            .flatten()
            .find(|v| !(v.is_finite() && **v >= 0.0))
        {
            return Err(ModelError::InvalidParameter {
                name: "volatility",
                value: bad,
                constraint: "volatility >= 0",
            });
        }
        Ok(Self {
            grid: BilinearInterpolator::new(expiries, columns, volatilities)?,
        })
    }

    /// Volatility, `∂σ/∂column` and the node weights at `(expiry, column)`.
    fn adjoint(&self, expiry: f64, column: f64) -> (f64, f64, ModelParameterSensitivity) {
        let weights = self.grid.node_sensitivity(expiry, column);
        let volatility = weights
            .iter()
            .map(|&((i, j), w)| w * self.grid.zs()[i][j])
            .sum();
        let parameters = weights
            .into_iter()
            .map(|((row, column), w)| (ModelParameter::SurfaceNode { row, column }, w))
            .collect();
        (volatility, self.grid.derivative_y(expiry, column), parameters)
    }

    fn parameters(&self) -> Vec<(ModelParameter, f64)> {
        self.grid
            .zs()
            .iter()
            .enumerate()
            .flat_map(|(row, values)| {
                values
                    .iter()
                    .enumerate()
                    .map(move |(column, &v)| (ModelParameter::SurfaceNode { row, column }, v))
            })
            .collect()
    }

    fn shifted(&self, parameter: &ModelParameter, shift: f64, model: &'static str) -> Result<Self, ModelError> {
        match *parameter {
            ModelParameter::SurfaceNode { row, column } => Ok(Self {
                grid: self.grid.with_shifted_node(row, column, shift)?,
            }),
            ref other => Err(unknown_parameter(other, model)),
        }
    }
}

macro_rules! surface_accessors {
    ($name:ident, $axis:literal) => {
        impl $name {
            #[doc = concat!("Surface from expiries, ", $axis, " coordinates and `volatilities[expiry][column]`.")]
            pub fn new(
                expiries: &[f64],
                columns: &[f64],
                volatilities: Vec<Vec<f64>>,
            ) -> Result<Self, ModelError> {
                Ok(Self {
                    surface: VolatilityGrid::new(expiries, columns, volatilities)?,
                })
            }

            /// Expiry axis.
            pub fn expiries(&self) -> &[f64] {
                self.surface.grid.xs()
            }

            #[doc = concat!("Second axis (", $axis, ").")]
            pub fn columns(&self) -> &[f64] {
                self.surface.grid.ys()
            }

            /// Grid values, one row per expiry.
            pub fn volatilities(&self) -> &[Vec<f64>] {
                self.surface.grid.zs()
            }
        }
    };
}

/// Black volatility over (expiry, strike).
#[derive(Debug, Clone)]
pub struct BlackSurfaceExpiryStrike {
    surface: VolatilityGrid,
}

/// Black volatility over (expiry, log-moneyness `ln(K/F)`).
#[derive(Debug, Clone)]
pub struct BlackSurfaceExpiryMoneyness {
    surface: VolatilityGrid,
}

/// Black volatility over (expiry, delay).
#[derive(Debug, Clone)]
pub struct BlackSurfaceExpiryDelay {
    surface: VolatilityGrid,
}

surface_accessors!(BlackSurfaceExpiryStrike, "strike");
surface_accessors!(BlackSurfaceExpiryMoneyness, "log-moneyness");
surface_accessors!(BlackSurfaceExpiryDelay, "delay");

impl VolatilityModel for BlackSurfaceExpiryStrike {
    fn name(&self) -> &'static str {
        "BlackExpiryStrike"
    }

    fn volatility(&self, query: &VolatilityQuery) -> Result<f64, ModelError> {
        query.validate_lognormal()?;
        Ok(self.surface.grid.interpolate(query.expiry, query.strike))
    }

    fn volatility_adjoint(&self, query: &VolatilityQuery) -> Result<VolatilityAdjoint, ModelError> {
        query.validate_lognormal()?;
        let (volatility, d_column, parameters) = self.surface.adjoint(query.expiry, query.strike);
        Ok(VolatilityAdjoint {
            volatility,
            d_forward: 0.0,
            d_strike: d_column,
            parameters,
        })
    }

    fn parameters(&self) -> Vec<(ModelParameter, f64)> {
        self.surface.parameters()
    }

    fn with_shifted_parameter(&self, parameter: &ModelParameter, shift: f64) -> Result<Self, ModelError> {
        Ok(Self {
            surface: self.surface.shifted(parameter, shift, self.name())?,
        })
    }
}

impl VolatilityModel for BlackSurfaceExpiryMoneyness {
    fn name(&self) -> &'static str {
        "BlackExpiryMoneyness"
    }

    fn volatility(&self, query: &VolatilityQuery) -> Result<f64, ModelError> {
        query.validate_lognormal()?;
        let moneyness = (query.strike / query.forward).ln();
        Ok(self.surface.grid.interpolate(query.expiry, moneyness))
    }

    fn volatility_adjoint(&self, query: &VolatilityQuery) -> Result<VolatilityAdjoint, ModelError> {
        query.validate_lognormal()?;
        let moneyness = (query.strike / query.forward).ln();
        let (volatility, d_moneyness, parameters) = self.surface.adjoint(query.expiry, moneyness);
        Ok(VolatilityAdjoint {
            volatility,
            d_forward: -d_moneyness / query.forward,
            d_strike: d_moneyness / query.strike,
            parameters,
        })
    }

    fn parameters(&self) -> Vec<(ModelParameter, f64)> {
        self.surface.parameters()
    }

    fn with_shifted_parameter(&self, parameter: &ModelParameter, shift: f64) -> Result<Self, ModelError> {
        Ok(Self {
            surface: self.surface.shifted(parameter, shift, self.name())?,
        })
    }
}

impl VolatilityModel for BlackSurfaceExpiryDelay {
    fn name(&self) -> &'static str {
        "BlackExpiryDelay"
    }

    fn volatility(&self, query: &VolatilityQuery) -> Result<f64, ModelError> {
        query.validate_lognormal()?;
        Ok(self.surface.grid.interpolate(query.expiry, query.delay))
    }

    fn volatility_adjoint(&self, query: &VolatilityQuery) -> Result<VolatilityAdjoint, ModelError> {
        query.validate_lognormal()?;
        let (volatility, _, parameters) = self.surface.adjoint(query.expiry, query.delay);
        Ok(VolatilityAdjoint {
            volatility,
            d_forward: 0.0,
            d_strike: 0.0,
            parameters,
        })
    }

    fn parameters(&self) -> Vec<(ModelParameter, f64)> {
        self.surface.parameters()
    }

    fn with_shifted_parameter(&self, parameter: &ModelParameter, shift: f64) -> Result<Self, ModelError> {
        Ok(Self {
            surface: self.surface.shifted(parameter, shift, self.name())?,
        })
    }
}

/// Normal volatility over (expiry, simple moneyness).
///
/// Moneyness is taken on the rate, `(1 − K) − (1 − F) = F − K`, unless the
/// surface is built with `moneyness_on_price`, in which case it is `K − F`.
/// Rates and strikes of any sign are accepted.
///
/// # Examples
/// ```
/// use futopt_models::analytical::VolatilityType;
/// use futopt_models::volatility::{NormalSurfaceExpirySimpleMoneyness, VolatilityModel, VolatilityQuery};
///
/// let surface = NormalSurfaceExpirySimpleMoneyness::new(
///     &[0.25, 1.0],
///     &[-0.005, 0.0, 0.005],
///     vec![vec![0.009, 0.008, 0.0085], vec![0.0075, 0.007, 0.0072]],
///     false,
/// )
/// .unwrap();
/// // K = 1.01 above par: negative strike rate
/// let query = VolatilityQuery::new(0.25, 0.0, 1.01, 1.005);
/// assert!((surface.volatility(&query).unwrap() - 0.009).abs() < 1e-15);
/// assert_eq!(surface.volatility_type(), VolatilityType::Normal);
/// ```
#[derive(Debug, Clone)]
pub struct NormalSurfaceExpirySimpleMoneyness {
    surface: VolatilityGrid,
    moneyness_on_price: bool,
}

impl NormalSurfaceExpirySimpleMoneyness {
    /// Surface from expiries, simple moneyness coordinates and
    /// `volatilities[expiry][column]`.
    pub fn new(
        expiries: &[f64],
        columns: &[f64],
        volatilities: Vec<Vec<f64>>,
        moneyness_on_price: bool,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            surface: VolatilityGrid::new(expiries, columns, volatilities)?,
            moneyness_on_price,
        })
    }

    /// Expiry axis.
    pub fn expiries(&self) -> &[f64] {
        self.surface.grid.xs()
    }

    /// Second axis (simple moneyness).
    pub fn columns(&self) -> &[f64] {
        self.surface.grid.ys()
    }

    /// Grid values, one row per expiry.
    pub fn volatilities(&self) -> &[Vec<f64>] {
        self.surface.grid.zs()
    }

    /// Whether moneyness is `K − F` rather than `F − K`.
    pub fn moneyness_on_price(&self) -> bool {
        self.moneyness_on_price
    }

    /// `∂moneyness/∂F`; the strike derivative is its negative.
    fn moneyness_slope(&self) -> f64 {
        if self.moneyness_on_price {
            -1.0
        } else {
            1.0
        }
    }

    fn moneyness(&self, query: &VolatilityQuery) -> f64 {
        self.moneyness_slope() * (query.forward - query.strike)
    }
}

impl VolatilityModel for NormalSurfaceExpirySimpleMoneyness {
    fn name(&self) -> &'static str {
        "NormalExpirySimpleMoneyness"
    }

    fn volatility_type(&self) -> VolatilityType {
        VolatilityType::Normal
    }

    fn volatility(&self, query: &VolatilityQuery) -> Result<f64, ModelError> {
        query.validate_finite()?;
        Ok(self.surface.grid.interpolate(query.expiry, self.moneyness(query)))
    }

    fn volatility_adjoint(&self, query: &VolatilityQuery) -> Result<VolatilityAdjoint, ModelError> {
        query.validate_finite()?;
        let (volatility, d_moneyness, parameters) = self.surface.adjoint(query.expiry, self.moneyness(query));
        let slope = self.moneyness_slope();
        Ok(VolatilityAdjoint {
            volatility,
            d_forward: slope * d_moneyness,
            d_strike: -slope * d_moneyness,
            parameters,
        })
    }

    fn parameters(&self) -> Vec<(ModelParameter, f64)> {
        self.surface.parameters()
    }

    fn with_shifted_parameter(&self, parameter: &ModelParameter, shift: f64) -> Result<Self, ModelError> {
        Ok(Self {
            surface: self.surface.shifted(parameter, shift, self.name())?,
            moneyness_on_price: self.moneyness_on_price,
        })
    }
}

impl From<NormalSurfaceExpirySimpleMoneyness> for super::VolatilityModelEnum {
    fn from(model: NormalSurfaceExpirySimpleMoneyness) -> Self {
        super::VolatilityModelEnum::NormalExpirySimpleMoneyness(model)
    }
}

impl From<BlackSurfaceExpiryStrike> for super::VolatilityModelEnum {
    fn from(model: BlackSurfaceExpiryStrike) -> Self {
        super::VolatilityModelEnum::ExpiryStrike(model)
    }
}

impl From<BlackSurfaceExpiryMoneyness> for super::VolatilityModelEnum {
    fn from(model: BlackSurfaceExpiryMoneyness) -> Self {
        super::VolatilityModelEnum::ExpiryMoneyness(model)
    }
}

impl From<BlackSurfaceExpiryDelay> for super::VolatilityModelEnum {
    fn from(model: BlackSurfaceExpiryDelay) -> Self {
        super::VolatilityModelEnum::ExpiryDelay(model)
    }
}
