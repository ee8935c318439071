//! Constant volatility.

use super::{unknown_parameter, VolatilityAdjoint, VolatilityModel, VolatilityQuery};
use crate::error::ModelError;
use futopt_core::sensitivity::{ModelParameter, ModelParameterSensitivity};

/// The same Black volatility for every expiry and strike.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlatVolatility {
    volatility: f64,
}

impl FlatVolatility {
    /// Creates a flat model; the volatility must be finite and non-negative.
    pub fn new(volatility: f64) -> Result<Self, ModelError> {
        if !(volatility.is_finite() && volatility >= 0.0) {
            return Err(ModelError::InvalidParameter {
                name: "volatility",
                value: volatility,
                constraint: "volatility >= 0",
            });
        }
        Ok(Self { volatility })
    }

    /// The volatility.
    pub fn value(&self) -> f64 {
        self.volatility
    }
}

impl VolatilityModel for FlatVolatility {
    fn name(&self) -> &'static str {
        "Flat"
    }

    fn volatility(&self, _query: &VolatilityQuery) -> Result<f64, ModelError> {
        Ok(self.volatility)
    }

    fn volatility_adjoint(&self, _query: &VolatilityQuery) -> Result<VolatilityAdjoint, ModelError> {
        Ok(VolatilityAdjoint {
            volatility: self.volatility,
            d_forward: 0.0,
            d_strike: 0.0,
            parameters: ModelParameterSensitivity::of(ModelParameter::FlatVolatility, 1.0),
        })
    }

    fn parameters(&self) -> Vec<(ModelParameter, f64)> {
        vec![(ModelParameter::FlatVolatility, self.volatility)]
    }

    fn with_shifted_parameter(&self, parameter: &ModelParameter, shift: f64) -> Result<Self, ModelError> {
        match parameter {
            ModelParameter::FlatVolatility => Self::new(self.volatility + shift),
            other => Err(unknown_parameter(other, self.name())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_ignores_query() {
        let flat = FlatVolatility::new(0.3).unwrap();
        let a = flat.volatility(&VolatilityQuery::new(0.1, 0.0, 0.9, 1.0)).unwrap();
        let b = flat.volatility(&VolatilityQuery::new(5.0, 1.0, 1.1, 0.95)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_flat_adjoint_has_single_parameter() {
        let flat = FlatVolatility::new(0.3).unwrap();
        let adj = flat
            .volatility_adjoint(&VolatilityQuery::new(1.0, 0.0, 1.0, 1.0))
            .unwrap();
        assert_eq!(adj.parameters.len(), 1);
        assert_eq!(adj.parameters.get(&ModelParameter::FlatVolatility), 1.0);
        assert_eq!(adj.d_forward, 0.0);
    }

    #[test]
    fn test_negative_volatility_rejected() {
        assert!(FlatVolatility::new(-0.01).is_err());
        assert!(FlatVolatility::new(f64::INFINITY).is_err());
        let flat = FlatVolatility::new(0.01).unwrap();
        assert!(flat
            .with_shifted_parameter(&ModelParameter::SsviRho, 0.1)
            .is_err());
    }
}
