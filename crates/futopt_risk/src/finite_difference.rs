//! Bump-and-revalue sensitivities.
//!
//! Every bump builds a fresh provider from the base snapshot and calls a
//! pure evaluator on it. The base provider is never mutated, so bumps run
//! on the rayon pool once their count reaches the parallel threshold.

use crate::config::{ConfigError, SensitivityConfig};
use crate::error::SensitivityError;
use crate::parallel::ParallelConfig;
use futopt_core::market_data::{CurveProvider, MulticurveProvider, YieldCurve};
use futopt_core::math::FiniteDifferenceDifferentiator;
use futopt_core::sensitivity::{CurveParameterSensitivity, ModelParameter, ModelParameterSensitivity};
use futopt_models::volatility::VolatilityModel;
use futopt_pricing::futures::HullWhiteProvider;
use futopt_pricing::providers::BlackFuturesProvider;
use tracing::debug;

/// Market data whose curves can be replaced wholesale.
pub trait CurveMarket: Sync {
    /// The curves.
    fn multicurve(&self) -> &MulticurveProvider;

    /// A copy holding `curves` instead.
    fn with_multicurve(&self, curves: MulticurveProvider) -> Self
    where
        Self: Sized;
}

impl CurveMarket for MulticurveProvider {
    fn multicurve(&self) -> &MulticurveProvider {
        self
    }

    fn with_multicurve(&self, curves: MulticurveProvider) -> Self {
        curves
    }
}

impl<V: VolatilityModel + Clone> CurveMarket for BlackFuturesProvider<V> {
    fn multicurve(&self) -> &MulticurveProvider {
        self.curves()
    }

    fn with_multicurve(&self, curves: MulticurveProvider) -> Self {
        self.with_curves(curves)
    }
}

impl CurveMarket for HullWhiteProvider {
    fn multicurve(&self) -> &MulticurveProvider {
        self.curves()
    }

    fn with_multicurve(&self, curves: MulticurveProvider) -> Self {
        self.with_curves(curves)
    }
}

fn bump_all<T, F>(
    differentiator: &FiniteDifferenceDifferentiator,
    parallel: &ParallelConfig,
    bumps: &[T],
    bumped_value: F,
) -> Result<Vec<f64>, SensitivityError>
where
    T: Sync,
    F: Fn(&T, f64) -> Result<f64, SensitivityError> + Sync + Send,
{
    parallel
        .map(bumps, |bump| differentiator.derivative_at_zero(|s| bumped_value(bump, s)))
        .into_iter()
        .collect()
}

/// Bucketed curve sensitivities by bumping each node's zero rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FiniteDifferenceCurveCalculator {
    differentiator: FiniteDifferenceDifferentiator,
    parallel: ParallelConfig,
}

impl FiniteDifferenceCurveCalculator {
    /// Creates a calculator.
    pub fn new(differentiator: FiniteDifferenceDifferentiator, parallel: ParallelConfig) -> Self {
        Self {
            differentiator,
            parallel,
        }
    }

    /// Calculator with the configured shift, scheme and parallelism.
    pub fn from_config(config: &SensitivityConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.differentiator()?, config.parallel))
    }

    /// `∂value/∂node` for every node of every curve in `market`.
    ///
    /// # Examples
    /// ```
    /// use futopt_core::market_data::{CurveProvider, InterpolatedCurve, MulticurveProvider};
    /// use futopt_core::types::Currency;
    /// use futopt_risk::FiniteDifferenceCurveCalculator;
    ///
    /// let curves = MulticurveProvider::new().with_discount_curve(
    ///     Currency::EUR,
    ///     "EUR-DSC",
    ///     InterpolatedCurve::linear(&[1.0, 3.0], &[0.01, 0.02]).unwrap(),
    /// );
    /// let fd = FiniteDifferenceCurveCalculator::default()
    ///     .calculate(&curves, |c: &MulticurveProvider| c.discount_factor(Currency::EUR, 3.0))
    ///     .unwrap();
    /// let d3 = curves.discount_factor(Currency::EUR, 3.0).unwrap();
    /// assert!((fd.get("EUR-DSC").unwrap()[1] + 3.0 * d3).abs() < 1e-8);
    /// ```
    pub fn calculate<M, F, E>(&self, market: &M, evaluator: F) -> Result<CurveParameterSensitivity, SensitivityError>
    where
        M: CurveMarket,
        F: Fn(&M) -> Result<f64, E> + Sync,
        SensitivityError: From<E>,
    {
        let curves = market.multicurve();
        let mut bumps: Vec<(&str, usize)> = Vec::new();
        for name in curves.curve_names() {
            let count = curves.curve(name)?.node_count();
            bumps.extend((0..count).map(|node| (name, node)));
        }
        debug!(
            bumps = bumps.len(),
            parallel = self.parallel.should_parallelize(bumps.len()),
            "curve finite-difference sweep"
        );

        let values = bump_all(&self.differentiator, &self.parallel, &bumps, |&(name, node), s| {
            let bumped = market.with_multicurve(curves.with_bumped_node(name, node, s)?);
            Ok(evaluator(&bumped)?)
        })?;

        let mut result = CurveParameterSensitivity::new();
        let mut offset = 0;
        for name in curves.curve_names() {
            let count = curves.curve(name)?.node_count();
            result.add_values(name, &values[offset..offset + count]);
            offset += count;
        }
        Ok(result)
    }

    /// `∂value/∂node` for a single named curve.
    pub fn calculate_curve<M, F, E>(&self, market: &M, curve: &str, evaluator: F) -> Result<Vec<f64>, SensitivityError>
    where
        M: CurveMarket,
        F: Fn(&M) -> Result<f64, E> + Sync,
        SensitivityError: From<E>,
    {
        let curves = market.multicurve();
        let nodes: Vec<usize> = (0..curves.curve(curve)?.node_count()).collect();
        bump_all(&self.differentiator, &self.parallel, &nodes, |&node, s| {
            let bumped = market.with_multicurve(curves.with_bumped_node(curve, node, s)?);
            Ok(evaluator(&bumped)?)
        })
    }

    /// `∂value/∂shift` for a parallel shift of one curve.
    pub fn calculate_parallel<M, F, E>(&self, market: &M, curve: &str, evaluator: F) -> Result<f64, SensitivityError>
    where
        M: CurveMarket,
        F: Fn(&M) -> Result<f64, E>,
        SensitivityError: From<E>,
    {
        let curves = market.multicurve();
        self.differentiator.derivative_at_zero(|s| {
            let bumped = market.with_multicurve(curves.with_parallel_shift(curve, s)?);
            Ok(evaluator(&bumped)?)
        })
    }
}

/// Sensitivities to every parameter of the volatility model of a
/// [`BlackFuturesProvider`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FiniteDifferenceModelCalculator {
    differentiator: FiniteDifferenceDifferentiator,
    parallel: ParallelConfig,
}

impl FiniteDifferenceModelCalculator {
    /// Creates a calculator.
    pub fn new(differentiator: FiniteDifferenceDifferentiator, parallel: ParallelConfig) -> Self {
        Self {
            differentiator,
            parallel,
        }
    }

    /// Calculator with the configured shift, scheme and parallelism.
    pub fn from_config(config: &SensitivityConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.differentiator()?, config.parallel))
    }

    /// `∂value/∂p` for every `p` in `VolatilityModel::parameters()`.
    pub fn calculate<V, F, E>(
        &self,
        provider: &BlackFuturesProvider<V>,
        evaluator: F,
    ) -> Result<ModelParameterSensitivity, SensitivityError>
    where
        V: VolatilityModel,
        F: Fn(&BlackFuturesProvider<V>) -> Result<f64, E> + Sync,
        SensitivityError: From<E>,
    {
        let parameters: Vec<ModelParameter> = provider
            .volatility()
            .parameters()
            .into_iter()
            .map(|(p, _)| p)
            .collect();
        debug!(
            model = provider.volatility().name(),
            bumps = parameters.len(),
            "volatility finite-difference sweep"
        );
        self.calculate_parameters(provider, &parameters, evaluator)
    }

    /// `∂value/∂p` for the listed parameters only.
    pub fn calculate_parameters<V, F, E>(
        &self,
        provider: &BlackFuturesProvider<V>,
        parameters: &[ModelParameter],
        evaluator: F,
    ) -> Result<ModelParameterSensitivity, SensitivityError>
    where
        V: VolatilityModel,
        F: Fn(&BlackFuturesProvider<V>) -> Result<f64, E> + Sync,
        SensitivityError: From<E>,
    {
        let values = bump_all(&self.differentiator, &self.parallel, parameters, |p, s| {
            let model = provider.volatility().with_shifted_parameter(p, s)?;
            Ok(evaluator(&provider.with_volatility(model))?)
        })?;
        Ok(parameters.iter().copied().zip(values).collect())
    }
}

/// Sensitivities to the piecewise-constant Hull-White volatilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct FiniteDifferenceHullWhiteCalculator {
    differentiator: FiniteDifferenceDifferentiator,
    parallel: ParallelConfig,
}

impl FiniteDifferenceHullWhiteCalculator {
    /// Creates a calculator.
    pub fn new(differentiator: FiniteDifferenceDifferentiator, parallel: ParallelConfig) -> Self {
        Self {
            differentiator,
            parallel,
        }
    }

    /// Calculator with the configured shift, scheme and parallelism.
    pub fn from_config(config: &SensitivityConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.differentiator()?, config.parallel))
    }

    /// `∂value/∂σ_k` for every volatility period `k`.
    pub fn calculate<F, E>(&self, provider: &HullWhiteProvider, evaluator: F) -> Result<ModelParameterSensitivity, SensitivityError>
    where
        F: Fn(&HullWhiteProvider) -> Result<f64, E> + Sync,
        SensitivityError: From<E>,
    {
        let parameters: Vec<ModelParameter> = provider
            .parameters()
            .parameters()
            .into_iter()
            .map(|(p, _)| p)
            .collect();
        debug!(bumps = parameters.len(), "hull-white finite-difference sweep");
        let values = bump_all(&self.differentiator, &self.parallel, &parameters, |p, s| {
            let shifted = provider.parameters().with_shifted_parameter(p, s)?;
            Ok(evaluator(&provider.with_parameters(shifted))?)
        })?;
        Ok(parameters.into_iter().zip(values).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use futopt_core::market_data::InterpolatedCurve;
    use futopt_core::math::FiniteDifferenceType;
    use futopt_core::types::{Currency, PricingError};
    use futopt_models::volatility::{SsviParameterAccess, SsviVolatility};

    fn curves() -> MulticurveProvider {
        MulticurveProvider::new().with_discount_curve(
            Currency::EUR,
            "EUR-DSC",
            InterpolatedCurve::linear(&[0.5, 1.0, 2.0, 5.0], &[0.01, 0.012, 0.015, 0.02]).unwrap(),
        )
    }

    fn annuity(c: &MulticurveProvider) -> Result<f64, PricingError> {
        let mut sum = 0.0;
        for t in [0.5, 1.0, 1.5, 2.0] {
            sum += c.discount_factor(Currency::EUR, t)?;
        }
        Ok(sum)
    }

    #[test]
    fn test_curve_nodes_match_closed_form() {
        let c = curves();
        let fd = FiniteDifferenceCurveCalculator::default()
            .calculate(&c, annuity)
            .unwrap();
        let values = fd.get("EUR-DSC").unwrap();
        let d = |t: f64| c.discount_factor(Currency::EUR, t).unwrap();
        // t = 1.5 sits halfway between the 1.0 and 2.0 nodes
        let expected = [-0.5 * d(0.5), -d(1.0) - 0.75 * d(1.5), -2.0 * d(2.0) - 0.75 * d(1.5), 0.0];
        for (a, e) in values.iter().zip(expected) {
            assert_relative_eq!(*a, e, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let c = curves();
        let d = FiniteDifferenceDifferentiator::new(1e-6, FiniteDifferenceType::Forward).unwrap();
        let parallel = FiniteDifferenceCurveCalculator::new(d, ParallelConfig::new(1, 1))
            .calculate(&c, annuity)
            .unwrap();
        let sequential = FiniteDifferenceCurveCalculator::new(d, ParallelConfig::sequential())
            .calculate(&c, annuity)
            .unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_parallel_shift_equals_bucket_total() {
        let c = curves();
        let calc = FiniteDifferenceCurveCalculator::default();
        let buckets = calc.calculate_curve(&c, "EUR-DSC", annuity).unwrap();
        let parallel = calc.calculate_parallel(&c, "EUR-DSC", annuity).unwrap();
        assert_relative_eq!(buckets.iter().sum::<f64>(), parallel, epsilon = 1e-7);
    }

    #[test]
    fn test_unknown_curve() {
        assert!(FiniteDifferenceCurveCalculator::default()
            .calculate_curve(&curves(), "USD-DSC", annuity)
            .is_err());
    }

    #[test]
    fn test_model_parameters_bumped() {
        let ssvi = SsviVolatility::new(&[0.0, 1.0, 5.0], &[0.2, 0.22, 0.25], 0.3, 0.6).unwrap();
        let provider = BlackFuturesProvider::new(curves(), ssvi);
        // depends on rho only
        let fd = FiniteDifferenceModelCalculator::default()
            .calculate(&provider, |p: &BlackFuturesProvider<SsviVolatility>| {
                Ok::<_, PricingError>(3.0 * p.volatility().rho())
            })
            .unwrap();
        assert_relative_eq!(fd.get(&ModelParameter::SsviRho), 3.0, epsilon = 1e-8);
        assert_eq!(fd.get(&ModelParameter::SsviEta), 0.0);
        assert_eq!(fd.len(), 5);
    }
}
