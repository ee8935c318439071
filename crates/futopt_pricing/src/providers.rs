//! Market data bundles consumed by the option methods.

use futopt_core::market_data::MulticurveProvider;
use futopt_models::volatility::VolatilityModel;

/// Curves plus a volatility model for options on futures.
///
/// Despite the name, the model may quote normal volatilities; the option
/// methods read [`VolatilityModel::volatility_type`] to pick the kernel.
///
/// The model is a type parameter so that model-specific sensitivities
/// (`price_sabr_sensitivity`, `price_ssvi_sensitivity`) only exist where the
/// model supports them. Use
/// [`VolatilityModelEnum`](futopt_models::volatility::VolatilityModelEnum)
/// when the model is chosen at run time.
///
/// # Examples
/// ```
/// use futopt_core::market_data::{InterpolatedCurve, MulticurveProvider};
/// use futopt_core::types::Currency;
/// use futopt_models::volatility::FlatVolatility;
/// use futopt_pricing::providers::BlackFuturesProvider;
///
/// let curves = MulticurveProvider::new()
///     .with_discount_curve(Currency::USD, "USD-DSC", InterpolatedCurve::flat(0.01).unwrap());
/// let provider = BlackFuturesProvider::new(curves, FlatVolatility::new(0.2).unwrap());
/// assert_eq!(provider.volatility().value(), 0.2);
/// ```
#[derive(Debug, Clone)]
pub struct BlackFuturesProvider<V> {
    curves: MulticurveProvider,
    volatility: V,
}

impl<V: VolatilityModel> BlackFuturesProvider<V> {
    /// Provider from curves and a volatility model.
    pub fn new(curves: MulticurveProvider, volatility: V) -> Self {
        Self { curves, volatility }
    }

    /// Curves.
    pub fn curves(&self) -> &MulticurveProvider {
        &self.curves
    }

    /// Volatility model.
    pub fn volatility(&self) -> &V {
        &self.volatility
    }

    /// Same model on other curves.
    pub fn with_curves(&self, curves: MulticurveProvider) -> Self
    where
        V: Clone,
    {
        Self {
            curves,
            volatility: self.volatility.clone(),
        }
    }

    /// Same curves with another model, possibly of another type.
    pub fn with_volatility<W: VolatilityModel>(&self, volatility: W) -> BlackFuturesProvider<W> {
        BlackFuturesProvider {
            curves: self.curves.clone(),
            volatility,
        }
    }
}
