//! Black and normal pricing of options on futures.
//!
//! Both option styles share one valuation: the futures price `F` comes from
//! the underlying's [`FuturesPricing`] method, the volatility from the
//! provider's model queried at `(expiry, delay, strike, F)`, and the value
//! from the Black-76 kernel, or the Bachelier kernel when the model's
//! volatility is normal, with a style-specific numeraire:
//!
//! | Style   | Numeraire        | Extra curve sensitivity        |
//! |---------|------------------|--------------------------------|
//! | Margin  | 1                | none                           |
//! | Premium | `D(ccy, expiry)` | `(expiry, −expiry · price)`    |
//!
//! All values are per unit of underlying futures price; transaction
//! scaling (notional, accrual, quantity) lives in [`crate::transactions`].
//!
//! # Examples
//! ```
//! use futopt_core::market_data::{InterpolatedCurve, MulticurveProvider};
//! use futopt_core::types::{Currency, RateIndex};
//! use futopt_models::volatility::FlatVolatility;
//! use futopt_pricing::instruments::{FuturesOptionMarginSecurity, InterestRateFutureSecurity};
//! use futopt_pricing::options::FuturesOptionPricing;
//! use futopt_pricing::providers::BlackFuturesProvider;
//!
//! let index = RateIndex::new("EURIBOR3M", Currency::EUR);
//! let curve = InterpolatedCurve::flat(0.01).unwrap();
//! let curves = MulticurveProvider::new()
//!     .with_discount_curve(Currency::EUR, "EUR-DSC", curve.clone())
//!     .with_forward_curve(index.clone(), "EUR-FWD3M", curve);
//! let future = InterestRateFutureSecurity::new("ERZ6", index, 0.75, 0.75, 1.0, 0.25, 1_000_000.0, 0.25).unwrap();
//! let option = FuturesOptionMarginSecurity::new(future, 0.5, 0.99, true).unwrap();
//! let provider = BlackFuturesProvider::new(curves, FlatVolatility::new(0.01).unwrap());
//!
//! let price = option.price(&provider).unwrap();
//! let delta = option.delta(&provider).unwrap();
//! assert!(price > 0.0 && delta > 0.0 && delta < 1.0);
//! ```

mod margin;
mod premium;

use crate::futures::FuturesPricing;
use crate::instruments::FuturesOption;
use crate::providers::BlackFuturesProvider;
use futopt_core::market_data::CurveProvider;
use futopt_core::sensitivity::{
    ModelParameterSensitivity, MulticurveSensitivity, SabrParameter, SparseSensitivity, SurfaceSensitivity,
    VolatilityNode,
};
use futopt_core::types::PricingError;
use futopt_models::analytical::{
    black_implied_volatility, black_price_adjoint2, normal_implied_volatility, normal_price_adjoint2,
    BlackFunctionData, EuropeanOption, NormalFunctionData, OptionPriceAdjoint2, VolatilityType,
};
use futopt_models::volatility::{
    SabrParameterAccess, SsviParameterAccess, VolatilityAdjoint, VolatilityModel, VolatilityQuery,
};

/// SABR parameter sensitivities keyed by parameter and option point.
pub type SabrSensitivity = SparseSensitivity<(SabrParameter, VolatilityNode)>;

/// Price sensitivity to the SSVI parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SsviSensitivity {
    /// `∂price/∂σ_atm,j` for each ATM curve node
    pub atm_volatility: Vec<f64>,
    /// `∂price/∂ρ`
    pub rho: f64,
    /// `∂price/∂η`
    pub eta: f64,
}

/// Everything one valuation produces; sensitivities are read off it.
struct Valuation {
    futures_price: f64,
    volatility: VolatilityAdjoint,
    kernel: OptionPriceAdjoint2,
}

fn european<O: FuturesOption + ?Sized>(option: &O) -> EuropeanOption {
    EuropeanOption::new(option.strike(), option.expiry(), option.is_call())
}

fn query<O: FuturesOption + ?Sized>(option: &O, futures_price: f64) -> VolatilityQuery {
    VolatilityQuery::new(option.expiry(), option.delay(), option.strike(), futures_price)
}

fn node<O: FuturesOption + ?Sized>(option: &O) -> VolatilityNode {
    VolatilityNode::new(option.expiry(), option.delay(), option.strike())
}

fn value_at<O, V>(option: &O, futures_price: f64, provider: &BlackFuturesProvider<V>) -> Result<Valuation, PricingError>
where
    O: FuturesOptionPricing + ?Sized,
    V: VolatilityModel,
{
    let volatility = provider.volatility().volatility_adjoint(&query(option, futures_price))?;
    let numeraire = option.numeraire(provider.curves())?;
    let kernel = match provider.volatility().volatility_type() {
        VolatilityType::Lognormal => black_price_adjoint2(
            &european(option),
            &BlackFunctionData::new(futures_price, numeraire, volatility.volatility),
        )?,
        VolatilityType::Normal => normal_price_adjoint2(
            &european(option),
            &NormalFunctionData::new(futures_price, numeraire, volatility.volatility),
        )?,
    };
    Ok(Valuation {
        futures_price,
        volatility,
        kernel,
    })
}

fn value<O, V>(option: &O, provider: &BlackFuturesProvider<V>) -> Result<Valuation, PricingError>
where
    O: FuturesOptionPricing + ?Sized,
    V: VolatilityModel,
{
    let futures_price = option.underlying().futures_price(provider.curves())?;
    value_at(option, futures_price, provider)
}

/// Pricing and sensitivities shared by margined and premium options.
///
/// Implementors only define the numeraire; everything else is provided.
pub trait FuturesOptionPricing: FuturesOption {
    /// Numeraire multiplying the kernel price.
    fn numeraire<C: CurveProvider + ?Sized>(&self, curves: &C) -> Result<f64, PricingError>;

    /// Curve sensitivity of `price` carried by the numeraire.
    fn numeraire_curve_sensitivity<C: CurveProvider + ?Sized>(
        &self,
        curves: &C,
        price: f64,
    ) -> Result<MulticurveSensitivity, PricingError>;

    /// Price of the underlying future.
    fn underlying_futures_price<V: VolatilityModel>(&self, provider: &BlackFuturesProvider<V>) -> Result<f64, PricingError> {
        self.underlying().futures_price(provider.curves())
    }

    /// Option price for a given futures price, volatility read at that price.
    fn price_from_futures_price<V: VolatilityModel>(
        &self,
        futures_price: f64,
        provider: &BlackFuturesProvider<V>,
    ) -> Result<f64, PricingError> {
        Ok(value_at(self, futures_price, provider)?.kernel.first.price)
    }

    /// Option price.
    fn price<V: VolatilityModel>(&self, provider: &BlackFuturesProvider<V>) -> Result<f64, PricingError> {
        Ok(value(self, provider)?.kernel.first.price)
    }

    /// Volatility the model gives this option, Black or normal per the model.
    fn implied_volatility<V: VolatilityModel>(&self, provider: &BlackFuturesProvider<V>) -> Result<f64, PricingError> {
        let futures_price = self.underlying_futures_price(provider)?;
        Ok(provider.volatility().volatility(&query(self, futures_price))?)
    }

    /// Volatility of the model's type reproducing `price` at the current
    /// futures price.
    fn implied_volatility_from_price<V: VolatilityModel>(
        &self,
        price: f64,
        provider: &BlackFuturesProvider<V>,
    ) -> Result<f64, PricingError> {
        let futures_price = self.underlying_futures_price(provider)?;
        let numeraire = self.numeraire(provider.curves())?;
        match provider.volatility().volatility_type() {
            VolatilityType::Lognormal => black_implied_volatility(&european(self), futures_price, numeraire, price),
            VolatilityType::Normal => normal_implied_volatility(&european(self), futures_price, numeraire, price),
        }
    }

    /// `∂price/∂F`, volatility held fixed.
    fn delta<V: VolatilityModel>(&self, provider: &BlackFuturesProvider<V>) -> Result<f64, PricingError> {
        Ok(value(self, provider)?.kernel.first.d_forward)
    }

    /// `∂²price/∂F²`, volatility held fixed.
    fn gamma<V: VolatilityModel>(&self, provider: &BlackFuturesProvider<V>) -> Result<f64, PricingError> {
        Ok(value(self, provider)?.kernel.d2_forward)
    }

    /// `∂price/∂σ`.
    fn vega<V: VolatilityModel>(&self, provider: &BlackFuturesProvider<V>) -> Result<f64, PricingError> {
        Ok(value(self, provider)?.kernel.first.d_volatility)
    }

    /// `−∂price/∂T` with futures price, volatility and numeraire held fixed.
    fn theta<V: VolatilityModel>(&self, provider: &BlackFuturesProvider<V>) -> Result<f64, PricingError> {
        Ok(-value(self, provider)?.kernel.first.d_expiry)
    }

    /// Curve sensitivity with the volatility frozen (sticky strike).
    fn price_curve_sensitivity<V: VolatilityModel>(
        &self,
        provider: &BlackFuturesProvider<V>,
    ) -> Result<MulticurveSensitivity, PricingError> {
        let valuation = value(self, provider)?;
        curve_sensitivity(self, provider, &valuation, valuation.kernel.first.d_forward)
    }

    /// Curve sensitivity including the smile: the volatility moves with the
    /// futures price, adding `vega · ∂σ/∂F` to the delta.
    fn price_curve_sensitivity_with_smile<V: VolatilityModel>(
        &self,
        provider: &BlackFuturesProvider<V>,
    ) -> Result<MulticurveSensitivity, PricingError> {
        let valuation = value(self, provider)?;
        let first = &valuation.kernel.first;
        let total_delta = first.d_forward + first.d_volatility * valuation.volatility.d_forward;
        curve_sensitivity(self, provider, &valuation, total_delta)
    }

    /// Vega keyed by the option's (expiry, delay, strike).
    fn price_black_sensitivity<V: VolatilityModel>(
        &self,
        provider: &BlackFuturesProvider<V>,
    ) -> Result<SurfaceSensitivity, PricingError> {
        let vega = value(self, provider)?.kernel.first.d_volatility;
        Ok(SurfaceSensitivity::of(node(self), vega))
    }

    /// `vega · ∂σ/∂p` for every model parameter `p` the volatility depends on.
    fn price_volatility_parameter_sensitivity<V: VolatilityModel>(
        &self,
        provider: &BlackFuturesProvider<V>,
    ) -> Result<ModelParameterSensitivity, PricingError> {
        let valuation = value(self, provider)?;
        Ok(valuation
            .volatility
            .parameters
            .multiplied_by(valuation.kernel.first.d_volatility))
    }

    /// Price sensitivity to α, β, ρ and ν at the option's point.
    fn price_sabr_sensitivity<V: SabrParameterAccess>(
        &self,
        provider: &BlackFuturesProvider<V>,
    ) -> Result<SabrSensitivity, PricingError> {
        let valuation = value(self, provider)?;
        let adjoint = provider
            .volatility()
            .sabr_adjoint(&query(self, valuation.futures_price))?;
        let vega = valuation.kernel.first.d_volatility;
        let point = node(self);
        Ok([SabrParameter::Alpha, SabrParameter::Beta, SabrParameter::Rho, SabrParameter::Nu]
            .into_iter()
            .map(|p| ((p, point), vega * adjoint.parameter(p)))
            .collect())
    }

    /// Price sensitivity to the SSVI ATM nodes, ρ and η.
    fn price_ssvi_sensitivity<V: SsviParameterAccess>(
        &self,
        provider: &BlackFuturesProvider<V>,
    ) -> Result<SsviSensitivity, PricingError> {
        let valuation = value(self, provider)?;
        let adjoint = provider
            .volatility()
            .ssvi_adjoint(&query(self, valuation.futures_price))?;
        let vega = valuation.kernel.first.d_volatility;
        Ok(SsviSensitivity {
            atm_volatility: adjoint.d_atm_volatility.iter().map(|d| vega * d).collect(),
            rho: vega * adjoint.d_rho,
            eta: vega * adjoint.d_eta,
        })
    }
}

fn curve_sensitivity<O, V>(
    option: &O,
    provider: &BlackFuturesProvider<V>,
    valuation: &Valuation,
    total_delta: f64,
) -> Result<MulticurveSensitivity, PricingError>
where
    O: FuturesOptionPricing + ?Sized,
    V: VolatilityModel,
{
    let underlying = option.underlying().futures_price_curve_sensitivity(provider.curves())?;
    let numeraire = option.numeraire_curve_sensitivity(provider.curves(), valuation.kernel.first.price)?;
    Ok((underlying.multiplied_by(total_delta) + numeraire).cleaned())
}
