//! Calculators dispatching over every supported instrument.
//!
//! [`InstrumentDerivative`] is the closed set of position types. A calculator
//! matches on it once and forwards to the direct method, so a calculator
//! result is exactly the direct call's result.

use crate::futures::FuturesPricing;
use crate::instruments::{
    FutureSecurity, FuturesOption, FuturesOptionMarginTransaction, FuturesOptionPremiumTransaction, FuturesTransaction,
};
use crate::providers::BlackFuturesProvider;
use futopt_core::sensitivity::MulticurveSensitivity;
use futopt_core::types::PricingError;
use futopt_models::volatility::VolatilityModel;

/// Any priceable position.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InstrumentDerivative {
    /// Margined futures position
    Futures(FuturesTransaction<FutureSecurity>),
    /// Margined futures option position
    FuturesOptionMargin(FuturesOptionMarginTransaction<FutureSecurity>),
    /// Premium futures option position
    FuturesOptionPremium(FuturesOptionPremiumTransaction<FutureSecurity>),
}

impl InstrumentDerivative {
    /// Applies `calculator` to this position.
    pub fn accept<K, V>(&self, calculator: &K, provider: &BlackFuturesProvider<V>) -> Result<K::Output, PricingError>
    where
        K: InstrumentDerivativeCalculator<V>,
        V: VolatilityModel,
    {
        calculator.calculate(self, provider)
    }
}

impl From<FuturesTransaction<FutureSecurity>> for InstrumentDerivative {
    fn from(trade: FuturesTransaction<FutureSecurity>) -> Self {
        InstrumentDerivative::Futures(trade)
    }
}

impl From<FuturesOptionMarginTransaction<FutureSecurity>> for InstrumentDerivative {
    fn from(trade: FuturesOptionMarginTransaction<FutureSecurity>) -> Self {
        InstrumentDerivative::FuturesOptionMargin(trade)
    }
}

impl From<FuturesOptionPremiumTransaction<FutureSecurity>> for InstrumentDerivative {
    fn from(trade: FuturesOptionPremiumTransaction<FutureSecurity>) -> Self {
        InstrumentDerivative::FuturesOptionPremium(trade)
    }
}

/// A measure computed for any [`InstrumentDerivative`].
pub trait InstrumentDerivativeCalculator<V: VolatilityModel> {
    /// Result type.
    type Output;

    /// Computes the measure for one position.
    fn calculate(
        &self,
        derivative: &InstrumentDerivative,
        provider: &BlackFuturesProvider<V>,
    ) -> Result<Self::Output, PricingError>;

    /// Computes the measure for each position, failing on the first error.
    fn calculate_all(
        &self,
        derivatives: &[InstrumentDerivative],
        provider: &BlackFuturesProvider<V>,
    ) -> Result<Vec<Self::Output>, PricingError> {
        derivatives.iter().map(|d| self.calculate(d, provider)).collect()
    }
}

/// Present value.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresentValueCalculator;

impl<V: VolatilityModel> InstrumentDerivativeCalculator<V> for PresentValueCalculator {
    type Output = f64;

    fn calculate(&self, derivative: &InstrumentDerivative, provider: &BlackFuturesProvider<V>) -> Result<f64, PricingError> {
        match derivative {
            InstrumentDerivative::Futures(trade) => trade.present_value(provider.curves()),
            InstrumentDerivative::FuturesOptionMargin(trade) => trade.present_value(provider),
            InstrumentDerivative::FuturesOptionPremium(trade) => trade.present_value(provider),
        }
    }
}

/// Sticky-strike point curve sensitivity of the present value.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresentValueCurveSensitivityCalculator;

impl<V: VolatilityModel> InstrumentDerivativeCalculator<V> for PresentValueCurveSensitivityCalculator {
    type Output = MulticurveSensitivity;

    fn calculate(
        &self,
        derivative: &InstrumentDerivative,
        provider: &BlackFuturesProvider<V>,
    ) -> Result<MulticurveSensitivity, PricingError> {
        match derivative {
            InstrumentDerivative::Futures(trade) => trade.present_value_curve_sensitivity(provider.curves()),
            InstrumentDerivative::FuturesOptionMargin(trade) => trade.present_value_curve_sensitivity(provider),
            InstrumentDerivative::FuturesOptionPremium(trade) => trade.present_value_curve_sensitivity(provider),
        }
    }
}

/// Market price minus reference price, for margined positions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParSpreadCalculator;

impl<V: VolatilityModel> InstrumentDerivativeCalculator<V> for ParSpreadCalculator {
    type Output = f64;

    fn calculate(&self, derivative: &InstrumentDerivative, provider: &BlackFuturesProvider<V>) -> Result<f64, PricingError> {
        match derivative {
            InstrumentDerivative::Futures(trade) => trade.par_spread(provider.curves()),
            InstrumentDerivative::FuturesOptionMargin(trade) => trade.par_spread(provider),
            InstrumentDerivative::FuturesOptionPremium(_) => Err(PricingError::UnsupportedInstrument(
                "par spread of a premium option position".into(),
            )),
        }
    }
}

/// Futures price of the underlying contract, for any position.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnderlyingFuturesPriceCalculator;

impl<V: VolatilityModel> InstrumentDerivativeCalculator<V> for UnderlyingFuturesPriceCalculator {
    type Output = f64;

    fn calculate(&self, derivative: &InstrumentDerivative, provider: &BlackFuturesProvider<V>) -> Result<f64, PricingError> {
        let curves = provider.curves();
        match derivative {
            InstrumentDerivative::Futures(trade) => trade.security().futures_price(curves),
            InstrumentDerivative::FuturesOptionMargin(trade) => trade.security().underlying().futures_price(curves),
            InstrumentDerivative::FuturesOptionPremium(trade) => trade.security().underlying().futures_price(curves),
        }
    }
}
