//! Present values of futures and futures-option positions.
//!
//! A margined position is worth the margin it would receive if marked now
//! against its reference price:
//!
//! ```text
//! PV = (price − reference) · notional · accrual · quantity
//! ```
//!
//! A premium option position is worth the discounted option value plus the
//! discounted premium, if not yet paid.
//!
//! Option positions also report position greeks: the option's delta, gamma,
//! theta and vega scaled by notional, accrual factor and quantity.

use crate::futures::FuturesPricing;
use crate::instruments::{
    FuturesOption, FuturesOptionMarginTransaction, FuturesOptionPremiumTransaction, FuturesSecurity,
    FuturesTransaction, Payment,
};
use crate::options::FuturesOptionPricing;
use crate::providers::BlackFuturesProvider;
use futopt_core::market_data::CurveProvider;
use futopt_core::sensitivity::{MulticurveSensitivity, SurfaceSensitivity};
use futopt_core::types::PricingError;
use futopt_models::volatility::VolatilityModel;

/// Option price units to currency for one option contract.
fn option_scale<O: FuturesOption>(option: &O) -> f64 {
    let underlying = option.underlying();
    underlying.notional() * underlying.margin_accrual_factor()
}

impl<S: FuturesPricing> FuturesTransaction<S> {
    /// Margin value against the reference price.
    pub fn present_value<C: CurveProvider + ?Sized>(&self, curves: &C) -> Result<f64, PricingError> {
        let price = self.security().futures_price(curves)?;
        Ok(self.present_value_from_price(price))
    }

    /// Margin value at a given futures price.
    pub fn present_value_from_price(&self, price: f64) -> f64 {
        self.security().margin_value_difference(price, self.reference_price()) * self.quantity() as f64
    }

    /// Curve sensitivity of [`Self::present_value`].
    pub fn present_value_curve_sensitivity<C: CurveProvider + ?Sized>(
        &self,
        curves: &C,
    ) -> Result<MulticurveSensitivity, PricingError> {
        let price = self.security().futures_price(curves)?;
        let scale = self.security().margin_value_derivative(price) * self.quantity() as f64;
        Ok(self
            .security()
            .futures_price_curve_sensitivity(curves)?
            .multiplied_by(scale))
    }

    /// Futures price minus the reference price.
    pub fn par_spread<C: CurveProvider + ?Sized>(&self, curves: &C) -> Result<f64, PricingError> {
        Ok(self.security().futures_price(curves)? - self.reference_price())
    }
}

impl<U: FuturesPricing> FuturesOptionMarginTransaction<U> {
    fn scale(&self) -> f64 {
        option_scale(self.security()) * self.quantity() as f64
    }

    /// Margin value against the reference option price.
    pub fn present_value<V: VolatilityModel>(&self, provider: &BlackFuturesProvider<V>) -> Result<f64, PricingError> {
        let price = self.security().price(provider)?;
        Ok((price - self.reference_price()) * self.scale())
    }

    /// Sticky-strike curve sensitivity of [`Self::present_value`].
    pub fn present_value_curve_sensitivity<V: VolatilityModel>(
        &self,
        provider: &BlackFuturesProvider<V>,
    ) -> Result<MulticurveSensitivity, PricingError> {
        Ok(self
            .security()
            .price_curve_sensitivity(provider)?
            .multiplied_by(self.scale()))
    }

    /// Present value vega keyed by the option's volatility point.
    pub fn present_value_black_sensitivity<V: VolatilityModel>(
        &self,
        provider: &BlackFuturesProvider<V>,
    ) -> Result<SurfaceSensitivity, PricingError> {
        Ok(self
            .security()
            .price_black_sensitivity(provider)?
            .multiplied_by(self.scale()))
    }

    /// Option price minus the reference price.
    pub fn par_spread<V: VolatilityModel>(&self, provider: &BlackFuturesProvider<V>) -> Result<f64, PricingError> {
        Ok(self.security().price(provider)? - self.reference_price())
    }
}

macro_rules! position_greeks {
    ($transaction:ident) => {
        impl<U: FuturesPricing> $transaction<U> {
            /// Option delta times notional, accrual and quantity.
            pub fn position_delta<V: VolatilityModel>(
                &self,
                provider: &BlackFuturesProvider<V>,
            ) -> Result<f64, PricingError> {
                Ok(self.security().delta(provider)? * self.scale())
            }

            /// Option gamma times notional, accrual and quantity.
            pub fn position_gamma<V: VolatilityModel>(
                &self,
                provider: &BlackFuturesProvider<V>,
            ) -> Result<f64, PricingError> {
                Ok(self.security().gamma(provider)? * self.scale())
            }

            /// Option theta times notional, accrual and quantity.
            pub fn position_theta<V: VolatilityModel>(
                &self,
                provider: &BlackFuturesProvider<V>,
            ) -> Result<f64, PricingError> {
                Ok(self.security().theta(provider)? * self.scale())
            }

            /// Option vega times notional, accrual and quantity.
            pub fn position_vega<V: VolatilityModel>(
                &self,
                provider: &BlackFuturesProvider<V>,
            ) -> Result<f64, PricingError> {
                Ok(self.security().vega(provider)? * self.scale())
            }
        }
    };
}

position_greeks!(FuturesOptionMarginTransaction);
position_greeks!(FuturesOptionPremiumTransaction);

fn premium_value<C: CurveProvider + ?Sized>(premium: &Payment, curves: &C) -> Result<f64, PricingError> {
    if premium.time < 0.0 {
        return Ok(0.0);
    }
    Ok(premium.amount * curves.discount_factor(premium.currency, premium.time)?)
}

impl<U: FuturesPricing> FuturesOptionPremiumTransaction<U> {
    fn scale(&self) -> f64 {
        option_scale(self.security()) * self.quantity() as f64
    }

    /// Discounted option value plus the premium; a premium paid before the
    /// valuation date is excluded.
    pub fn present_value<V: VolatilityModel>(&self, provider: &BlackFuturesProvider<V>) -> Result<f64, PricingError> {
        let option = self.security().price(provider)? * self.scale();
        Ok(option + premium_value(self.premium(), provider.curves())?)
    }

    /// Sticky-strike curve sensitivity of [`Self::present_value`].
    pub fn present_value_curve_sensitivity<V: VolatilityModel>(
        &self,
        provider: &BlackFuturesProvider<V>,
    ) -> Result<MulticurveSensitivity, PricingError> {
        let mut sensitivity = self
            .security()
            .price_curve_sensitivity(provider)?
            .multiplied_by(self.scale());
        let premium = self.premium();
        if premium.time >= 0.0 {
            let curves = provider.curves();
            let value = premium_value(premium, curves)?;
            sensitivity += MulticurveSensitivity::of_yield_discounting(
                curves.discount_curve_name(premium.currency)?,
                premium.time,
                -premium.time * value,
            );
        }
        Ok(sensitivity.cleaned())
    }

    /// Present value vega keyed by the option's volatility point.
    pub fn present_value_black_sensitivity<V: VolatilityModel>(
        &self,
        provider: &BlackFuturesProvider<V>,
    ) -> Result<SurfaceSensitivity, PricingError> {
        Ok(self
            .security()
            .price_black_sensitivity(provider)?
            .multiplied_by(self.scale()))
    }
}
