//! Option description and kernel results shared by the Black and normal
//! formulas.

/// Strike, expiry and payoff direction of a European option.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EuropeanOption {
    /// Strike price
    pub strike: f64,
    /// Time to expiry in years
    pub expiry: f64,
    /// Call (`true`) or put (`false`)
    pub is_call: bool,
}

impl EuropeanOption {
    /// Creates an option description.
    pub fn new(strike: f64, expiry: f64, is_call: bool) -> Self {
        Self {
            strike,
            expiry,
            is_call,
        }
    }

    /// `+1` for calls, `-1` for puts.
    #[inline]
    pub fn sign(&self) -> f64 {
        if self.is_call {
            1.0
        } else {
            -1.0
        }
    }
}

/// Price and first-order derivatives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionPriceAdjoint {
    /// Option price
    pub price: f64,
    /// ∂price/∂F
    pub d_forward: f64,
    /// ∂price/∂σ
    pub d_volatility: f64,
    /// ∂price/∂K
    pub d_strike: f64,
    /// ∂price/∂T
    pub d_expiry: f64,
}

/// Price with first and second order derivatives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptionPriceAdjoint2 {
    /// First order results
    pub first: OptionPriceAdjoint,
    /// ∂²price/∂F² (gamma)
    pub d2_forward: f64,
    /// ∂²price/∂F∂σ (vanna)
    pub d2_forward_volatility: f64,
    /// ∂²price/∂σ² (volga)
    pub d2_volatility: f64,
}

/// How a volatility number is to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VolatilityType {
    /// Black (lognormal) volatility of the futures price
    #[default]
    Lognormal,
    /// Normal (Bachelier) volatility of the futures price
    Normal,
}

/// Payoff at zero standard deviation, with the derivatives of the exercised
/// branch. The at-the-money point takes the unexercised branch.
pub(crate) fn intrinsic(option: &EuropeanOption, forward: f64, numeraire: f64) -> OptionPriceAdjoint {
    let omega = option.sign();
    let payoff = omega * (forward - option.strike);
    let (price, d_forward) = if payoff > 0.0 {
        (payoff, omega)
    } else {
        (0.0, 0.0)
    };
    OptionPriceAdjoint {
        price: numeraire * price,
        d_forward: numeraire * d_forward,
        d_volatility: 0.0,
        d_strike: -numeraire * d_forward,
        d_expiry: 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intrinsic_branches() {
        let call = EuropeanOption::new(0.98, 0.5, true);
        let put = EuropeanOption::new(0.98, 0.5, false);
        let itm = intrinsic(&call, 0.99, 0.5);
        assert!((itm.price - 0.005).abs() < 1e-15);
        assert_eq!(itm.d_forward, 0.5);
        assert_eq!(itm.d_strike, -0.5);
        assert_eq!(intrinsic(&put, 0.99, 1.0).price, 0.0);
        assert_eq!(intrinsic(&call, 0.98, 1.0).d_forward, 0.0);
        assert_eq!(call.sign(), 1.0);
        assert_eq!(put.sign(), -1.0);
    }
}
