//! Closed-form option kernels.
//!
//! Both kernels return [`OptionPriceAdjoint2`]; the volatility model's
//! [`VolatilityType`] decides which one reads its volatility.

mod black;
mod normal;
mod option;

pub use black::{
    black_implied_volatility, black_price, black_price_adjoint, black_price_adjoint2, BlackFunctionData,
    BLACK_EPSILON,
};
pub use normal::{
    normal_implied_volatility, normal_price, normal_price_adjoint, normal_price_adjoint2, NormalFunctionData,
    NORMAL_EPSILON,
};
pub use option::{EuropeanOption, OptionPriceAdjoint, OptionPriceAdjoint2, VolatilityType};
