//! Sensitivity containers.
//!
//! - [`MulticurveSensitivity`]: point sensitivities to zero rates and forward
//!   rates at arbitrary times, as produced by pricing methods
//! - [`CurveParameterSensitivity`]: bucketed sensitivities, one value per curve node
//! - [`SparseSensitivity`]: additive map from a small value-type key to a
//!   sensitivity, used for volatility points and model parameters
//!
//! All containers are additive: sensitivities of independent legs combine
//! with `+`, and the operation is associative and commutative.

mod multicurve;
mod parameter;
mod sparse;

pub use multicurve::{ForwardSensitivity, MulticurveSensitivity};
pub use parameter::CurveParameterSensitivity;
pub use sparse::{
    ModelParameter, ModelParameterSensitivity, SabrParameter, SparseSensitivity,
    SurfaceSensitivity, VolatilityNode,
};
