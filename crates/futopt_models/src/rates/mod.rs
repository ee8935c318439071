//! Short-rate models used for futures convexity.

mod hull_white;

pub use hull_white::{ConvexityFactorAdjoint, HullWhiteOneFactorParameters};
