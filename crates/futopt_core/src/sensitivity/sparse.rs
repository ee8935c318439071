//! Sparse sensitivities keyed by small value types.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, AddAssign};

/// Additive map from a key to a sensitivity value.
///
/// Adding two maps sums the values of equal keys; absent keys read as zero.
///
/// # Example
///
/// ```
/// use futopt_core::sensitivity::{SurfaceSensitivity, VolatilityNode};
///
/// let node = VolatilityNode::new(0.5, 0.25, 0.99);
/// let a = SurfaceSensitivity::of(node, 10.0);
/// let b = SurfaceSensitivity::of(node, 2.5);
/// assert_eq!((a + b).get(&node), 12.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SparseSensitivity<K: Ord> {
    values: BTreeMap<K, f64>,
}

impl<K: Ord> Default for SparseSensitivity<K> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone> SparseSensitivity<K> {
    /// Empty sensitivity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-entry sensitivity.
    pub fn of(key: K, value: f64) -> Self {
        let mut s = Self::new();
        s.values.insert(key, value);
        s
    }

    /// Adds `value` onto `key`.
    pub fn add_value(&mut self, key: K, value: f64) {
        *self.values.entry(key).or_insert(0.0) += value;
    }

    /// Value at `key`, zero when absent.
    pub fn get(&self, key: &K) -> f64 {
        self.values.get(key).copied().unwrap_or(0.0)
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, f64)> {
        self.values.iter().map(|(k, v)| (k, *v))
    }

    /// Keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.values.keys()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sum of all values.
    pub fn total(&self) -> f64 {
        self.values.values().sum()
    }

    /// Every value multiplied by `factor`.
    pub fn multiplied_by(&self, factor: f64) -> Self {
        Self {
            values: self
                .values
                .iter()
                .map(|(k, v)| (k.clone(), v * factor))
                .collect(),
        }
    }

    /// Keeps the entries whose key satisfies `predicate`.
    pub fn filtered<P: Fn(&K) -> bool>(&self, predicate: P) -> Self {
        Self {
            values: self
                .values
                .iter()
                .filter(|(k, _)| predicate(k))
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
        }
    }
}

impl<K: Ord + Clone> AddAssign for SparseSensitivity<K> {
    fn add_assign(&mut self, rhs: Self) {
        for (k, v) in rhs.values {
            self.add_value(k, v);
        }
    }
}

impl<K: Ord + Clone> Add for SparseSensitivity<K> {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl<K: Ord + Clone> FromIterator<(K, f64)> for SparseSensitivity<K> {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut s = Self::new();
        for (k, v) in iter {
            s.add_value(k, v);
        }
        s
    }
}

/// Point on a volatility surface: option expiry, delay between option
/// expiry and futures last trading, and strike.
///
/// Ordered and compared by total ordering of the three coordinates.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VolatilityNode {
    /// Option expiry (years)
    pub expiry: f64,
    /// Futures last trading time minus option expiry (years)
    pub delay: f64,
    /// Strike price
    pub strike: f64,
}

impl VolatilityNode {
    /// Creates a node.
    pub fn new(expiry: f64, delay: f64, strike: f64) -> Self {
        Self {
            expiry,
            delay,
            strike,
        }
    }
}

impl PartialEq for VolatilityNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VolatilityNode {}

impl PartialOrd for VolatilityNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VolatilityNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.expiry
            .total_cmp(&other.expiry)
            .then(self.delay.total_cmp(&other.delay))
            .then(self.strike.total_cmp(&other.strike))
    }
}

impl Hash for VolatilityNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.expiry.to_bits().hash(state);
        self.delay.to_bits().hash(state);
        self.strike.to_bits().hash(state);
    }
}

/// SABR parameter name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SabrParameter {
    /// Initial volatility level
    Alpha,
    /// CEV exponent
    Beta,
    /// Correlation between forward and volatility
    Rho,
    /// Volatility of volatility
    Nu,
}

impl fmt::Display for SabrParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SabrParameter::Alpha => "alpha",
            SabrParameter::Beta => "beta",
            SabrParameter::Rho => "rho",
            SabrParameter::Nu => "nu",
        };
        f.write_str(name)
    }
}

/// An individually addressable volatility-model parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModelParameter {
    /// The single volatility of a flat model
    FlatVolatility,
    /// Node of an interpolated Black surface
    SurfaceNode {
        /// Expiry index
        row: usize,
        /// Strike, moneyness or delay index
        column: usize,
    },
    /// SABR parameter at a node of its (expiry, delay) grid
    Sabr {
        /// Which parameter
        parameter: SabrParameter,
        /// Expiry index
        row: usize,
        /// Delay index
        column: usize,
    },
    /// Node of the SSVI at-the-money volatility curve
    SsviAtmVolatility {
        /// Curve node index
        node: usize,
    },
    /// SSVI correlation
    SsviRho,
    /// SSVI curvature
    SsviEta,
    /// Hull-White piecewise-constant volatility
    HullWhiteVolatility {
        /// Volatility period index
        index: usize,
    },
}

impl fmt::Display for ModelParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelParameter::FlatVolatility => write!(f, "flat-vol"),
            ModelParameter::SurfaceNode { row, column } => write!(f, "surface[{},{}]", row, column),
            ModelParameter::Sabr {
                parameter,
                row,
                column,
            } => write!(f, "sabr-{}[{},{}]", parameter, row, column),
            ModelParameter::SsviAtmVolatility { node } => write!(f, "ssvi-atm[{}]", node),
            ModelParameter::SsviRho => write!(f, "ssvi-rho"),
            ModelParameter::SsviEta => write!(f, "ssvi-eta"),
            ModelParameter::HullWhiteVolatility { index } => write!(f, "hw-vol[{}]", index),
        }
    }
}

/// Vega keyed by volatility surface point.
pub type SurfaceSensitivity = SparseSensitivity<VolatilityNode>;

/// Sensitivity keyed by model parameter.
pub type ModelParameterSensitivity = SparseSensitivity<ModelParameter>;
