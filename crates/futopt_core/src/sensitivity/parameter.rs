//! Bucketed sensitivities per curve node.

use std::collections::BTreeMap;
use std::ops::{Add, AddAssign};

/// Sensitivity to each node of each curve, keyed by curve name.
///
/// # Example
///
/// ```
/// use futopt_core::sensitivity::CurveParameterSensitivity;
///
/// let a = CurveParameterSensitivity::of("USD-DSC", vec![1.0, 2.0]);
/// let b = CurveParameterSensitivity::of("USD-DSC", vec![0.5, 0.0, 3.0]);
/// let total = a + b;
/// assert_eq!(total.get("USD-DSC"), Some(&[1.5, 2.0, 3.0][..]));
/// assert_eq!(total.total(), 6.5);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurveParameterSensitivity {
    sensitivities: BTreeMap<String, Vec<f64>>,
}

impl CurveParameterSensitivity {
    /// Empty sensitivity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sensitivity on a single curve.
    pub fn of(curve: impl Into<String>, values: Vec<f64>) -> Self {
        let mut s = Self::new();
        s.sensitivities.insert(curve.into(), values);
        s
    }

    /// Values for the named curve.
    pub fn get(&self, curve: &str) -> Option<&[f64]> {
        self.sensitivities.get(curve).map(Vec::as_slice)
    }

    /// Curve names with a recorded sensitivity.
    pub fn curve_names(&self) -> impl Iterator<Item = &str> {
        self.sensitivities.keys().map(String::as_str)
    }

    /// `(curve, values)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.sensitivities
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Number of curves.
    pub fn len(&self) -> usize {
        self.sensitivities.len()
    }

    /// True when no curve is recorded.
    pub fn is_empty(&self) -> bool {
        self.sensitivities.is_empty()
    }

    /// Sum over all curves and nodes (the parallel-shift sensitivity).
    pub fn total(&self) -> f64 {
        self.sensitivities.values().flatten().sum()
    }

    /// Every value multiplied by `factor`.
    pub fn multiplied_by(&self, factor: f64) -> Self {
        Self {
            sensitivities: self
                .sensitivities
                .iter()
                .map(|(name, values)| (name.clone(), values.iter().map(|v| v * factor).collect()))
                .collect(),
        }
    }

    /// Adds `values` element-wise onto the named curve.
    pub fn add_values(&mut self, curve: &str, values: &[f64]) {
        let entry = self.sensitivities.entry(curve.to_string()).or_default();
        if entry.len() < values.len() {
            entry.resize(values.len(), 0.0);
        }
        for (e, v) in entry.iter_mut().zip(values) {
            *e += v;
        }
    }
}

impl AddAssign for CurveParameterSensitivity {
    fn add_assign(&mut self, rhs: Self) {
        for (name, values) in rhs.sensitivities {
            self.add_values(&name, &values);
        }
    }
}

impl Add for CurveParameterSensitivity {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl std::iter::Sum for CurveParameterSensitivity {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::new(), Add::add)
    }
}
