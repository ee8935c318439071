//! Agreement checks between two independently computed sensitivities.
//!
//! Finite differences amplify floating-point noise, so a value passes when
//! it is within the absolute band OR the relative band. Both differences
//! are recorded for every mismatch.

use crate::error::SensitivityError;
use futopt_core::sensitivity::{CurveParameterSensitivity, ModelParameter, ModelParameterSensitivity};
use std::fmt;

/// Absolute and relative agreement bands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensitivityTolerance {
    /// Largest accepted `|a − b|`
    pub absolute: f64,
    /// Largest accepted `|a − b| / max(|a|, |b|)`
    pub relative: f64,
}

impl SensitivityTolerance {
    /// Validated tolerance.
    pub fn new(absolute: f64, relative: f64) -> Result<Self, SensitivityError> {
        let valid = |x: f64| x.is_finite() && x >= 0.0;
        if !(valid(absolute) && valid(relative)) {
            return Err(SensitivityError::InvalidTolerance { absolute, relative });
        }
        Ok(Self { absolute, relative })
    }

    /// True when `a` and `b` agree within either band.
    pub fn accepts(&self, a: f64, b: f64) -> bool {
        let diff = (a - b).abs();
        diff <= self.absolute || diff <= self.relative * a.abs().max(b.abs())
    }
}

/// Location of a compared value.
#[derive(Debug, Clone, PartialEq)]
pub enum SensitivityKey {
    /// Node of a named curve
    CurveNode {
        /// Curve name
        curve: String,
        /// Node index
        node: usize,
    },
    /// Model parameter
    Parameter(ModelParameter),
}

impl fmt::Display for SensitivityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensitivityKey::CurveNode { curve, node } => write!(f, "{}[{}]", curve, node),
            SensitivityKey::Parameter(p) => write!(f, "{}", p),
        }
    }
}

/// A value outside both bands.
#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityMismatch {
    /// Where
    pub key: SensitivityKey,
    /// Value from the first source (usually analytic)
    pub expected: f64,
    /// Value from the second source (usually finite difference)
    pub actual: f64,
    /// `|expected − actual|`
    pub absolute_difference: f64,
    /// `|expected − actual| / max(|expected|, |actual|)`, zero when both vanish
    pub relative_difference: f64,
}

impl SensitivityMismatch {
    fn new(key: SensitivityKey, expected: f64, actual: f64) -> Self {
        let absolute_difference = (expected - actual).abs();
        let scale = expected.abs().max(actual.abs());
        let relative_difference = if scale > 0.0 {
            absolute_difference / scale
        } else {
            0.0
        };
        Self {
            key,
            expected,
            actual,
            absolute_difference,
            relative_difference,
        }
    }
}

impl fmt::Display for SensitivityMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {:.6e}, actual {:.6e} (abs {:.3e}, rel {:.3e})",
            self.key, self.expected, self.actual, self.absolute_difference, self.relative_difference
        )
    }
}

/// Outcome of a comparison.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonReport {
    /// Number of values compared
    pub checked: usize,
    /// Values outside both bands
    pub mismatches: Vec<SensitivityMismatch>,
}

impl ComparisonReport {
    /// True when every value agreed.
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// Largest absolute difference among mismatches.
    pub fn worst_absolute_difference(&self) -> f64 {
        self.mismatches
            .iter()
            .map(|m| m.absolute_difference)
            .fold(0.0, f64::max)
    }

    fn check(&mut self, tolerance: &SensitivityTolerance, key: SensitivityKey, expected: f64, actual: f64) {
        self.checked += 1;
        if !tolerance.accepts(expected, actual) {
            self.mismatches.push(SensitivityMismatch::new(key, expected, actual));
        }
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} checked, {} mismatched", self.checked, self.mismatches.len())?;
        for m in &self.mismatches {
            write!(f, "\n  {}", m)?;
        }
        Ok(())
    }
}

/// Compares two bucketed curve sensitivities node by node.
///
/// Curves present on one side only are compared against zeros; vectors of
/// different length on the same curve are an error.
pub fn compare_curve_sensitivities(
    expected: &CurveParameterSensitivity,
    actual: &CurveParameterSensitivity,
    tolerance: &SensitivityTolerance,
) -> Result<ComparisonReport, SensitivityError> {
    let mut names: Vec<&str> = expected.curve_names().chain(actual.curve_names()).collect();
    names.sort_unstable();
    names.dedup();

    let mut report = ComparisonReport::default();
    for name in names {
        let (e, a) = match (expected.get(name), actual.get(name)) {
            (Some(e), Some(a)) if e.len() != a.len() => {
                return Err(SensitivityError::DimensionMismatch {
                    curve: name.to_string(),
                    expected: e.len(),
                    found: a.len(),
                })
            }
            (Some(e), Some(a)) => (e.to_vec(), a.to_vec()),
            (Some(e), None) => (e.to_vec(), vec![0.0; e.len()]),
            (None, Some(a)) => (vec![0.0; a.len()], a.to_vec()),
            (None, None) => continue,
        };
        for (node, (x, y)) in e.into_iter().zip(a).enumerate() {
            let key = SensitivityKey::CurveNode {
                curve: name.to_string(),
                node,
            };
            report.check(tolerance, key, x, y);
        }
    }
    Ok(report)
}

/// Compares two model parameter sensitivities over the union of their keys.
pub fn compare_parameter_sensitivities(
    expected: &ModelParameterSensitivity,
    actual: &ModelParameterSensitivity,
    tolerance: &SensitivityTolerance,
) -> ComparisonReport {
    let mut keys: Vec<ModelParameter> = expected.keys().chain(actual.keys()).copied().collect();
    keys.sort_unstable();
    keys.dedup();

    let mut report = ComparisonReport::default();
    for key in keys {
        report.check(
            tolerance,
            SensitivityKey::Parameter(key),
            expected.get(&key),
            actual.get(&key),
        );
    }
    report
}
