//! Point sensitivities with respect to curve rates.

use std::collections::BTreeMap;
use std::ops::{Add, AddAssign};

/// Sensitivity to a simply compounded forward rate over `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForwardSensitivity {
    /// Start of the forward period
    pub start: f64,
    /// End of the forward period
    pub end: f64,
    /// Accrual factor of the period
    pub accrual: f64,
    /// `∂V / ∂F`
    pub value: f64,
}

impl ForwardSensitivity {
    fn same_period(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end && self.accrual == other.accrual
    }
}

/// Point sensitivities to curve rates, keyed by curve name.
///
/// `yield_discounting[curve]` holds `(t, ∂V/∂r(t))` where `r(t)` is the
/// continuously compounded zero rate; `forward[curve]` holds sensitivities to
/// simply compounded forward rates.
///
/// # Example
///
/// ```
/// use futopt_core::sensitivity::MulticurveSensitivity;
///
/// let a = MulticurveSensitivity::of_yield_discounting("USD-DSC", 1.0, -0.5);
/// let b = MulticurveSensitivity::of_yield_discounting("USD-DSC", 1.0, -0.25);
/// let total = (a + b).cleaned();
/// assert_eq!(total.yield_discounting()["USD-DSC"], vec![(1.0, -0.75)]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MulticurveSensitivity {
    yield_discounting: BTreeMap<String, Vec<(f64, f64)>>,
    forward: BTreeMap<String, Vec<ForwardSensitivity>>,
}

impl MulticurveSensitivity {
    /// Empty sensitivity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Single zero-rate point sensitivity.
    pub fn of_yield_discounting(curve: impl Into<String>, time: f64, value: f64) -> Self {
        let mut s = Self::new();
        s.yield_discounting.insert(curve.into(), vec![(time, value)]);
        s
    }

    /// Zero-rate point sensitivities on one curve.
    pub fn of_yield_discounting_points(curve: impl Into<String>, points: Vec<(f64, f64)>) -> Self {
        let mut s = Self::new();
        s.yield_discounting.insert(curve.into(), points);
        s
    }

    /// Single forward-rate sensitivity.
    pub fn of_forward(curve: impl Into<String>, forward: ForwardSensitivity) -> Self {
        let mut s = Self::new();
        s.forward.insert(curve.into(), vec![forward]);
        s
    }

    /// Zero-rate sensitivities by curve.
    pub fn yield_discounting(&self) -> &BTreeMap<String, Vec<(f64, f64)>> {
        &self.yield_discounting
    }

    /// Forward-rate sensitivities by curve.
    pub fn forward(&self) -> &BTreeMap<String, Vec<ForwardSensitivity>> {
        &self.forward
    }

    /// True when no point is recorded.
    pub fn is_empty(&self) -> bool {
        self.yield_discounting.values().all(Vec::is_empty) && self.forward.values().all(Vec::is_empty)
    }

    /// Every value multiplied by `factor`.
    pub fn multiplied_by(&self, factor: f64) -> Self {
        let yield_discounting = self
            .yield_discounting
            .iter()
            .map(|(name, points)| {
                (
                    name.clone(),
                    points.iter().map(|&(t, v)| (t, v * factor)).collect(),
                )
            })
            .collect();
        let forward = self
            .forward
            .iter()
            .map(|(name, points)| {
                (
                    name.clone(),
                    points
                        .iter()
                        .map(|f| ForwardSensitivity {
                            value: f.value * factor,
                            ..*f
                        })
                        .collect(),
                )
            })
            .collect();
        Self {
            yield_discounting,
            forward,
        }
    }

    /// Points sorted by time with equal points merged.
    pub fn cleaned(&self) -> Self {
        let yield_discounting = self
            .yield_discounting
            .iter()
            .map(|(name, points)| {
                let mut sorted = points.clone();
                sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
                let mut merged: Vec<(f64, f64)> = Vec::with_capacity(sorted.len());
                for (t, v) in sorted {
                    match merged.last_mut() {
                        Some(last) if last.0 == t => last.1 += v,
                        _ => merged.push((t, v)),
                    }
                }
                (name.clone(), merged)
            })
            .collect();
        let forward = self
            .forward
            .iter()
            .map(|(name, points)| {
                let mut sorted = points.clone();
                sorted.sort_by(|a, b| {
                    a.start
                        .total_cmp(&b.start)
                        .then(a.end.total_cmp(&b.end))
                        .then(a.accrual.total_cmp(&b.accrual))
                });
                let mut merged: Vec<ForwardSensitivity> = Vec::with_capacity(sorted.len());
                for f in sorted {
                    match merged.last_mut() {
                        Some(last) if last.same_period(&f) => last.value += f.value,
                        _ => merged.push(f),
                    }
                }
                (name.clone(), merged)
            })
            .collect();
        Self {
            yield_discounting,
            forward,
        }
    }

    /// Largest absolute difference between the cleaned point values of two
    /// sensitivities; points present on one side only count in full.
    pub fn max_abs_difference(&self, other: &Self) -> f64 {
        let diff = (self.clone() + other.multiplied_by(-1.0)).cleaned();
        let yields = diff
            .yield_discounting
            .values()
            .flatten()
            .map(|(_, v)| v.abs());
        let forwards = diff.forward.values().flatten().map(|f| f.value.abs());
        yields.chain(forwards).fold(0.0, f64::max)
    }
}

impl AddAssign for MulticurveSensitivity {
    fn add_assign(&mut self, rhs: Self) {
        for (name, points) in rhs.yield_discounting {
            self.yield_discounting.entry(name).or_default().extend(points);
        }
        for (name, points) in rhs.forward {
            self.forward.entry(name).or_default().extend(points);
        }
    }
}

impl Add for MulticurveSensitivity {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl std::iter::Sum for MulticurveSensitivity {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::new(), Add::add)
    }
}
