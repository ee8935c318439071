//! Curve provider: the query interface pricing methods consume.

use super::curves::{InterpolatedCurve, YieldCurve};
use super::MarketDataError;
use crate::types::{Currency, IssuerId, RateIndex};
use std::collections::BTreeMap;

/// Matrix of curve parameter derivatives with respect to market quotes.
///
/// `values[i][j] = ∂(node i) / ∂(quote j)`. Produced by curve calibration
/// and carried by the provider so that parameter sensitivities can be
/// expressed as market-quote sensitivities.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveJacobian {
    values: Vec<Vec<f64>>,
}

impl CurveJacobian {
    /// Builds a rectangular Jacobian.
    pub fn new(values: Vec<Vec<f64>>) -> Result<Self, MarketDataError> {
        let columns = values.first().map(Vec::len).unwrap_or(0);
        if values.iter().any(|row| row.len() != columns) {
            return Err(MarketDataError::InvalidCurve(
                "Jacobian rows must have equal length".to_string(),
            ));
        }
        Ok(Self { values })
    }

    /// Identity Jacobian (parameters are the quotes).
    pub fn identity(n: usize) -> Self {
        let values = (0..n)
            .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
            .collect();
        Self { values }
    }

    /// Number of curve parameters (rows).
    pub fn parameter_count(&self) -> usize {
        self.values.len()
    }

    /// Number of market quotes (columns).
    pub fn quote_count(&self) -> usize {
        self.values.first().map(Vec::len).unwrap_or(0)
    }

    /// Row-major values.
    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// `sensitivity^T · J`: parameter sensitivities mapped onto quotes.
    pub fn transform(&self, parameter_sensitivity: &[f64]) -> Result<Vec<f64>, MarketDataError> {
        if parameter_sensitivity.len() != self.values.len() {
            return Err(MarketDataError::InvalidCurve(format!(
                "sensitivity has {} entries, Jacobian has {} rows",
                parameter_sensitivity.len(),
                self.values.len()
            )));
        }
        let mut quotes = vec![0.0; self.quote_count()];
        for (s, row) in parameter_sensitivity.iter().zip(&self.values) {
            for (q, j) in quotes.iter_mut().zip(row) {
                *q += s * j;
            }
        }
        Ok(quotes)
    }
}

/// Read-only curve queries used by every pricing method.
pub trait CurveProvider: Send + Sync {
    /// Name of the curve discounting cash flows in `currency`.
    fn discount_curve_name(&self, currency: Currency) -> Result<&str, MarketDataError>;

    /// Name of the curve projecting `index` forwards.
    fn forward_curve_name(&self, index: &RateIndex) -> Result<&str, MarketDataError>;

    /// Name of the curve discounting `issuer` bonds.
    fn issuer_curve_name(&self, issuer: &IssuerId) -> Result<&str, MarketDataError>;

    /// Curve by name.
    fn curve(&self, name: &str) -> Result<&InterpolatedCurve, MarketDataError>;

    /// All curve names, sorted.
    fn curve_names(&self) -> Vec<&str>;

    /// Calibration Jacobian of the named curve, if known.
    fn jacobian(&self, name: &str) -> Option<&CurveJacobian>;

    /// Discount factor for `currency` at time `t`.
    fn discount_factor(&self, currency: Currency, t: f64) -> Result<f64, MarketDataError> {
        self.curve(self.discount_curve_name(currency)?)?
            .discount_factor(t)
    }

    /// Discount factor on the issuer curve at time `t`.
    fn issuer_discount_factor(&self, issuer: &IssuerId, t: f64) -> Result<f64, MarketDataError> {
        self.curve(self.issuer_curve_name(issuer)?)?
            .discount_factor(t)
    }

    /// Simply compounded forward rate of `index` over `[start, end]`:
    /// `(D(start) / D(end) - 1) / accrual`.
    fn forward_rate(
        &self,
        index: &RateIndex,
        start: f64,
        end: f64,
        accrual: f64,
    ) -> Result<f64, MarketDataError> {
        if end <= start || accrual <= 0.0 {
            return Err(MarketDataError::InvalidPeriod {
                start,
                end,
                accrual,
            });
        }
        let curve = self.curve(self.forward_curve_name(index)?)?;
        Ok((curve.discount_factor(start)? / curve.discount_factor(end)? - 1.0) / accrual)
    }
}

/// Immutable set of named curves with currency, index and issuer mappings.
///
/// Several keys may map to the same curve (single-curve setups). Bumping
/// returns a new provider and leaves `self` untouched, so concurrent
/// finite-difference evaluations can share one base snapshot.
#[derive(Debug, Clone, Default)]
pub struct MulticurveProvider {
    curves: BTreeMap<String, InterpolatedCurve>,
    discount: BTreeMap<Currency, String>,
    forward: BTreeMap<RateIndex, String>,
    issuer: BTreeMap<IssuerId, String>,
    jacobians: BTreeMap<String, CurveJacobian>,
}

impl MulticurveProvider {
    /// Empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `curve` under `name` and maps `currency` discounting to it.
    pub fn with_discount_curve(
        mut self,
        currency: Currency,
        name: impl Into<String>,
        curve: InterpolatedCurve,
    ) -> Self {
        let name = name.into();
        self.curves.insert(name.clone(), curve);
        self.discount.insert(currency, name);
        self
    }

    /// Registers `curve` under `name` and maps `index` forwards to it.
    pub fn with_forward_curve(
        mut self,
        index: RateIndex,
        name: impl Into<String>,
        curve: InterpolatedCurve,
    ) -> Self {
        let name = name.into();
        self.curves.insert(name.clone(), curve);
        self.forward.insert(index, name);
        self
    }

    /// Registers `curve` under `name` and maps `issuer` to it.
    pub fn with_issuer_curve(
        mut self,
        issuer: IssuerId,
        name: impl Into<String>,
        curve: InterpolatedCurve,
    ) -> Self {
        let name = name.into();
        self.curves.insert(name.clone(), curve);
        self.issuer.insert(issuer, name);
        self
    }

    /// Attaches a calibration Jacobian to an existing curve.
    pub fn with_jacobian(
        mut self,
        name: &str,
        jacobian: CurveJacobian,
    ) -> Result<Self, MarketDataError> {
        let curve = self.curve(name)?;
        if jacobian.parameter_count() != curve.node_count() {
            return Err(MarketDataError::InvalidJacobian {
                curve: name.to_string(),
                reason: format!(
                    "{} rows for {} curve nodes",
                    jacobian.parameter_count(),
                    curve.node_count()
                ),
            });
        }
        self.jacobians.insert(name.to_string(), jacobian);
        Ok(self)
    }

    /// A new provider with the named curve replaced.
    pub fn with_replaced_curve(
        &self,
        name: &str,
        curve: InterpolatedCurve,
    ) -> Result<Self, MarketDataError> {
        let mut bumped = self.clone();
        match bumped.curves.get_mut(name) {
            Some(slot) => *slot = curve,
            None => {
                return Err(MarketDataError::CurveNotFound {
                    name: name.to_string(),
                })
            }
        }
        Ok(bumped)
    }

    /// A new provider with node `index` of curve `name` shifted by `shift`.
    pub fn with_bumped_node(
        &self,
        name: &str,
        index: usize,
        shift: f64,
    ) -> Result<Self, MarketDataError> {
        let curve = self.curve(name)?;
        if index >= curve.node_count() {
            return Err(MarketDataError::InvalidNode {
                curve: name.to_string(),
                index,
                count: curve.node_count(),
            });
        }
        self.with_replaced_curve(name, curve.with_shifted_node(index, shift)?)
    }

    /// A new provider with every node of curve `name` shifted by `shift`.
    pub fn with_parallel_shift(&self, name: &str, shift: f64) -> Result<Self, MarketDataError> {
        let curve = self.curve(name)?.with_parallel_shift(shift);
        self.with_replaced_curve(name, curve)
    }
}

impl CurveProvider for MulticurveProvider {
    fn discount_curve_name(&self, currency: Currency) -> Result<&str, MarketDataError> {
        self.discount
            .get(&currency)
            .map(String::as_str)
            .ok_or(MarketDataError::MissingDiscountCurve { currency })
    }

    fn forward_curve_name(&self, index: &RateIndex) -> Result<&str, MarketDataError> {
        self.forward
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| MarketDataError::MissingForwardCurve {
                index: index.clone(),
            })
    }

    fn issuer_curve_name(&self, issuer: &IssuerId) -> Result<&str, MarketDataError> {
        self.issuer
            .get(issuer)
            .map(String::as_str)
            .ok_or_else(|| MarketDataError::MissingIssuerCurve {
                issuer: issuer.clone(),
            })
    }

    fn curve(&self, name: &str) -> Result<&InterpolatedCurve, MarketDataError> {
        self.curves
            .get(name)
            .ok_or_else(|| MarketDataError::CurveNotFound {
                name: name.to_string(),
            })
    }

    fn curve_names(&self) -> Vec<&str> {
        self.curves.keys().map(String::as_str).collect()
    }

    fn jacobian(&self, name: &str) -> Option<&CurveJacobian> {
        self.jacobians.get(name)
    }
}
