//! Registry of prefixes and units
//!
//! Parses unit expressions into metrics. The grammar is
//! `Expr := Term (('.' | '/') Term)*`, `Term := [prefix]unit[-?digits]`.

use std::collections::HashMap;
use std::sync::Arc;
use metrica_core::{Exponential, MetricaError};
use crate::parse::{split_exponent, split_terms, Op};
use crate::{Metric, Prefix, Term, Unit};

/// Known prefixes and units
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    prefixes: HashMap<String, Arc<Prefix>>,
    units: HashMap<String, Arc<Unit>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a prefix, replacing any prefix with the same symbol
    pub fn add_prefix(&mut self, name: &str, symbol: &str, factor: Exponential) -> Arc<Prefix> {
        let prefix = Arc::new(Prefix::new(name, symbol, factor));
        if self.prefixes.insert(symbol.to_string(), prefix.clone()).is_some() {
            tracing::warn!(symbol, "prefix redefined");
        }
        tracing::debug!(name, symbol, factor = %prefix.factor, "registered prefix");
        prefix
    }

    /// Register a unit, replacing any unit with the same symbol
    pub fn add_unit(&mut self, name: &str, symbol: &str, dimension: Option<&str>) -> Arc<Unit> {
        let unit = Arc::new(Unit::new(name, symbol, dimension));
        if self.units.insert(symbol.to_string(), unit.clone()).is_some() {
            tracing::warn!(symbol, "unit redefined");
        }
        tracing::debug!(name, symbol, dimension, "registered unit");
        unit
    }

    pub fn prefix(&self, symbol: &str) -> Option<&Arc<Prefix>> {
        self.prefixes.get(symbol)
    }

    pub fn unit(&self, symbol: &str) -> Option<&Arc<Unit>> {
        self.units.get(symbol)
    }

    /// Check if any registered unit carries this dimension tag
    pub fn has_dimension(&self, tag: &str) -> bool {
        self.units.values().any(|u| u.dimension.as_deref() == Some(tag))
    }

    /// All prefixes, sorted by symbol
    pub fn prefixes(&self) -> Vec<&Arc<Prefix>> {
        let mut prefixes: Vec<_> = self.prefixes.values().collect();
        prefixes.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        prefixes
    }

    /// All units, sorted by symbol
    pub fn units(&self) -> Vec<&Arc<Unit>> {
        let mut units: Vec<_> = self.units.values().collect();
        units.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        units
    }

    /// Parse a unit expression such as "kg.m/s2" into a metric.
    ///
    /// `/` negates the exponent of the term it precedes, so "m/s2" and
    /// "m.s-2" give the same metric. An empty expression is dimensionless.
    pub fn parse_metric(&self, expression: &str) -> Result<Metric, MetricaError> {
        if expression.is_empty() {
            return Ok(Metric::dimensionless());
        }

        let mut terms = Vec::new();
        for (op, text) in split_terms(expression)? {
            let mut term = self.parse_term(text, expression)?;
            if op == Op::Divide {
                term.exponent = term.exponent.checked_neg().ok_or_else(|| {
                    MetricaError::argument_error(format!("Exponent out of range: '/{}'", text))
                        .with_expression(expression)
                        .with_symbol(text)
                })?;
            }
            tracing::trace!(text, term = %term, "parsed unit term");
            terms.push(term);
        }

        Metric::checked(terms, expression)
    }

    fn parse_term(&self, text: &str, expression: &str) -> Result<Term, MetricaError> {
        // A registered symbol wins over any exponent or prefix reading of it
        if let Some(unit) = self.units.get(text) {
            return Ok(Term::new(None, unit.clone(), 1));
        }

        let (body, exponent) = match split_exponent(text) {
            Some((body, digits)) => {
                let exponent: i32 = digits.parse().map_err(|_| {
                    MetricaError::argument_error(format!("Exponent out of range: '{}'", digits))
                        .with_expression(expression)
                        .with_symbol(text)
                })?;
                (body, exponent)
            }
            None => (text, 1),
        };

        let (prefix, unit) = self.resolve_symbol(body)
            .ok_or_else(|| MetricaError::lookup_error(body, expression))?;

        Ok(Term::new(prefix, unit, exponent))
    }

    /// Resolve "km" to (kilo, meter). Unit symbols take priority over
    /// prefix splits; longer prefix symbols are tried first.
    fn resolve_symbol(&self, symbol: &str) -> Option<(Option<Arc<Prefix>>, Arc<Unit>)> {
        if let Some(unit) = self.units.get(symbol) {
            return Some((None, unit.clone()));
        }

        let mut prefixes: Vec<&Arc<Prefix>> = self.prefixes.values().collect();
        prefixes.sort_by(|a, b| b.symbol.len().cmp(&a.symbol.len()).then_with(|| a.symbol.cmp(&b.symbol)));

        prefixes.into_iter().find_map(|prefix| {
            let rest = symbol.strip_prefix(prefix.symbol.as_str())?;
            let unit = self.units.get(rest)?;
            Some((Some(prefix.clone()), unit.clone()))
        })
    }
}
