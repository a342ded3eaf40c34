//! Composite units
//!
//! A metric is an ordered product of prefixed units raised to integer powers,
//! e.g. `kg.m.s-2`. Term order only affects display.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use serde::{Serialize, Serializer};
use metrica_core::{Exponential, MetricaError, NumberError};
use crate::{Prefix, Unit};

/// One factor of a metric: `[prefix]unit[exponent]`
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub prefix: Option<Arc<Prefix>>,
    pub unit: Arc<Unit>,
    pub exponent: i32,
}

impl Term {
    pub fn new(prefix: Option<Arc<Prefix>>, unit: Arc<Unit>, exponent: i32) -> Self {
        Term { prefix, unit, exponent }
    }

    /// The same term with its prefix removed
    pub fn without_prefix(&self) -> Term {
        Term::new(None, self.unit.clone(), self.exponent)
    }

    /// Prefix and unit symbol, e.g. "km"
    pub fn symbol(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}{}", prefix.symbol, self.unit.symbol),
            None => self.unit.symbol.clone(),
        }
    }

    /// `factor^exponent` of the prefix, 1 without one
    pub fn scale(&self) -> Result<Exponential, NumberError> {
        match &self.prefix {
            Some(prefix) => prefix.factor.pow(self.exponent),
            None => Ok(Exponential::from_i64(1)),
        }
    }

    /// A prefixed unit or a power above 1 on a symbol ending in a digit would
    /// read back wrongly in `.` form ("m2" squared is not "m22"); such a
    /// term is written as a division by its negated power, "/m2-2"
    fn needs_division_form(&self) -> bool {
        let digit_ending = self.unit.symbol.ends_with(|c: char| c.is_ascii_digit());
        digit_ending && self.exponent > 0 && (self.exponent > 1 || self.prefix.is_some())
    }

    fn sort_key(&self) -> (&str, &str, i32) {
        let prefix = self.prefix.as_ref().map_or("", |p| p.symbol.as_str());
        (self.unit.symbol.as_str(), prefix, self.exponent)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digit_ending = self.unit.symbol.ends_with(|c: char| c.is_ascii_digit());
        match self.exponent {
            1 => write!(f, "{}", self.symbol()),
            0 if digit_ending => write!(f, "{}-0", self.symbol()),
            exp => write!(f, "{}{}", self.symbol(), exp),
        }
    }
}

/// A composite unit
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metric {
    terms: Vec<Term>,
}

impl Metric {
    pub(crate) fn new(terms: Vec<Term>) -> Self {
        Metric { terms }
    }

    /// The empty product
    pub fn dimensionless() -> Self {
        Metric::default()
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Only metrics that render back to themselves are built
    pub(crate) fn checked(terms: Vec<Term>, expression: impl fmt::Display) -> Result<Metric, MetricaError> {
        if !terms.is_empty() && terms.iter().all(Term::needs_division_form) {
            return Err(MetricaError::argument_error(format!(
                "'{}' cannot be written as a unit expression", expression))
                .with_suggestion("Keep a term without a digit-ending symbol first"));
        }
        Ok(Metric::new(terms))
    }

    /// Unit symbol -> summed exponent, prefixes ignored, zero exponents dropped
    pub fn exponents(&self) -> BTreeMap<&str, i64> {
        let mut exponents = BTreeMap::new();
        for term in &self.terms {
            *exponents.entry(term.unit.symbol.as_str()).or_insert(0) += i64::from(term.exponent);
        }
        exponents.retain(|_, exp| *exp != 0);
        exponents
    }

    /// Check if all exponents cancel
    pub fn is_dimensionless(&self) -> bool {
        self.exponents().is_empty()
    }

    /// Same reduced exponent vector, ignoring prefixes
    pub fn is_dimension_equal(&self, other: &Metric) -> bool {
        self.exponents() == other.exponents()
    }

    /// Same multiset of terms, in any order
    pub fn is_equivalent(&self, other: &Metric) -> bool {
        if self.terms.len() != other.terms.len() {
            return false;
        }
        let mut mine: Vec<_> = self.terms.iter().map(Term::sort_key).collect();
        let mut theirs: Vec<_> = other.terms.iter().map(Term::sort_key).collect();
        mine.sort_unstable();
        theirs.sort_unstable();
        mine == theirs
    }

    pub fn has_prefixes(&self) -> bool {
        self.terms.iter().any(|t| t.prefix.is_some())
    }

    /// The metric with every prefix stripped
    pub fn base(&self) -> Metric {
        Metric::new(self.terms.iter().map(Term::without_prefix).collect())
    }

    /// Product of all prefix factors raised to their term exponents
    pub fn prefix_scale(&self) -> Result<Exponential, NumberError> {
        let mut scale = Exponential::from_i64(1);
        for term in self.terms.iter().filter(|t| t.prefix.is_some()) {
            scale = &scale * &term.scale()?;
        }
        Ok(scale)
    }

    /// Dimension tag of a single unprefixed unit with exponent 1
    pub fn dimension(&self) -> Option<&str> {
        match self.terms.as_slice() {
            [term] if term.exponent == 1 && term.prefix.is_none() => term.unit.dimension.as_deref(),
            _ => None,
        }
    }

    /// Order-independent rendering used to key conversions
    pub fn key(&self) -> String {
        let mut terms = self.terms.clone();
        terms.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Metric::new(terms).to_string()
    }

    /// Multiply metrics (concatenate terms)
    pub fn multiply(&self, other: &Metric) -> Metric {
        let mut terms = self.terms.clone();
        terms.extend(other.terms.iter().cloned());
        Metric::new(terms)
    }

    /// Divide metrics (concatenate negated terms)
    pub fn divide(&self, other: &Metric) -> Result<Metric, MetricaError> {
        let mut terms = self.terms.clone();
        terms.extend(other.scaled_terms(-1)?);
        Metric::checked(terms, format_args!("{}/({})", self, other))
    }

    /// Raise to integer power (multiply exponents)
    pub fn power(&self, exp: i32) -> Result<Metric, MetricaError> {
        Metric::checked(self.scaled_terms(exp)?, format_args!("({}){}", self, exp))
    }

    /// Invert (negate exponents)
    pub fn invert(&self) -> Result<Metric, MetricaError> {
        self.power(-1)
    }

    fn scaled_terms(&self, exp: i32) -> Result<Vec<Term>, MetricaError> {
        self.terms.iter().map(|t| {
            let exponent = t.exponent.checked_mul(exp).ok_or_else(|| {
                MetricaError::argument_error(format!("Exponent overflow raising '{}' to {}", t, exp))
                    .with_symbol(t.symbol())
            })?;
            Ok(Term::new(t.prefix.clone(), t.unit.clone(), exponent))
        }).collect()
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // a division-form term cannot open the expression
        let Some(lead) = self.terms.iter().position(|t| !t.needs_division_form()) else {
            let parts: Vec<String> = self.terms.iter().map(|t| t.to_string()).collect();
            return write!(f, "{}", parts.join("."));
        };

        write!(f, "{}", self.terms[lead])?;
        for (i, term) in self.terms.iter().enumerate() {
            if i == lead {
                continue;
            }
            if term.needs_division_form() {
                write!(f, "/{}-{}", term.symbol(), term.exponent)?;
            } else {
                write!(f, ".{}", term)?;
            }
        }
        Ok(())
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
