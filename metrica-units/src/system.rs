//! System of units - the public facade
//!
//! Owns a `Metrics` registry and a `Conversions` graph and exposes the
//! registration, parsing and conversion API over unit-expression strings.

use std::sync::Arc;
use metrica_core::{Exponential, MetricaError, NumberError};
use crate::parse::split_quantity;
use crate::{Catalog, Conversion, ConversionKey, Conversions, Metric, Metrics, Prefix, Quantity, Unit};

/// A registry of prefixes and units together with their conversions
#[derive(Debug, Clone, Default)]
pub struct SystemOfUnits {
    metrics: Metrics,
    conversions: Conversions,
}

impl SystemOfUnits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a system holding exactly the entries of a catalog
    pub fn from_catalog(catalog: &Catalog) -> Result<Self, MetricaError> {
        let mut system = Self::new();
        catalog.apply(&mut system)?;
        Ok(system)
    }

    // ========== Registration ==========

    pub fn add_prefix(&mut self, name: &str, symbol: &str, factor: Exponential) -> Arc<Prefix> {
        self.metrics.add_prefix(name, symbol, factor)
    }

    pub fn add_unit(&mut self, name: &str, symbol: &str, dimension: Option<&str>) -> Arc<Unit> {
        self.metrics.add_unit(name, symbol, dimension)
    }

    /// Register a directed conversion.
    ///
    /// `from` and `to` are either a dimension tag carried by a registered
    /// unit (e.g. "Temperature") or a unit expression (e.g. "kg.m/s2").
    pub fn add_conversion<F>(&mut self, from: &str, to: &str, transform: F) -> Result<Conversion, MetricaError>
    where
        F: Fn(&Exponential) -> Result<Exponential, NumberError> + Send + Sync + 'static,
    {
        let (from_key, from_scale) = self.conversion_endpoint(from)?;
        let (to_key, to_scale) = self.conversion_endpoint(to)?;

        // edges join base forms; prefixed endpoints fold their scale into the transform
        let conversion = match (from_scale, to_scale) {
            (None, None) => self.conversions.add(from_key, to_key, transform),
            (from_scale, to_scale) => {
                let from_scale = from_scale.unwrap_or_else(|| Exponential::from_i64(1));
                let to_scale = to_scale.unwrap_or_else(|| Exponential::from_i64(1));
                self.conversions.add(from_key, to_key, move |x| {
                    let given = x.checked_div(&from_scale)?;
                    Ok(&transform(&given)? * &to_scale)
                })
            }
        };
        Ok(conversion)
    }

    /// Dimension name, or the base key of a metric with its prefix scale if it has prefixes
    fn conversion_endpoint(&self, text: &str) -> Result<(ConversionKey, Option<Exponential>), MetricaError> {
        if self.metrics.unit(text).is_none() && self.metrics.has_dimension(text) {
            return Ok((ConversionKey::dimension(text), None));
        }

        let metric = self.metrics.parse_metric(text)?;
        if !metric.has_prefixes() {
            return Ok((ConversionKey::metric(&metric), None));
        }
        let scale = metric.prefix_scale()?;
        Ok((ConversionKey::metric(&metric.base()), Some(scale)))
    }

    // ========== Parsing ==========

    /// Parse a quantity such as "1.2e4kg.m/s2" or "5 km"
    pub fn quantity(&self, expression: &str) -> Result<Quantity, MetricaError> {
        let (numeral, units) = split_quantity(expression.trim())?;
        let value = Exponential::parse(numeral)
            .map_err(|e| MetricaError::from(e).with_expression(expression))?;
        let metric = self.metrics.parse_metric(units.trim())
            .map_err(|e| e.with_note(format!("while parsing quantity '{}'", expression)))?;
        Ok(Quantity::new(value, metric))
    }

    /// Parse a unit expression such as "kg.m/s2"
    pub fn metric(&self, expression: &str) -> Result<Metric, MetricaError> {
        self.metrics.parse_metric(expression.trim())
    }

    // ========== Conversion ==========

    /// Fold prefixes into the value
    pub fn to_base(&self, quantity: &Quantity) -> Result<Quantity, MetricaError> {
        self.conversions.to_base_units(quantity)
    }

    pub fn to_base_expr(&self, expression: &str) -> Result<Quantity, MetricaError> {
        self.to_base(&self.quantity(expression)?)
    }

    pub fn convert(&self, quantity: &Quantity, target: &Metric) -> Result<Quantity, MetricaError> {
        self.conversions.convert(quantity, target)
    }

    pub fn convert_to(&self, quantity: &Quantity, target: &str) -> Result<Quantity, MetricaError> {
        self.convert(quantity, &self.metric(target)?)
    }

    /// Parse and convert in one step: `convert_expr("0C", "K")`
    pub fn convert_expr(&self, expression: &str, target: &str) -> Result<Quantity, MetricaError> {
        self.convert_to(&self.quantity(expression)?, target)
    }

    // ========== Accessors ==========

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn conversions(&self) -> &Conversions {
        &self.conversions
    }
}
