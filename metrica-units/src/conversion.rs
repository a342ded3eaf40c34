//! Conversion graph
//!
//! Directed transforms between metrics or dimension tags. A transform is an
//! arbitrary value-to-value function, so offset conversions (Kelvin and
//! Celsius) need no special casing. A reverse transform is never implied.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use metrica_core::{Exponential, MetricaError, NumberError};
use crate::{Metric, Quantity};

/// Longest chain of metric-keyed edges tried when no direct or
/// dimension-level conversion exists
pub const MAX_CONVERSION_HOPS: usize = 3;

/// Value-to-value transform of a conversion
pub type Transform = Arc<dyn Fn(&Exponential) -> Result<Exponential, NumberError> + Send + Sync>;

/// Endpoint of a conversion
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConversionKey {
    /// A specific metric, keyed by `Metric::key`
    Metric(String),
    /// Every unit carrying this dimension tag
    Dimension(String),
}

impl ConversionKey {
    pub fn metric(metric: &Metric) -> Self {
        ConversionKey::Metric(metric.key())
    }

    pub fn dimension(tag: &str) -> Self {
        ConversionKey::Dimension(tag.to_string())
    }
}

impl fmt::Display for ConversionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionKey::Metric(key) => write!(f, "{}", key),
            ConversionKey::Dimension(tag) => write!(f, "<{}>", tag),
        }
    }
}

/// A directed conversion
#[derive(Clone)]
pub struct Conversion {
    pub from: ConversionKey,
    pub to: ConversionKey,
    transform: Transform,
}

impl Conversion {
    pub fn new<F>(from: ConversionKey, to: ConversionKey, transform: F) -> Self
    where
        F: Fn(&Exponential) -> Result<Exponential, NumberError> + Send + Sync + 'static,
    {
        Conversion { from, to, transform: Arc::new(transform) }
    }

    pub fn apply(&self, value: &Exponential) -> Result<Exponential, NumberError> {
        (self.transform)(value)
    }
}

impl fmt::Debug for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conversion")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish_non_exhaustive()
    }
}

/// Registry of conversions keyed by (from, to)
#[derive(Debug, Clone, Default)]
pub struct Conversions {
    edges: BTreeMap<(ConversionKey, ConversionKey), Conversion>,
}

impl Conversions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a conversion, replacing any existing one for the same pair.
    ///
    /// Keys are stored as given, so a metric key should name a base form:
    /// `convert` looks edges up by the base forms of prefixed metrics.
    /// `SystemOfUnits::add_conversion` does this normalization.
    pub fn add<F>(&mut self, from: ConversionKey, to: ConversionKey, transform: F) -> Conversion
    where
        F: Fn(&Exponential) -> Result<Exponential, NumberError> + Send + Sync + 'static,
    {
        let conversion = Conversion::new(from.clone(), to.clone(), transform);
        tracing::debug!(from = %from, to = %to, "registered conversion");
        if self.edges.insert((from, to), conversion.clone()).is_some() {
            tracing::warn!(from = %conversion.from, to = %conversion.to, "conversion redefined");
        }
        conversion
    }

    pub fn get(&self, from: &ConversionKey, to: &ConversionKey) -> Option<&Conversion> {
        self.edges.get(&(from.clone(), to.clone()))
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Conversion> {
        self.edges.values()
    }

    /// Fold every prefix into the value: `5km` becomes `5000m`.
    /// No registered conversion is consulted.
    pub fn to_base_units(&self, quantity: &Quantity) -> Result<Quantity, MetricaError> {
        if !quantity.metric.has_prefixes() {
            return Ok(quantity.clone());
        }
        let scale = quantity.metric.prefix_scale()?;
        Ok(Quantity::new(&quantity.value * &scale, quantity.metric.base()))
    }

    /// Convert a quantity to the target metric.
    ///
    /// Resolution order:
    /// 1. identical metric: returned unchanged
    /// 2. conversion between the two metrics
    /// 3. prefix folding: base forms that are dimension-equal only need
    ///    rescaling, otherwise a conversion between the base forms
    /// 4. conversion from the source's dimension tag to the target metric or
    ///    the target's dimension tag
    /// 5. a chain of at most `MAX_CONVERSION_HOPS` metric-keyed conversions
    pub fn convert(&self, quantity: &Quantity, target: &Metric) -> Result<Quantity, MetricaError> {
        if quantity.metric == *target {
            tracing::debug!(metric = %target, "identity conversion");
            return Ok(quantity.clone());
        }

        let source_key = ConversionKey::metric(&quantity.metric);
        let target_key = ConversionKey::metric(target);
        if let Some(conversion) = self.get(&source_key, &target_key) {
            tracing::debug!(from = %source_key, to = %target_key, "direct conversion");
            return Ok(Quantity::new(conversion.apply(&quantity.value)?, target.clone()));
        }

        let base = self.to_base_units(quantity)?;
        let target_base = target.base();
        let target_scale = target.prefix_scale()?;
        // value expressed in the target's base form -> value in the target
        let finish = |value: Exponential| -> Result<Quantity, MetricaError> {
            Ok(Quantity::new(value.checked_div(&target_scale)?, target.clone()))
        };

        if base.metric.is_dimension_equal(&target_base) {
            tracing::debug!(from = %quantity.metric, to = %target, "prefix rescale");
            return finish(base.value);
        }

        let base_key = ConversionKey::metric(&base.metric);
        let target_base_key = ConversionKey::metric(&target_base);
        if let Some(conversion) = self.get(&base_key, &target_base_key) {
            tracing::debug!(from = %base_key, to = %target_base_key, "base form conversion");
            return finish(conversion.apply(&base.value)?);
        }

        if let Some(conversion) = self.by_dimension(&quantity.metric, target) {
            tracing::debug!(from = %conversion.from, to = %conversion.to, "dimension conversion");
            return Ok(Quantity::new(conversion.apply(&quantity.value)?, target.clone()));
        }
        if let Some(conversion) = self.by_dimension(&base.metric, &target_base) {
            tracing::debug!(from = %conversion.from, to = %conversion.to, "base form dimension conversion");
            return finish(conversion.apply(&base.value)?);
        }

        if let Some(path) = self.find_path(&base_key, &target_base_key) {
            tracing::debug!(from = %base_key, to = %target_base_key, hops = path.len(), "chained conversion");
            let mut value = base.value;
            for conversion in path {
                value = conversion.apply(&value)?;
            }
            return finish(value);
        }

        Err(MetricaError::conversion_not_found(&quantity.metric.to_string(), &target.to_string()))
    }

    fn by_dimension(&self, source: &Metric, target: &Metric) -> Option<&Conversion> {
        let from = ConversionKey::dimension(source.dimension()?);
        self.get(&from, &ConversionKey::metric(target)).or_else(|| {
            let to = ConversionKey::dimension(target.dimension()?);
            self.get(&from, &to)
        })
    }

    /// Breadth-first search over metric-keyed conversions
    fn find_path(&self, from: &ConversionKey, to: &ConversionKey) -> Option<Vec<&Conversion>> {
        let mut visited = HashSet::from([from.clone()]);
        let mut queue = VecDeque::from([(from.clone(), Vec::new())]);

        while let Some((key, path)) = queue.pop_front() {
            if path.len() >= MAX_CONVERSION_HOPS {
                continue;
            }
            for conversion in self.edges.values().filter(|c| c.from == key) {
                let mut next: Vec<&Conversion> = path.clone();
                next.push(conversion);
                if conversion.to == *to {
                    return Some(next);
                }
                if visited.insert(conversion.to.clone()) {
                    queue.push_back((conversion.to.clone(), next));
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrica_core::codes;
    use crate::Metrics;

    fn registry() -> Metrics {
        let mut metrics = Metrics::new();
        metrics.add_prefix("kilo", "k", Exponential::from_parts(1, 3));
        metrics.add_prefix("centi", "c", Exponential::from_parts(1, -2));
        metrics.add_unit("meter", "m", Some("Length"));
        metrics.add_unit("inch", "[in_i]", Some("Length"));
        metrics.add_unit("foot", "[ft_i]", Some("Length"));
        metrics.add_unit("kelvin", "K", Some("Temperature"));
        metrics.add_unit("celsius", "C", Some("Temperature"));
        metrics.add_unit("fahrenheit", "[degF]", Some("Temperature"));
        metrics
    }

    fn quantity(metrics: &Metrics, value: &str, expr: &str) -> Quantity {
        Quantity::new(Exponential::parse(value).unwrap(), metrics.parse_metric(expr).unwrap())
    }

    fn key(metrics: &Metrics, expr: &str) -> ConversionKey {
        ConversionKey::metric(&metrics.parse_metric(expr).unwrap())
    }

    fn graph(metrics: &Metrics) -> Conversions {
        let mut conversions = Conversions::new();
        conversions.add(key(metrics, "C"), key(metrics, "K"),
            |x| Ok(x + &Exponential::from_parts(27315, -2)));
        conversions.add(key(metrics, "K"), key(metrics, "C"),
            |x| Ok(x - &Exponential::from_parts(27315, -2)));
        conversions.add(key(metrics, "[in_i]"), key(metrics, "m"),
            |x| Ok(x * &Exponential::from_parts(254, -4)));
        conversions.add(key(metrics, "[ft_i]"), key(metrics, "[in_i]"),
            |x| Ok(x * &Exponential::from_i64(12)));
        conversions.add(ConversionKey::dimension("Temperature"), key(metrics, "[degF]"),
            |x| Ok(&(x - &Exponential::from_parts(27315, -2)) * &Exponential::from_parts(18, -1)
                + Exponential::from_i64(32)));
        conversions
    }

    #[test]
    fn test_identity_keeps_precision() {
        let metrics = registry();
        let q = quantity(&metrics, "1.20", "km");
        let same = graph(&metrics).convert(&q, &q.metric).unwrap();
        assert!(same.exact_eq(&q));
    }

    #[test]
    fn test_direct_offset_conversion() {
        let metrics = registry();
        let q = quantity(&metrics, "0", "C");
        let kelvin = graph(&metrics).convert(&q, &metrics.parse_metric("K").unwrap()).unwrap();
        assert_eq!(kelvin.value, Exponential::exact("273.15").unwrap());
        assert_eq!(kelvin.metric.to_string(), "K");
    }

    #[test]
    fn test_to_base_units() {
        let metrics = registry();
        let conversions = graph(&metrics);
        let q = quantity(&metrics, "5.0", "km");
        let base = conversions.to_base_units(&q).unwrap();
        assert_eq!(base.value, Exponential::from_i64(5000));
        assert_eq!(base.value.significant_digits(), Some(2));
        assert_eq!(base.metric.to_string(), "m");

        let again = conversions.to_base_units(&base).unwrap();
        assert!(again.exact_eq(&base));
    }

    #[test]
    fn test_to_base_units_negative_exponent() {
        let metrics = registry();
        let q = quantity(&metrics, "3", "m/cm2");
        let base = graph(&metrics).to_base_units(&q).unwrap();
        assert_eq!(base.value, Exponential::from_i64(30000));
        assert_eq!(base.metric.to_string(), "m.m-2");
    }

    #[test]
    fn test_prefix_rescale() {
        let metrics = registry();
        let q = quantity(&metrics, "2.5", "km");
        let cm = graph(&metrics).convert(&q, &metrics.parse_metric("cm").unwrap()).unwrap();
        assert_eq!(cm.value, Exponential::from_i64(250000));
        assert_eq!(cm.value.significant_digits(), Some(2));
    }

    #[test]
    fn test_base_form_conversion_with_target_prefix() {
        let metrics = registry();
        let q = quantity(&metrics, "100", "[in_i]");
        let cm = graph(&metrics).convert(&q, &metrics.parse_metric("cm").unwrap()).unwrap();
        assert_eq!(cm.value, Exponential::exact("254").unwrap());
    }

    #[test]
    fn test_dimension_level_conversion() {
        let metrics = registry();
        let q = quantity(&metrics, "373.15", "K");
        let f = graph(&metrics).convert(&q, &metrics.parse_metric("[degF]").unwrap()).unwrap();
        assert_eq!(f.value, Exponential::from_i64(212));
    }

    #[test]
    fn test_chained_conversion() {
        let metrics = registry();
        let q = quantity(&metrics, "1", "[ft_i]");
        let m = graph(&metrics).convert(&q, &metrics.parse_metric("m").unwrap()).unwrap();
        assert_eq!(m.value, Exponential::exact("0.3048").unwrap());
    }

    #[test]
    fn test_reverse_is_not_implied() {
        let metrics = registry();
        let q = quantity(&metrics, "1", "m");
        let err = graph(&metrics).convert(&q, &metrics.parse_metric("[in_i]").unwrap()).unwrap_err();
        assert!(err.is(codes::CONVERSION_NOT_FOUND));
    }

    #[test]
    fn test_unrelated_dimensions() {
        let metrics = registry();
        let q = quantity(&metrics, "1", "m");
        let err = graph(&metrics).convert(&q, &metrics.parse_metric("K").unwrap()).unwrap_err();
        assert!(err.is(codes::CONVERSION_NOT_FOUND));
        assert!(err.message.contains("'m'"));
        assert!(err.message.contains("'K'"));
    }

    #[test]
    fn test_hop_limit() {
        let metrics = registry();
        let mut conversions = Conversions::new();
        // C -> K -> [degF] -> [in_i] -> m: four hops
        let one = |x: &Exponential| -> Result<Exponential, NumberError> { Ok(x.clone()) };
        conversions.add(key(&metrics, "C"), key(&metrics, "K"), one);
        conversions.add(key(&metrics, "K"), key(&metrics, "[degF]"), one);
        conversions.add(key(&metrics, "[degF]"), key(&metrics, "[in_i]"), one);
        conversions.add(key(&metrics, "[in_i]"), key(&metrics, "m"), one);

        let q = quantity(&metrics, "1", "C");
        let inch = conversions.convert(&q, &metrics.parse_metric("[in_i]").unwrap());
        assert!(inch.is_ok());
        let meter = conversions.convert(&q, &metrics.parse_metric("m").unwrap());
        assert!(meter.unwrap_err().is(codes::CONVERSION_NOT_FOUND));
    }

    #[test]
    fn test_transform_errors_propagate() {
        let metrics = registry();
        let mut conversions = Conversions::new();
        conversions.add(key(&metrics, "K"), key(&metrics, "C"),
            |x| x.checked_div(&Exponential::from_i64(0)));
        let q = quantity(&metrics, "1", "K");
        let err = conversions.convert(&q, &metrics.parse_metric("C").unwrap()).unwrap_err();
        assert!(err.is(codes::DIV_ZERO));
    }

    #[test]
    fn test_registry_accessors() {
        let metrics = registry();
        let conversions = graph(&metrics);
        assert_eq!(conversions.len(), 5);
        assert!(!conversions.is_empty());
        assert!(conversions.get(&key(&metrics, "C"), &key(&metrics, "K")).is_some());
        assert!(conversions.get(&key(&metrics, "m"), &key(&metrics, "[in_i]")).is_none());
        assert_eq!(conversions.iter().count(), 5);
    }
}
