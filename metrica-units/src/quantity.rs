//! Quantity type - a measured value with an associated metric

use std::fmt;
use serde::Serialize;
use metrica_core::{Exponential, MetricaError};
use crate::Metric;

/// A measured value: a numeric value with its composite unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quantity {
    /// The numeric value
    pub value: Exponential,
    /// The unit of measurement
    pub metric: Metric,
}

impl Quantity {
    pub fn new(value: Exponential, metric: Metric) -> Self {
        Quantity { value, metric }
    }

    /// Create a dimensionless quantity (pure number)
    pub fn dimensionless(value: Exponential) -> Self {
        Quantity::new(value, Metric::dimensionless())
    }

    pub fn is_dimensionless(&self) -> bool {
        self.metric.is_dimensionless()
    }

    /// Same value, same precision and the same metric term-for-term
    pub fn exact_eq(&self, other: &Quantity) -> bool {
        self.value.exact_eq(&other.value) && self.metric == other.metric
    }

    /// Multiply two quantities (metrics are multiplied)
    pub fn mul(&self, other: &Quantity) -> Quantity {
        Quantity::new(&self.value * &other.value, self.metric.multiply(&other.metric))
    }

    /// Divide two quantities (metrics are divided)
    pub fn checked_div(&self, other: &Quantity) -> Result<Quantity, MetricaError> {
        let value = self.value.checked_div(&other.value)?;
        Ok(Quantity::new(value, self.metric.divide(&other.metric)?))
    }

    /// Raise quantity to an integer power
    pub fn pow(&self, exp: i32) -> Result<Quantity, MetricaError> {
        Ok(Quantity::new(self.value.pow(exp)?, self.metric.power(exp)?))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.metric)
    }
}
