//! Prefix and unit definitions

use std::fmt;
use serde::Serialize;
use metrica_core::Exponential;

/// A named scale factor, e.g. kilo (`k`, 1e3)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prefix {
    /// The prefix name (e.g., "kilo")
    pub name: String,
    /// The prefix symbol (e.g., "k")
    pub symbol: String,
    /// Scale applied to the unit it precedes
    pub factor: Exponential,
}

impl Prefix {
    pub fn new(name: &str, symbol: &str, factor: Exponential) -> Self {
        Prefix {
            name: name.to_string(),
            symbol: symbol.to_string(),
            factor,
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// A named unit, optionally tagged with the physical dimension it measures
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Unit {
    /// The unit name (e.g., "meter")
    pub name: String,
    /// The unit symbol (e.g., "m")
    pub symbol: String,
    /// Dimension tag grouping comparable units (e.g., "Temperature")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
}

impl Unit {
    pub fn new(name: &str, symbol: &str, dimension: Option<&str>) -> Self {
        Unit {
            name: name.to_string(),
            symbol: symbol.to_string(),
            dimension: dimension.map(str::to_string),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}
