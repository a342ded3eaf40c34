//! JSON unit catalogs
//!
//! A catalog describes prefixes, units and linear conversions as data:
//!
//! ```json
//! {
//!   "prefixes": [{"name": "kilo", "symbol": "k", "factor": "1e3"}],
//!   "units": [{"name": "foot", "symbol": "[ft_i]", "dimension": "Length"}],
//!   "conversions": [{"from": "[ft_i]", "to": "m", "factor": "0.3048"}]
//! }
//! ```
//!
//! Factors and offsets are strings parsed as exact values.

use serde::{Deserialize, Serialize};
use metrica_core::{Exponential, MetricaError};
use crate::SystemOfUnits;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub prefixes: Vec<PrefixDef>,
    #[serde(default)]
    pub units: Vec<UnitDef>,
    #[serde(default)]
    pub conversions: Vec<LinearConversionDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrefixDef {
    pub name: String,
    pub symbol: String,
    pub factor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDef {
    pub name: String,
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
}

/// `to = from * factor + offset`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConversionDef {
    pub from: String,
    pub to: String,
    pub factor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
}

impl Catalog {
    pub fn from_json(json: &str) -> Result<Self, MetricaError> {
        serde_json::from_str(json).map_err(|e| {
            MetricaError::catalog_error(e.to_string())
                .with_note(format!("line {}, column {}", e.line(), e.column()))
        })
    }

    /// Register every entry with a system, prefixes and units first so
    /// conversions can refer to them
    pub fn apply(&self, system: &mut SystemOfUnits) -> Result<(), MetricaError> {
        for def in &self.prefixes {
            let factor = constant(&def.factor, &def.symbol)?;
            system.add_prefix(&def.name, &def.symbol, factor);
        }
        for def in &self.units {
            system.add_unit(&def.name, &def.symbol, def.dimension.as_deref());
        }
        for def in &self.conversions {
            let label = format!("{} -> {}", def.from, def.to);
            let factor = constant(&def.factor, &label)?;
            let offset = match &def.offset {
                Some(offset) => constant(offset, &label)?,
                None => Exponential::from_i64(0),
            };
            system.add_conversion(&def.from, &def.to, move |x| Ok(&(x * &factor) + &offset))
                .map_err(|e| e.with_note(format!("in catalog conversion {}", label)))?;
        }

        tracing::debug!(
            prefixes = self.prefixes.len(),
            units = self.units.len(),
            conversions = self.conversions.len(),
            "applied catalog"
        );
        Ok(())
    }
}

fn constant(text: &str, entry: &str) -> Result<Exponential, MetricaError> {
    Exponential::exact(text).map_err(|e| {
        MetricaError::catalog_error(format!("invalid constant '{}' for '{}': {}", text, entry, e))
            .with_symbol(text)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrica_core::codes;

    const FEET: &str = r#"{
        "prefixes": [{"name": "kilo", "symbol": "k", "factor": "1e3"}],
        "units": [
            {"name": "meter", "symbol": "m", "dimension": "Length"},
            {"name": "foot", "symbol": "[ft_i]", "dimension": "Length"},
            {"name": "kelvin", "symbol": "K", "dimension": "Temperature"},
            {"name": "rankine", "symbol": "[degR]", "dimension": "Temperature"},
            {"name": "celsius", "symbol": "C", "dimension": "Temperature"}
        ],
        "conversions": [
            {"from": "[ft_i]", "to": "m", "factor": "0.3048"},
            {"from": "Temperature", "to": "[degR]", "factor": "1.8"},
            {"from": "C", "to": "K", "factor": "1", "offset": "273.15"}
        ]
    }"#;

    #[test]
    fn test_from_json() {
        let catalog = Catalog::from_json(FEET).unwrap();
        assert_eq!(catalog.prefixes.len(), 1);
        assert_eq!(catalog.units[1].dimension.as_deref(), Some("Length"));
        assert_eq!(catalog.conversions[2].offset.as_deref(), Some("273.15"));
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let catalog = Catalog::from_json(r#"{"units": [{"name": "meter", "symbol": "m"}]}"#).unwrap();
        assert!(catalog.prefixes.is_empty());
        assert!(catalog.conversions.is_empty());
        assert_eq!(catalog.units[0].dimension, None);
    }

    #[test]
    fn test_apply() {
        let system = SystemOfUnits::from_catalog(&Catalog::from_json(FEET).unwrap()).unwrap();
        let m = system.convert_expr("10[ft_i]", "km").unwrap();
        assert_eq!(m.value, Exponential::exact("0.003048").unwrap());

        let r = system.convert_expr("100K", "[degR]").unwrap();
        assert_eq!(r.value, Exponential::from_i64(180));

        let k = system.convert_expr("0C", "K").unwrap();
        assert_eq!(k.value, Exponential::exact("273.15").unwrap());
    }

    #[test]
    fn test_factors_are_exact() {
        let system = SystemOfUnits::from_catalog(&Catalog::from_json(FEET).unwrap()).unwrap();
        assert!(system.metrics().prefix("k").unwrap().factor.is_exact());
    }

    #[test]
    fn test_malformed_json() {
        let err = Catalog::from_json("{\"units\": [").unwrap_err();
        assert!(err.is(codes::CATALOG_ERROR));
    }

    #[test]
    fn test_bad_factor() {
        let catalog = Catalog::from_json(
            r#"{"prefixes": [{"name": "kilo", "symbol": "k", "factor": "one thousand"}]}"#).unwrap();
        let err = SystemOfUnits::from_catalog(&catalog).unwrap_err();
        assert!(err.is(codes::CATALOG_ERROR));
        assert_eq!(err.symbol(), Some("one thousand"));
    }

    #[test]
    fn test_unknown_unit_in_conversion() {
        let catalog = Catalog::from_json(
            r#"{"conversions": [{"from": "[ft_i]", "to": "m", "factor": "0.3048"}]}"#).unwrap();
        let err = SystemOfUnits::from_catalog(&catalog).unwrap_err();
        assert!(err.is(codes::LOOKUP_ERROR));
    }

    #[test]
    fn test_apply_on_top_of_default_system() {
        let mut system = crate::systems::metric().unwrap();
        let catalog = Catalog::from_json(
            r#"{"units": [{"name": "foot", "symbol": "[ft_i]", "dimension": "Length"}],
                "conversions": [{"from": "[ft_i]", "to": "[in_i]", "factor": "12"}]}"#).unwrap();
        catalog.apply(&mut system).unwrap();

        // [ft_i] -> [in_i] -> m
        let m = system.convert_expr("1[ft_i]", "m").unwrap();
        assert_eq!(m.value, Exponential::exact("0.3048").unwrap());
    }
}
