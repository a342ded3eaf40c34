//! Metrica Units - Measured Quantities and Unit Conversion
//!
//! Parses quantities such as `1.2e4kg.m/s2` against a registry of prefixes
//! and units, and converts them through a graph of registered transforms.
//!
//! Building blocks:
//! - `Prefix`, `Unit` - registered symbols
//! - `Metric` - product of prefixed units raised to integer powers
//! - `Quantity` - a measured value with its metric
//! - `Metrics` - the symbol registry and unit-expression parser
//! - `Conversions` - directed transforms between metrics or dimensions
//! - `SystemOfUnits` - the facade tying them together
//!
//! `systems::METRIC` holds a shared default system; `Catalog` loads
//! additional definitions from JSON.

mod unit;
mod metric;
mod metrics;
mod parse;
mod quantity;
mod conversion;
mod system;
mod catalog;
pub mod systems;

pub use unit::{Prefix, Unit};
pub use metric::{Metric, Term};
pub use metrics::Metrics;
pub use quantity::Quantity;
pub use conversion::{Conversion, ConversionKey, Conversions, Transform, MAX_CONVERSION_HOPS};
pub use system::SystemOfUnits;
pub use catalog::{Catalog, LinearConversionDef, PrefixDef, UnitDef};
pub use parse::split_quantity;
pub use systems::METRIC;
