//! Metrica Core - Fundamental types
//!
//! This crate provides the core types used throughout Metrica:
//! - `Exponential`: Decimal values that track significant digits
//! - `MetricaError`: Structured errors with machine-readable codes

mod exponential;
mod error;

pub use exponential::{Exponential, NumberError, scan_numeral};
pub use error::{MetricaError, ErrorContext, codes};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Exponential, MetricaError, NumberError};
    pub use crate::error::codes;
}
