//! Structured errors
//!
//! Every failure of the engine is returned to the caller as a value carrying
//! a machine-readable code, a message and, where useful, the expression and
//! symbol that caused it.

use crate::NumberError;
use serde::{Deserialize, Serialize};

/// Standard error codes (machine-readable)
pub mod codes {
    pub const FORMAT_ERROR: &str = "FORMAT_ERROR";
    pub const LOOKUP_ERROR: &str = "LOOKUP_ERROR";
    pub const CONVERSION_NOT_FOUND: &str = "CONVERSION_NOT_FOUND";
    pub const ARGUMENT_ERROR: &str = "ARGUMENT_ERROR";
    pub const DIV_ZERO: &str = "DIV_ZERO";
    pub const DOMAIN_ERROR: &str = "DOMAIN_ERROR";
    pub const CATALOG_ERROR: &str = "CATALOG_ERROR";
}

/// Where an error occurred
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Full expression being parsed or converted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,

    /// Offending symbol or substring
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub notes: Vec<String>,
}

/// Structured error returned by every fallible operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricaError {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Suggestion for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,
}

impl MetricaError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            suggestion: None,
            context: None,
        }
    }

    /// Builder: add suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Builder: set the expression being processed
    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::default);
        ctx.expression = Some(expression.into());
        self
    }

    /// Builder: set the offending symbol
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::default);
        ctx.symbol = Some(symbol.into());
        self
    }

    /// Builder: add a note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::default);
        ctx.notes.push(note.into());
        self
    }

    /// Check the error code
    pub fn is(&self, code: &str) -> bool {
        self.code == code
    }

    /// The offending symbol, if recorded
    pub fn symbol(&self) -> Option<&str> {
        self.context.as_ref().and_then(|c| c.symbol.as_deref())
    }

    /// The expression, if recorded
    pub fn expression(&self) -> Option<&str> {
        self.context.as_ref().and_then(|c| c.expression.as_deref())
    }

    // ========== Common Error Constructors ==========

    pub fn format_error(numeral: &str) -> Self {
        Self::new(codes::FORMAT_ERROR, format!("Malformed numeral: '{}'", numeral))
            .with_symbol(numeral)
            .with_suggestion("Write numerals as -?digits(.digits)?(e digits)?")
    }

    pub fn lookup_error(symbol: &str, expression: &str) -> Self {
        Self::new(codes::LOOKUP_ERROR,
            format!("Unknown unit symbol '{}' in '{}'", symbol, expression))
            .with_symbol(symbol)
            .with_expression(expression)
            .with_suggestion("Register the unit or prefix before parsing")
    }

    pub fn conversion_not_found(from: &str, to: &str) -> Self {
        Self::new(codes::CONVERSION_NOT_FOUND,
            format!("No conversion from '{}' to '{}'", from, to))
            .with_expression(format!("{} -> {}", from, to))
            .with_suggestion("Register a conversion between the units or their dimensions")
    }

    pub fn argument_error(details: impl Into<String>) -> Self {
        Self::new(codes::ARGUMENT_ERROR, details)
    }

    pub fn div_zero() -> Self {
        Self::new(codes::DIV_ZERO, "Division by zero")
    }

    pub fn domain_error(details: impl Into<String>) -> Self {
        Self::new(codes::DOMAIN_ERROR, format!("Domain error: {}", details.into()))
    }

    pub fn catalog_error(details: impl Into<String>) -> Self {
        Self::new(codes::CATALOG_ERROR, format!("Catalog error: {}", details.into()))
    }
}

impl std::fmt::Display for MetricaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " (suggestion: {})", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for MetricaError {}

impl From<NumberError> for MetricaError {
    fn from(err: NumberError) -> Self {
        match err {
            NumberError::Format(s) => Self::format_error(&s),
            NumberError::DivisionByZero => Self::div_zero(),
            NumberError::Domain(s) => Self::domain_error(s),
        }
    }
}
