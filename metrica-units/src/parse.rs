//! Expression scanning
//!
//! Splits unit expressions like "kg.m/s2" into operator-tagged terms, splits
//! a term's trailing exponent, and splits a quantity expression like
//! "1.2e4kg.m/s2" into its numeral and unit expression.

use metrica_core::{MetricaError, scan_numeral};

/// Operator preceding a term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Multiply,
    Divide,
}

/// Split a unit expression on '.' and '/', keeping the operator before each term.
/// The first term is implicitly multiplied.
pub fn split_terms(expression: &str) -> Result<Vec<(Op, &str)>, MetricaError> {
    let mut terms = Vec::new();
    let mut op = Op::Multiply;
    let mut start = 0;

    for (i, c) in expression.char_indices() {
        let next = match c {
            '.' => Op::Multiply,
            '/' => Op::Divide,
            _ => continue,
        };
        terms.push((op, term_at(expression, start, i)?));
        op = next;
        start = i + c.len_utf8();
    }
    terms.push((op, term_at(expression, start, expression.len())?));

    Ok(terms)
}

fn term_at(expression: &str, start: usize, end: usize) -> Result<&str, MetricaError> {
    let term = &expression[start..end];
    if term.is_empty() {
        return Err(MetricaError::argument_error(
            format!("Empty unit term at position {} in '{}'", start, expression))
            .with_expression(expression));
    }
    Ok(term)
}

/// Split a trailing `-?digits` exponent off a term.
///
/// Returns None when the term has no exponent or when nothing would remain
/// before it.
pub fn split_exponent(term: &str) -> Option<(&str, &str)> {
    let digits_start = term.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits_start == term.len() {
        return None;
    }
    let start = if term[..digits_start].ends_with('-') { digits_start - 1 } else { digits_start };
    if start == 0 {
        return None;
    }
    Some(term.split_at(start))
}

/// Split "1.2e4kg.m/s2" into ("1.2e4", "kg.m/s2").
///
/// The numeral follows `-?digits(.digits)?(e-?digits)?`, so every rendered
/// quantity value reads back; the remainder is the unit expression (possibly
/// empty).
pub fn split_quantity(expression: &str) -> Result<(&str, &str), MetricaError> {
    let end = scan_numeral(expression, true).ok_or_else(|| {
        MetricaError::argument_error(
            format!("Expression cannot be parsed as a quantity: '{}'", expression))
            .with_expression(expression)
            .with_suggestion("Start the expression with a number, e.g. 1.2e4kg.m/s2")
    })?;
    Ok(expression.split_at(end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrica_core::codes;

    #[test]
    fn test_split_terms() {
        let terms = split_terms("kg.m/s2").unwrap();
        assert_eq!(terms, vec![
            (Op::Multiply, "kg"),
            (Op::Multiply, "m"),
            (Op::Divide, "s2"),
        ]);
    }

    #[test]
    fn test_split_terms_single() {
        assert_eq!(split_terms("[in_i]").unwrap(), vec![(Op::Multiply, "[in_i]")]);
    }

    #[test]
    fn test_split_terms_rejects_empty_terms() {
        for bad in ["m..s", "/s", "m/", "."] {
            let err = split_terms(bad).unwrap_err();
            assert!(err.is(codes::ARGUMENT_ERROR), "{}", bad);
        }
    }

    #[test]
    fn test_split_exponent() {
        assert_eq!(split_exponent("s2"), Some(("s", "2")));
        assert_eq!(split_exponent("s-2"), Some(("s", "-2")));
        assert_eq!(split_exponent("km12"), Some(("km", "12")));
        assert_eq!(split_exponent("m"), None);
        assert_eq!(split_exponent("42"), None);
        assert_eq!(split_exponent("-1"), None);
    }

    #[test]
    fn test_split_quantity() {
        assert_eq!(split_quantity("1.2e4kg.m/s2").unwrap(), ("1.2e4", "kg.m/s2"));
        assert_eq!(split_quantity("-40[degF]").unwrap(), ("-40", "[degF]"));
        assert_eq!(split_quantity("5").unwrap(), ("5", ""));
        assert_eq!(split_quantity("5 banana").unwrap(), ("5", " banana"));
        assert_eq!(split_quantity("3e-7m").unwrap(), ("3e-7", "m"));
        assert_eq!(split_quantity("2e-m").unwrap(), ("2", "e-m"));
    }

    #[test]
    fn test_split_quantity_requires_numeral() {
        let err = split_quantity("kg").unwrap_err();
        assert!(err.is(codes::ARGUMENT_ERROR));
        assert_eq!(err.expression(), Some("kg"));
    }
}
