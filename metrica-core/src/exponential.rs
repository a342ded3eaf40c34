//! Measured decimal values using dashu
//!
//! Uses dashu-float (DBig) for the decimal arithmetic and records how many
//! digits of each value are significant. Exact values (defined constants,
//! prefix factors) carry no limit and never constrain a result.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use dashu_float::DBig;
use dashu_int::IBig;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error type for numeric operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberError {
    #[error("Invalid numeral: {0}")]
    Format(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Domain error: {0}")]
    Domain(String),
}

/// Working precision for intermediate results (decimal digits)
const WORK_PRECISION: usize = 50;

/// Measured values whose leading digit sits below 10^-5 render in scientific form
const MIN_PLAIN_EXPONENT: isize = -5;

/// A decimal value annotated with its significant-digit count.
///
/// `significant == None` marks an exact value.
#[derive(Debug, Clone)]
pub struct Exponential {
    inner: DBig,
    significant: Option<usize>,
}

impl Exponential {
    // ========== Construction ==========

    fn with_work_precision(val: DBig) -> DBig {
        val.with_precision(WORK_PRECISION).value()
    }

    /// Parse a measured numeral: `-?digits(.digits)?(e-?digits)?`
    ///
    /// The significant-digit count is the number of mantissa digits after
    /// leading zeros; the exponent adds no precision. `"1.2e4"` is 12000
    /// with 2 significant digits.
    pub fn parse(s: &str) -> Result<Self, NumberError> {
        if scan_numeral(s, true) != Some(s.len()) {
            return Err(NumberError::Format(s.to_string()));
        }

        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (mantissa, exponent) = match body.split_once('e') {
            Some((m, e)) => {
                let exp: isize = e.parse()
                    .map_err(|_| NumberError::Format(s.to_string()))?;
                (m, exp)
            }
            None => (body, 0),
        };
        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));

        let digits = format!("{}{}", int_part, frac_part);
        let significand: IBig = digits.parse()
            .map_err(|_| NumberError::Format(s.to_string()))?;
        let significand = if negative { -significand } else { significand };

        let scale = exponent
            .checked_sub(frac_part.len() as isize)
            .ok_or_else(|| NumberError::Format(s.to_string()))?;
        let inner = DBig::from_parts(significand, scale);

        Ok(Self {
            inner: Self::with_work_precision(inner),
            significant: Some(count_significant(int_part, frac_part)),
        })
    }

    /// Parse a defined constant with unlimited precision (e.g. `"0.0254"`)
    pub fn exact(s: &str) -> Result<Self, NumberError> {
        Ok(Self::parse(s)?.to_exact())
    }

    /// Create an exact value from an integer
    pub fn from_i64(n: i64) -> Self {
        Self { inner: Self::with_work_precision(DBig::from(n)), significant: None }
    }

    /// Create an exact value `significand * 10^exponent` (e.g. `(254, -4)` for 0.0254)
    pub fn from_parts(significand: i64, exponent: isize) -> Self {
        let inner = DBig::from_parts(IBig::from(significand), exponent);
        Self { inner: Self::with_work_precision(inner), significant: None }
    }

    /// Same value, tagged with `digits` significant digits (at least one)
    pub fn with_significant_digits(&self, digits: usize) -> Self {
        Self { inner: self.inner.clone(), significant: Some(digits.max(1)) }
    }

    /// Same value, marked exact
    pub fn to_exact(&self) -> Self {
        Self { inner: self.inner.clone(), significant: None }
    }

    // ========== Predicates ==========

    pub fn significant_digits(&self) -> Option<usize> {
        self.significant
    }

    pub fn is_exact(&self) -> bool {
        self.significant.is_none()
    }

    pub fn is_zero(&self) -> bool {
        self.inner == DBig::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.inner < DBig::ZERO
    }

    /// Compare value *and* precision
    pub fn exact_eq(&self, other: &Self) -> bool {
        self.inner == other.inner && self.significant == other.significant
    }

    // ========== Arithmetic ==========

    fn combine(&self, other: &Self, inner: DBig) -> Self {
        Self { inner, significant: min_precision(self.significant, other.significant) }
    }

    /// Safe division (returns Result, never panics)
    pub fn checked_div(&self, other: &Self) -> Result<Self, NumberError> {
        if other.is_zero() {
            return Err(NumberError::DivisionByZero);
        }
        Ok(self.combine(other, &self.inner / &other.inner))
    }

    /// Integer power; keeps this value's precision
    pub fn pow(&self, exp: i32) -> Result<Self, NumberError> {
        let one = Self::from_i64(1);
        let mut acc = one.inner.clone();
        let mut base = self.inner.clone();
        let mut remaining = exp.unsigned_abs();
        // square-and-multiply
        while remaining > 0 {
            if remaining & 1 == 1 {
                acc = &acc * &base;
            }
            base = &base * &base;
            remaining >>= 1;
        }
        let result = Self { inner: acc, significant: None };

        let result = if exp < 0 {
            if self.is_zero() {
                return Err(NumberError::Domain(
                    "zero raised to a negative power".to_string()
                ));
            }
            one.checked_div(&result)?
        } else {
            result
        };

        Ok(Self { inner: result.inner, significant: self.significant })
    }

    // ========== Display ==========

    /// Render exactly `digits` significant digits
    fn render_measured(&self, digits: usize) -> String {
        let rounded = self.inner.clone().with_precision(digits).value();
        let Some((negative, kept, exponent)) = decimal_parts(&rounded) else {
            return if digits == 1 {
                "0".to_string()
            } else {
                format!("0.{}", "0".repeat(digits - 1))
            };
        };

        let padded = format!("{:0<width$}", kept, width = digits);
        // power of ten of the last and the first rendered digit
        let last = exponent - (digits - kept.len()) as isize;
        let first = last + digits as isize - 1;
        let sign = if negative { "-" } else { "" };

        if first >= digits as isize || first < MIN_PLAIN_EXPONENT {
            let (head, tail) = padded.split_at(1);
            if tail.is_empty() {
                format!("{}{}e{}", sign, head, first)
            } else {
                format!("{}{}.{}e{}", sign, head, tail, first)
            }
        } else if last >= 0 {
            format!("{}{}", sign, padded)
        } else {
            format!("{}{}", sign, place_point(&padded, (-last) as usize))
        }
    }

    /// Render every digit of an exact value
    fn render_exact(&self) -> String {
        let Some((negative, digits, exponent)) = decimal_parts(&self.inner) else {
            return "0".to_string();
        };
        let sign = if negative { "-" } else { "" };

        if exponent >= 0 {
            format!("{}{}{}", sign, digits, "0".repeat(exponent as usize))
        } else {
            format!("{}{}", sign, place_point(&digits, (-exponent) as usize))
        }
    }
}

/// Scan the longest numeral at the start of `input` and return its byte length.
///
/// With `signed_exponent` the exponent may carry a leading `-`. A dangling
/// `e` or `.` that is not followed by digits is not consumed.
pub fn scan_numeral(input: &str, signed_exponent: bool) -> Option<usize> {
    let bytes = input.as_bytes();
    let digits_from = |mut pos: usize| {
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        pos
    };

    let mut pos = if bytes.first() == Some(&b'-') { 1 } else { 0 };
    let int_end = digits_from(pos);
    if int_end == pos {
        return None;
    }
    pos = int_end;

    if bytes.get(pos) == Some(&b'.') {
        let frac_end = digits_from(pos + 1);
        if frac_end > pos + 1 {
            pos = frac_end;
        }
    }

    if bytes.get(pos) == Some(&b'e') {
        let mut start = pos + 1;
        if signed_exponent && bytes.get(start) == Some(&b'-') {
            start += 1;
        }
        let exp_end = digits_from(start);
        if exp_end > start {
            pos = exp_end;
        }
    }

    Some(pos)
}

fn count_significant(int_part: &str, frac_part: &str) -> usize {
    let count = int_part.chars()
        .chain(frac_part.chars())
        .skip_while(|&c| c == '0')
        .count();
    if count == 0 { frac_part.len().max(1) } else { count }
}

fn min_precision(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

/// Split a value into (negative, digits without trailing zeros, exponent of the last digit).
/// Returns None for zero.
fn decimal_parts(value: &DBig) -> Option<(bool, String, isize)> {
    let (significand, exponent) = value.clone().into_repr().into_parts();
    let negative = significand < IBig::ZERO;
    let text = significand.to_string();
    let digits = text.trim_start_matches('-');
    let kept = digits.trim_end_matches('0');
    if kept.is_empty() {
        return None;
    }
    let exponent = exponent + (digits.len() - kept.len()) as isize;
    Some((negative, kept.to_string(), exponent))
}

/// Insert a decimal point `fraction` digits from the right, padding with zeros
fn place_point(digits: &str, fraction: usize) -> String {
    if fraction >= digits.len() {
        format!("0.{}{}", "0".repeat(fraction - digits.len()), digits)
    } else {
        let (int, frac) = digits.split_at(digits.len() - fraction);
        format!("{}.{}", int, frac)
    }
}

// ========== Operator Implementations ==========

impl<'a> Add<&'a Exponential> for &'a Exponential {
    type Output = Exponential;

    fn add(self, rhs: &'a Exponential) -> Exponential {
        self.combine(rhs, &self.inner + &rhs.inner)
    }
}

impl Add for Exponential {
    type Output = Exponential;

    fn add(self, rhs: Exponential) -> Exponential {
        &self + &rhs
    }
}

impl<'a> Sub<&'a Exponential> for &'a Exponential {
    type Output = Exponential;

    fn sub(self, rhs: &'a Exponential) -> Exponential {
        self.combine(rhs, &self.inner - &rhs.inner)
    }
}

impl Sub for Exponential {
    type Output = Exponential;

    fn sub(self, rhs: Exponential) -> Exponential {
        &self - &rhs
    }
}

impl<'a> Mul<&'a Exponential> for &'a Exponential {
    type Output = Exponential;

    fn mul(self, rhs: &'a Exponential) -> Exponential {
        self.combine(rhs, &self.inner * &rhs.inner)
    }
}

impl Mul for Exponential {
    type Output = Exponential;

    fn mul(self, rhs: Exponential) -> Exponential {
        &self * &rhs
    }
}

impl Neg for &Exponential {
    type Output = Exponential;

    fn neg(self) -> Exponential {
        Exponential { inner: -self.inner.clone(), significant: self.significant }
    }
}

impl Neg for Exponential {
    type Output = Exponential;

    fn neg(self) -> Exponential {
        -&self
    }
}

// ========== Trait Implementations ==========

impl fmt::Display for Exponential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.significant {
            Some(digits) => write!(f, "{}", self.render_measured(digits)),
            None => write!(f, "{}", self.render_exact()),
        }
    }
}

impl std::str::FromStr for Exponential {
    type Err = NumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Exponential {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Exponential {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl PartialEq for Exponential {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl Eq for Exponential {}

impl PartialOrd for Exponential {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Exponential {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.partial_cmp(&other.inner).unwrap_or(Ordering::Equal)
    }
}
