//! Built-in systems of units

use std::sync::LazyLock;
use metrica_core::{Exponential, MetricaError};
use crate::SystemOfUnits;

/// Shared default system, built on first use
pub static METRIC: LazyLock<SystemOfUnits> =
    LazyLock::new(|| metric().expect("built-in metric system is well formed"));

const PREFIXES: &[(&str, &str, isize)] = &[
    ("micro", "µ", -6),
    ("milli", "m", -3),
    ("centi", "c", -2),
    ("deci", "d", -1),
    ("deka", "da", 1),
    ("hecto", "h", 2),
    ("kilo", "k", 3),
    ("mega", "M", 6),
    ("giga", "G", 9),
];

const UNITS: &[(&str, &str, &str)] = &[
    ("meter", "m", "Length"),
    ("inch", "[in_i]", "Length"),
    ("gram", "g", "Mass"),
    ("pound", "[lb_av]", "Mass"),
    ("second", "s", "Time"),
    ("kelvin", "K", "Temperature"),
    ("degree Celsius", "C", "Temperature"),
    ("degree Fahrenheit", "[degF]", "Temperature"),
    ("liter", "l", "Volume"),
    ("newton", "N", "Force"),
];

/// A small SI catalog with a few customary units
pub fn metric() -> Result<SystemOfUnits, MetricaError> {
    let mut system = SystemOfUnits::new();

    for &(name, symbol, exponent) in PREFIXES {
        system.add_prefix(name, symbol, Exponential::from_parts(1, exponent));
    }
    for &(name, symbol, dimension) in UNITS {
        system.add_unit(name, symbol, Some(dimension));
    }

    let zero_celsius = Exponential::from_parts(27315, -2);
    let fahrenheit_degree = Exponential::from_parts(18, -1);
    let fahrenheit_zero = Exponential::from_i64(32);

    let offset = zero_celsius.clone();
    system.add_conversion("K", "C", move |x| Ok(x - &offset))?;
    let offset = zero_celsius.clone();
    system.add_conversion("C", "K", move |x| Ok(x + &offset))?;

    let (scale, zero) = (fahrenheit_degree.clone(), fahrenheit_zero.clone());
    system.add_conversion("C", "[degF]", move |x| Ok(&(x * &scale) + &zero))?;

    // Any other temperature reaches [degF] from kelvin
    let (offset, scale, zero) = (zero_celsius.clone(), fahrenheit_degree.clone(), fahrenheit_zero.clone());
    system.add_conversion("Temperature", "[degF]", move |x| {
        Ok(&(&(x - &offset) * &scale) + &zero)
    })?;

    let (offset, scale, zero) = (zero_celsius, fahrenheit_degree, fahrenheit_zero);
    system.add_conversion("[degF]", "K", move |x| {
        Ok(&(x - &zero).checked_div(&scale)? + &offset)
    })?;

    let inch = Exponential::from_parts(254, -4);
    system.add_conversion("[in_i]", "m", move |x| Ok(x * &inch))?;

    let pound = Exponential::from_parts(45359237, -5);
    system.add_conversion("[lb_av]", "g", move |x| Ok(x * &pound))?;

    system.add_conversion("N", "kg.m/s2", |x| Ok(x.clone()))?;

    let liter = Exponential::from_parts(1, -3);
    system.add_conversion("Volume", "m3", move |x| Ok(x * &liter))?;

    Ok(system)
}
