//! Metrica command-line front end
//!
//! Commands:
//! - parse: Parse a quantity such as "1.2e4kg.m/s2"
//! - metric: Parse a unit expression and show its terms
//! - base: Fold prefixes into the value
//! - convert: Convert a quantity to another unit expression
//! - units: List registered prefixes and units
//!
//! Output is JSON on stdout. Errors are printed as JSON on stderr with a
//! non-zero exit status.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use tracing::Level;
use metrica_core::MetricaError;
use metrica_units::{systems, Catalog, Metric, Prefix, Quantity, SystemOfUnits, Unit};

#[derive(Parser)]
#[command(name = "metrica")]
#[command(about = "Parse and convert measured quantities", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON catalog loaded on top of the default system (default: $METRICA_CATALOG)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a quantity
    Parse {
        /// Quantity expression (e.g., "1.2e4kg.m/s2")
        expression: String,
    },

    /// Parse a unit expression
    Metric {
        /// Unit expression (e.g., "kg.m/s2")
        expression: String,
    },

    /// Fold prefixes into the value
    Base {
        /// Quantity expression (e.g., "5km")
        expression: String,
    },

    /// Convert a quantity
    Convert {
        /// Quantity expression (e.g., "0C")
        expression: String,

        /// Target unit expression (e.g., "K")
        target: String,
    },

    /// List registered prefixes and units
    Units,
}

#[derive(Serialize)]
struct QuantityReport<'a> {
    value: String,
    /// Every digit of the value, ignoring its precision
    exact_value: String,
    metric: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    significant_digits: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    input: Option<&'a str>,
}

impl<'a> QuantityReport<'a> {
    fn new(quantity: &Quantity, input: Option<&'a str>) -> Self {
        QuantityReport {
            value: quantity.value.to_string(),
            exact_value: quantity.value.to_exact().to_string(),
            metric: quantity.metric.to_string(),
            significant_digits: quantity.value.significant_digits(),
            input,
        }
    }
}

/// Log level from --verbose, then $METRICA_LOG, then warn
fn log_level(verbose: bool) -> Level {
    if verbose {
        return Level::DEBUG;
    }
    env::var("METRICA_LOG")
        .ok()
        .and_then(|level| Level::from_str(level.trim()).ok())
        .unwrap_or(Level::WARN)
}

fn catalog_path(cli: &Cli) -> Option<PathBuf> {
    cli.catalog.clone().or_else(|| env::var("METRICA_CATALOG").ok().map(PathBuf::from))
}

fn load_catalog(path: &Path) -> Result<Catalog, MetricaError> {
    let text = fs::read_to_string(path).map_err(|e| {
        MetricaError::catalog_error(format!("cannot read '{}': {}", path.display(), e))
    })?;
    Catalog::from_json(&text).map_err(|e| e.with_note(format!("in {}", path.display())))
}

/// Default system plus the optional catalog
fn load_system(catalog: Option<&Path>) -> Result<SystemOfUnits, MetricaError> {
    let mut system = systems::metric()?;
    if let Some(path) = catalog {
        load_catalog(path)?.apply(&mut system)?;
        tracing::info!(path = %path.display(), "loaded catalog");
    }
    Ok(system)
}

fn describe_metric(metric: &Metric) -> JsonValue {
    let terms: Vec<JsonValue> = metric.terms().iter().map(|term| json!({
        "prefix": term.prefix.as_ref().map(|p| p.symbol.as_str()),
        "unit": term.unit.symbol,
        "exponent": term.exponent,
    })).collect();

    json!({
        "metric": metric.to_string(),
        "terms": terms,
        "exponents": metric.exponents(),
        "dimension": metric.dimension(),
        "dimensionless": metric.is_dimensionless(),
    })
}

fn run(system: &SystemOfUnits, command: &Commands) -> Result<JsonValue, MetricaError> {
    let report = match command {
        Commands::Parse { expression } => {
            let quantity = system.quantity(expression)?;
            json!(QuantityReport::new(&quantity, None))
        }
        Commands::Metric { expression } => describe_metric(&system.metric(expression)?),
        Commands::Base { expression } => {
            let base = system.to_base_expr(expression)?;
            json!(QuantityReport::new(&base, Some(expression.as_str())))
        }
        Commands::Convert { expression, target } => {
            let converted = system.convert_expr(expression, target)?;
            json!(QuantityReport::new(&converted, Some(expression.as_str())))
        }
        Commands::Units => {
            let metrics = system.metrics();
            let prefixes: Vec<&Prefix> = metrics.prefixes().into_iter().map(|p| p.as_ref()).collect();
            let units: Vec<&Unit> = metrics.units().into_iter().map(|u| u.as_ref()).collect();
            json!({ "prefixes": prefixes, "units": units })
        }
    };
    Ok(report)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(log_level(cli.verbose))
        .with_writer(std::io::stderr)
        .init();

    let result = load_system(catalog_path(&cli).as_deref())
        .and_then(|system| run(&system, &cli.command));

    match result {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::debug!(code = %err.code, "command failed");
            let body = json!({ "error": err });
            eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_else(|_| err.to_string()));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrica_core::codes;

    fn exec(args: &[&str]) -> Result<JsonValue, MetricaError> {
        let cli = Cli::parse_from(std::iter::once("metrica").chain(args.iter().copied()));
        let system = load_system(cli.catalog.as_deref())?;
        run(&system, &cli.command)
    }

    #[test]
    fn test_parse() {
        let report = exec(&["parse", "1.2e4kg.m/s2"]).unwrap();
        assert_eq!(report["value"], "1.2e4");
        assert_eq!(report["metric"], "kg.m.s-2");
        assert_eq!(report["significant_digits"], 2);
    }

    #[test]
    fn test_metric() {
        let report = exec(&["metric", "kg.m/s2"]).unwrap();
        assert_eq!(report["terms"][0]["prefix"], "k");
        assert_eq!(report["exponents"]["s"], -2);
        assert_eq!(report["dimensionless"], false);
    }

    #[test]
    fn test_base() {
        let report = exec(&["base", "5.0km"]).unwrap();
        assert_eq!(report["value"], "5.0e3");
        assert_eq!(report["metric"], "m");
        assert_eq!(report["input"], "5.0km");
    }

    #[test]
    fn test_convert() {
        let report = exec(&["convert", "0C", "K"]).unwrap();
        assert_eq!(report["metric"], "K");
        assert_eq!(report["exact_value"], "273.15");
        assert_eq!(report["significant_digits"], 1);
        assert_eq!(report["input"], "0C");
    }

    #[test]
    fn test_convert_prefixed_force() {
        let report = exec(&["convert", "3kN", "kg.m/s2"]).unwrap();
        assert_eq!(report["exact_value"], "3000");
        assert_eq!(report["metric"], "kg.m.s-2");
    }

    #[test]
    fn test_units() {
        let report = exec(&["units"]).unwrap();
        assert!(report["units"].as_array().unwrap().iter().any(|u| u["symbol"] == "[degF]"));
        assert_eq!(report["prefixes"].as_array().unwrap().len(), 9);
    }

    #[test]
    fn test_errors_carry_codes() {
        let err = exec(&["convert", "1m", "K"]).unwrap_err();
        assert!(err.is(codes::CONVERSION_NOT_FOUND));

        let err = exec(&["parse", "5 banana"]).unwrap_err();
        assert!(err.is(codes::LOOKUP_ERROR));
    }

    #[test]
    fn test_catalog_flag() {
        let path = env::temp_dir().join(format!("metrica-cli-test-{}.json", std::process::id()));
        fs::write(&path, r#"{
            "units": [{"name": "foot", "symbol": "[ft_i]", "dimension": "Length"}],
            "conversions": [{"from": "[ft_i]", "to": "m", "factor": "0.3048"}]
        }"#).unwrap();

        let report = exec(&["--catalog", path.to_str().unwrap(), "convert", "10.00[ft_i]", "m"]);
        fs::remove_file(&path).unwrap();
        assert_eq!(report.unwrap()["value"], "3.048");
    }

    #[test]
    fn test_missing_catalog() {
        let err = exec(&["--catalog", "/nonexistent/metrica.json", "units"]).unwrap_err();
        assert!(err.is(codes::CATALOG_ERROR));
    }

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(true), Level::DEBUG);
    }
}
