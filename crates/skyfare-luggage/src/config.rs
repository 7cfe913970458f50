//! Configuration loading for the skyfare binaries.
//!
//! Every section is optional; a missing file section falls back to the built-in defaults.
//!
//! ```toml
//! [logging]
//! level = "debug"
//! format = "json"
//!
//! [server]
//! port = 8080
//!
//! [solver]
//! max_iterations = 500
//!
//! [selection]
//! strategy = "exact"
//!
//! [fares.ECONOMY]
//! standard_limit = 23.0
//! base_price = 12000.0
//! excess_charge_per_kg = 1500.0
//! max_pieces = 2
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use skyfare_solver::Solver;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt};

use crate::fare::{FareTable, LuggageCalculator, TravelClass};
use crate::selection::{DEFAULT_EXCESS_RATE_PER_KG, SelectionStrategy};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub fares: FareTable,
}

impl Config {
    /// Load from a TOML file, then apply environment overrides (`PORT`)
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let mut config = Self::parse_toml(&content)?;
        config.apply_port_override(std::env::var("PORT").ok())?;
        Ok(config)
    }

    /// Load `path` when given, otherwise start from the defaults; `PORT` applies either way
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let mut config = Self::default();
                config.apply_port_override(std::env::var("PORT").ok())?;
                Ok(config)
            }
        }
    }

    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_port_override(&mut self, port: Option<String>) -> Result<(), ConfigError> {
        if let Some(raw) = port {
            self.server.port = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: "PORT".into(),
                reason: format!("'{raw}' is not a valid port"),
            })?;
        }
        Ok(())
    }

    pub fn init_logging(&self) {
        self.logging.init();
    }

    pub fn calculator(&self) -> LuggageCalculator {
        LuggageCalculator::new(self.fares.clone())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let tolerance = self.solver.tolerance;
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(invalid("solver.tolerance", "must be a positive number"));
        }
        if self.solver.max_iterations == Some(0) {
            return Err(invalid("solver.max_iterations", "must be at least 1"));
        }

        let rate = self.selection.excess_rate_per_kg;
        if !rate.is_finite() || rate < 0.0 {
            return Err(invalid("selection.excess_rate_per_kg", "must be a non-negative number"));
        }

        for class in TravelClass::ALL {
            let allowance = self.fares.get(class);
            let field = |name: &str| format!("fares.{class}.{name}");
            if !allowance.standard_limit.is_finite() || allowance.standard_limit < 0.0 {
                return Err(invalid(field("standard_limit"), "must be a non-negative number"));
            }
            if !allowance.base_price.is_finite() || allowance.base_price < 0.0 {
                return Err(invalid(field("base_price"), "must be a non-negative number"));
            }
            if !allowance.excess_charge_per_kg.is_finite() || allowance.excess_charge_per_kg < 0.0 {
                return Err(invalid(
                    field("excess_charge_per_kg"),
                    "must be a non-negative number",
                ));
            }
        }

        Ok(())
    }
}

fn invalid(field: impl Into<String>, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        reason: reason.into(),
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

impl LoggingConfig {
    /// Initialize the tracing subscriber on stderr. `RUST_LOG` takes precedence over `level`.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => {
                fmt()
                    .json()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
            _ => {
                fmt()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolverConfig {
    /// Pivot budget; derived from the problem size when unset
    #[serde(default)]
    pub max_iterations: Option<usize>,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Accept `>=`/`=` rows and negative right-hand sides
    #[serde(default)]
    pub phase_one: bool,
}

fn default_tolerance() -> f64 {
    1e-9
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: None,
            tolerance: default_tolerance(),
            phase_one: false,
        }
    }
}

impl SolverConfig {
    pub fn build(&self) -> Solver {
        let solver = Solver::new()
            .with_tolerance(self.tolerance)
            .with_phase_one(self.phase_one);
        match self.max_iterations {
            Some(max) => solver.with_max_iterations(max),
            None => solver,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectionConfig {
    #[serde(default = "default_excess_rate")]
    pub excess_rate_per_kg: f64,
    #[serde(default)]
    pub strategy: SelectionStrategy,
}

fn default_excess_rate() -> f64 {
    DEFAULT_EXCESS_RATE_PER_KG
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            excess_rate_per_kg: default_excess_rate(),
            strategy: SelectionStrategy::default(),
        }
    }
}
