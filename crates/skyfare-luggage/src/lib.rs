pub mod api;
#[cfg(feature = "config")]
pub mod config;
mod error;
pub mod fare;
mod knapsack;
pub mod selection;

#[cfg(feature = "wasm")]
pub mod wasm;

#[cfg(feature = "config")]
pub use config::{Config, ConfigError, LoggingConfig, SelectionConfig, ServerConfig, SolverConfig};
pub use error::LuggageError;
pub use fare::{ClassAllowance, FareBreakdown, FareTable, FormattedFare, LuggageCalculator, TravelClass, format_inr};
pub use selection::{LuggageSelector, SelectionConstraint, SelectionResult, SelectionStrategy};
