//! Configuration loader for the `codemetal-airwatch` backend service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use crate::category::Breakpoints;
use crate::trend::DEFAULT_WINDOW_HOURS;

/// Parse an optional numeric environment variable with a default value.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// CSV file backing the Reading Store.
    pub readings_path: PathBuf,

    /// CSV file backing the Site Directory.
    pub sites_path: PathBuf,

    /// Trailing trend window in hours.
    pub trend_window_hours: u32,

    /// PM2.5 category upper bounds.
    pub breakpoints: Breakpoints,

    /// Default number of rows in the hotspot table.
    pub hotspot_limit: usize,

    /// HTTP listen port.
    pub port: u16,
}

impl Config {
    /// Configuration with defaults for everything but the two input files.
    pub fn new(readings_path: impl Into<PathBuf>, sites_path: impl Into<PathBuf>) -> Self {
        // ---
        Self {
            readings_path: readings_path.into(),
            sites_path: sites_path.into(),
            trend_window_hours: DEFAULT_WINDOW_HOURS,
            breakpoints: Breakpoints::default(),
            hotspot_limit: 5,
            port: 8080,
        }
    }
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `READINGS_CSV` – sensor readings file
/// - `SITES_CSV` – sensor site list
///
/// Optional:
/// - `TREND_WINDOW_HOURS` – trend window (default: 24)
/// - `PM25_BREAKPOINTS` – four comma-separated upper bounds
///   (default: `12,35.4,55.4,150.4`)
/// - `HOTSPOT_LIMIT` – rows in the hotspot table (default: 5)
/// - `PORT` – listen port (default: 8080)
///
/// Returns an error if any required variable is missing or invalid. An invalid
/// breakpoint table is a configuration error and aborts startup.
pub fn load_from_env() -> Result<Config> {
    // ---
    let readings_path: String = require_env!("READINGS_CSV");
    let sites_path: String = require_env!("SITES_CSV");
    let defaults = Config::new(&readings_path, &sites_path);

    let trend_window_hours = parse_env!("TREND_WINDOW_HOURS", u32, defaults.trend_window_hours);
    let hotspot_limit = parse_env!("HOTSPOT_LIMIT", usize, defaults.hotspot_limit);
    let port = parse_env!("PORT", u16, defaults.port);

    let breakpoints = match env::var("PM25_BREAKPOINTS") {
        Ok(list) => Breakpoints::parse(&list).context("Invalid PM25_BREAKPOINTS")?,
        Err(_) => defaults.breakpoints,
    };

    Ok(Config {
        trend_window_hours,
        breakpoints,
        hotspot_limit,
        port,
        ..defaults
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  READINGS_CSV       : {}", self.readings_path.display());
        tracing::info!("  SITES_CSV          : {}", self.sites_path.display());
        tracing::info!("  TREND_WINDOW_HOURS : {}", self.trend_window_hours);
        tracing::info!("  PM25_BREAKPOINTS   : {:?}", self.breakpoints.as_array());
        tracing::info!("  HOTSPOT_LIMIT      : {}", self.hotspot_limit);
        tracing::info!("  PORT               : {}", self.port);
    }
}
