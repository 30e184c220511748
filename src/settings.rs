//! Layered loading of [`AnalysisConfig`].
//!
//! Values are resolved in this order, later layers winning:
//!
//! 1. built-in defaults
//! 2. an optional config file (TOML, YAML or JSON, picked by extension)
//! 3. `SPANWATCH_*` environment variables, with `__` for nesting
//! 4. explicit command-line overrides
//!
//! # Configuration
//!
//! ```toml
//! gap_tolerance_multiplier = 2.0
//! expected_interval = "15m"
//!
//! [columns]
//! span_column = "TP"
//!
//! [[alert_rules]]
//! metric_name = "osnr"
//! comparator = "<"
//! threshold = 15.0
//! severity = "warning"
//! ```
//!
//! ```bash
//! SPANWATCH_PARALLELISM=4 SPANWATCH_COLUMNS__SPAN_COLUMN=NE spanwatch --input pm/
//! ```

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use spanwatch_core::AnalysisConfig;
use spanwatch_types::Interval;

/// Prefix of environment variables read as configuration.
pub const ENV_PREFIX: &str = "SPANWATCH";

/// Values given on the command line, applied over every other layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    /// Force resampling on.
    pub resample: bool,
    pub gap_tolerance: Option<f64>,
    pub expected_interval: Option<Interval>,
    pub parallelism: Option<usize>,
}

/// Load the analysis configuration from every layer.
///
/// The result is not validated; [`spanwatch_core::Pipeline::new`] does that.
pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<AnalysisConfig, ConfigError> {
    load_with_env(path, overrides, environment())
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn load_with_env(
    path: Option<&Path>,
    overrides: &Overrides,
    env: Environment,
) -> Result<AnalysisConfig, ConfigError> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path));
    }
    builder = builder.add_source(env);

    if overrides.resample {
        builder = builder.set_override("resample_enabled", true)?;
    }
    if let Some(tolerance) = overrides.gap_tolerance {
        builder = builder.set_override("gap_tolerance_multiplier", tolerance)?;
    }
    if let Some(interval) = overrides.expected_interval {
        builder = builder.set_override("expected_interval", interval.to_string())?;
    }
    if let Some(parallelism) = overrides.parallelism {
        builder = builder.set_override("parallelism", parallelism as i64)?;
    }

    builder.build()?.try_deserialize()
}
