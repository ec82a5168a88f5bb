//! Settings for the `tripsplit` binary.
//!
//! Read from an optional TOML file (`tripsplit.toml` by default), then the
//! `TRIPSPLIT_*` environment, then command-line overrides.

use std::path::PathBuf;

use clap::Args;
use engine::{EngineOptions, Money, PlannerMode, PlannerOptions};
use serde::Deserialize;

use crate::error::{AppError, Result};

const DEFAULT_CONFIG_PATH: &str = "tripsplit.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub level: String,
    pub data_dir: PathBuf,
    pub optimize_transfers: bool,
    pub max_iterations: usize,
    pub tolerance_minor: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            data_dir: PathBuf::from("trips"),
            optimize_transfers: true,
            max_iterations: engine::DEFAULT_MAX_ITERATIONS,
            tolerance_minor: 0,
        }
    }
}

/// Global flags shared by every subcommand.
#[derive(Debug, Default, Args)]
pub struct Overrides {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    pub config: Option<String>,
    /// Override the log level (e.g. `debug`).
    #[arg(long, global = true)]
    pub level: Option<String>,
    /// Override the directory holding the trip documents.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    /// Plan one transfer per pair instead of minimising transfers.
    #[arg(long, global = true)]
    pub simple: bool,
    /// Override the settlement matching ceiling.
    #[arg(long, global = true)]
    pub max_iterations: Option<usize>,
}

impl Settings {
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let config_path = overrides.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
        let mut settings: Settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("TRIPSPLIT"))
            .build()?
            .try_deserialize()?;

        if let Some(level) = &overrides.level {
            settings.level = level.clone();
        }
        if let Some(data_dir) = &overrides.data_dir {
            settings.data_dir = data_dir.clone();
        }
        if overrides.simple {
            settings.optimize_transfers = false;
        }
        if let Some(max_iterations) = overrides.max_iterations {
            settings.max_iterations = max_iterations;
        }

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(AppError::Input("max_iterations must be >= 1".to_string()));
        }
        if self.tolerance_minor < 0 {
            return Err(AppError::Input("tolerance_minor must be >= 0".to_string()));
        }
        Ok(())
    }

    /// Engine options derived from the settings.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            planner: PlannerOptions {
                mode: PlannerMode::from_optimize(self.optimize_transfers),
                tolerance: Money::new(self.tolerance_minor),
                max_iterations: self.max_iterations,
            },
        }
    }
}
