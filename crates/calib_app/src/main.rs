//! Calibration form CLI
//!
//! Entry point for entering, saving, loading and testing calibration records.

use anyhow::{Context, Result};
use calib_app::cli::{run, Cli};
use calib_app::prelude::*;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(cli: &Cli) -> Result<SessionConfig> {
    let mut config = match &cli.config {
        Some(path) => SessionConfig::load_with_env_and_validate(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => SessionConfig::default_with_env_and_validate()
            .context("Invalid configuration from environment")?,
    };

    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
        config.validate().context("Invalid --log-level")?;
    }

    Ok(config)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_tracing(&config.log_level);

    let mut session = CalibrationSession::new(config);
    let config = session.config();
    tracing::debug!(
        strict_validation = config.strict_validation,
        json_indent = config.json_indent,
        seed = config.test.seed,
        "Configuration loaded"
    );

    let output = run(&cli, &mut session)?;

    for line in session.log().lines() {
        println!("{}", line);
    }
    if let Some(report) = &output.report {
        println!();
        print!("{}", report);
    }

    Ok(ExitCode::from(output.outcome.exit_status()))
}
