//! Scriptsync CLI Binary
//!
//! Command-line interface for generating document versions and managing the
//! selected version of each document.

use anyhow::Context;
use clap::Parser;
use scriptsync::cli::{map_error, Cli, RunContext};
use scriptsync::config::ConfigLoader;
use scriptsync::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("{:#}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let logging_config = build_logging_config(cli);
    init_logging(Some(&logging_config)).context("Failed to initialize logging")?;

    info!("Scriptsync CLI starting");

    let context = RunContext::new(cli.workspace.clone(), cli.config.clone()).map_err(|e| {
        error!(error = %e, "Error initializing run context");
        anyhow::anyhow!(map_error(&e))
    })?;

    let output = context.execute(&cli.command).map_err(|e| {
        error!(error = %e, "Command failed");
        anyhow::anyhow!(map_error(&e))
    })?;

    info!("Command completed successfully");
    println!("{}", output);
    Ok(())
}

/// Build logging configuration from CLI args and the config file
fn build_logging_config(cli: &Cli) -> LoggingConfig {
    if !cli.verbose && cli.log_level.is_none() {
        return LoggingConfig {
            level: "off".to_string(),
            ..LoggingConfig::default()
        };
    }

    let mut config = match cli.config {
        Some(ref config_path) => ConfigLoader::load_from_file(config_path),
        None => ConfigLoader::load(&cli.workspace),
    }
    .map(|c| c.logging)
    .unwrap_or_default();

    if let Some(ref level) = cli.log_level {
        config.level = level.clone();
    } else if cli.verbose && config.level == "info" {
        config.level = "debug".to_string();
    }
    if let Some(ref format) = cli.log_format {
        config.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        config.output = output.clone();
    }

    config
}
