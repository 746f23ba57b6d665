//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `tls_watch` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - Rendering the report to stdout
//! - Mapping the run outcome to the process exit code

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use tls_watch::initialization::{init_crypto_provider, init_logger_with};
use tls_watch::output::get_formatter;
use tls_watch::run::{EXIT_CONFIG_ERROR, EXIT_SUCCESS};
use tls_watch::{run_with_config, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = match Config::try_parse() {
        Ok(config) => config,
        Err(e) => {
            // --help and --version also arrive here, on stdout.
            let code = if e.use_stderr() {
                EXIT_CONFIG_ERROR
            } else {
                EXIT_SUCCESS
            };
            let _ = e.print();
            process::exit(code);
        }
    };

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    // Initialize crypto provider for TLS operations
    init_crypto_provider();

    match run_with_config(&config).await {
        Ok(report) => {
            let formatter = get_formatter(config.format, !config.no_color);
            println!("{}", formatter.format_run(&report));
            process::exit(report.exit_code());
        }
        Err(e) => {
            eprintln!("tls_watch error: {:#}", e);
            process::exit(EXIT_CONFIG_ERROR);
        }
    }
}
