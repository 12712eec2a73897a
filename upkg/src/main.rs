// SPDX-FileCopyrightText: 2025 upkg contributors
// SPDX-License-Identifier: MIT

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use upkg::cli::Cli;
use upkg::commands;
use upkg::config::Config;
use upkg::error::Result;
use upkg_store_db::PackageDatabase;

fn init_tracing(verbose: bool, log_level: &str) {
    let default_level = if verbose { "debug" } else { log_level };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli, config: Config) -> Result<()> {
    info!("Package database: {}", config.db_dir.display());
    let db = PackageDatabase::open(&config.db_dir, config.table_config())?;

    let mut stdout = std::io::stdout().lock();
    commands::run(db, &cli.command, &mut stdout)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("upkg: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(db_dir) = &cli.db_dir {
        config.db_dir = db_dir.clone();
    }

    init_tracing(cli.verbose, &config.log_level);

    match run(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
