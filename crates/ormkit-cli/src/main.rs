//! ormkit command-line tool.
//!
//! Loads model definitions from a JSON file, configures a SQLite database and
//! prints the dependency order or creates and drops the tables.

mod commands;
mod config;
mod error;

use clap::Parser;
use config::{Args, CliConfig};
use ormkit_core::{set_debug_enabled, shutdown, Orm};
use tracing_subscriber::prelude::*;

fn main() {
    let args = Args::parse();
    let config = args.into_config();

    let default_filter = if config.debug {
        "ormkit=debug"
    } else {
        "ormkit=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = run(config);
    shutdown();

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(config: CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    set_debug_enabled(config.debug);

    let models = commands::load_models(&config.models_path)?;
    let orm = Orm::global();
    for model in models {
        orm.register_table(model);
    }
    tracing::debug!(models = orm.registry().len(), "models loaded");

    let db = commands::open_database(&config.database)?;
    orm.set_database(db, false, config.family);
    tracing::debug!(
        database = %config.database,
        family = %orm.database_family(),
        "database configured"
    );

    let output = commands::execute(orm, &config.command)?;
    println!("{}", output);
    Ok(())
}
