//! CLI configuration.

use clap::{Parser, Subcommand};
use ormkit_core::DatabaseFamily;
use std::path::PathBuf;

/// Database used when none is given.
pub const DEFAULT_DATABASE: &str = ":memory:";

/// What to do with the loaded models.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the table creation order and any reference cycles.
    Order,
    /// Create every table, referenced tables first.
    Create,
    /// Drop every table, referencing tables first.
    Drop,
    /// Show one model. Names match case-insensitively.
    Show {
        /// Model name.
        name: String,
    },
}

/// Resolved CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// SQLite database path, or `:memory:`.
    pub database: String,

    /// JSON file holding the model definitions.
    pub models_path: PathBuf,

    /// Family to assume instead of detecting it.
    pub family: Option<DatabaseFamily>,

    /// Log every statement.
    pub debug: bool,

    /// Action to run.
    pub command: Command,
}

impl CliConfig {
    /// Configuration printing the order of the models in `models_path`.
    pub fn new(models_path: impl Into<PathBuf>) -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            models_path: models_path.into(),
            family: None,
            debug: false,
            command: Command::Order,
        }
    }

    /// Set the database path.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set the family.
    pub fn with_family(mut self, family: DatabaseFamily) -> Self {
        self.family = Some(family);
        self
    }

    /// Enable statement logging.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the action.
    pub fn with_command(mut self, command: Command) -> Self {
        self.command = command;
        self
    }
}

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "ormkit")]
#[command(version, about = "Inspect, create and drop model schemas", long_about = None)]
pub struct Args {
    /// SQLite database file.
    #[arg(short, long, default_value = DEFAULT_DATABASE)]
    pub database: String,

    /// JSON file with the model definitions.
    #[arg(short, long)]
    pub models: PathBuf,

    /// Database family (sqlite, mysql, postgresql, mssql). Detected when omitted.
    #[arg(long)]
    pub family: Option<DatabaseFamily>,

    /// Log every SQL statement.
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    /// Convert command-line arguments to the CLI configuration.
    pub fn into_config(self) -> CliConfig {
        // "unknown" on the command line means detect.
        let family = self.family.filter(|f| *f != DatabaseFamily::Unknown);

        CliConfig {
            database: self.database,
            models_path: self.models,
            family,
            debug: self.debug,
            command: self.command,
        }
    }
}
