//! Subcommand execution.

use std::path::Path;
use std::sync::Arc;

use ormkit_core::{ConnectOptions, Database, Orm, SqliteDriver, TableDef};

use crate::config::Command;
use crate::error::CliError;

/// Connection name of the database opened by the CLI.
const CONNECTION_NAME: &str = "default";

/// Load and validate the model definitions in `path`.
pub fn load_models(path: &Path) -> Result<Vec<TableDef>, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let models: Vec<TableDef> = serde_json::from_str(&content)?;
    for model in &models {
        model.validate()?;
    }
    Ok(models)
}

/// Open the SQLite database at `path`.
pub fn open_database(path: &str) -> Result<Database, CliError> {
    let db = Database::new(
        CONNECTION_NAME,
        Arc::new(SqliteDriver::new()),
        ConnectOptions::new(path),
    );
    if db.open() {
        return Ok(db);
    }
    let reason = db
        .last_error()
        .map(|e| e.to_string())
        .unwrap_or_else(|| "unknown error".to_string());
    Err(CliError::Open {
        database: path.to_string(),
        reason,
    })
}

/// Run `command` against the configured context and return its output.
pub fn execute(orm: &Orm, command: &Command) -> Result<String, CliError> {
    match command {
        Command::Order => Ok(order(orm)),
        Command::Create => {
            if orm.create_tables() {
                Ok(format!("created {} tables", orm.registry().len()))
            } else {
                Err(CliError::Schema("table creation"))
            }
        }
        Command::Drop => {
            if orm.drop_tables() {
                Ok(format!("dropped {} tables", orm.registry().len()))
            } else {
                Err(CliError::Schema("table removal"))
            }
        }
        Command::Show { name } => show(orm, name),
    }
}

fn order(orm: &Orm) -> String {
    let resolution = orm.resolve();
    let mut lines: Vec<String> = resolution
        .order
        .iter()
        .enumerate()
        .map(|(i, model)| format!("{:>3}. {} ({})", i + 1, model.name(), model.table()))
        .collect();
    for cycle in &resolution.cycles {
        lines.push(format!("cycle: {}", cycle.join(" -> ")));
    }
    lines.join("\n")
}

fn show(orm: &Orm, name: &str) -> Result<String, CliError> {
    let model = orm.meta_model(name);
    if !model.is_valid() {
        return Err(CliError::UnknownModel(name.to_string()));
    }

    let references = if model.foreign_models().is_empty() {
        "-".to_string()
    } else {
        model.foreign_models().join(", ")
    };
    Ok(format!(
        "model:      {}\ntable:      {}\nreferences: {}",
        model.name(),
        model.table(),
        references
    ))
}
