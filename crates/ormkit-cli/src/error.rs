//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

/// CLI errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// The model file could not be read.
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The model file is not valid JSON for a list of models.
    #[error("invalid model file: {0}")]
    Parse(#[from] serde_json::Error),

    /// A model definition is incomplete.
    #[error(transparent)]
    Model(#[from] ormkit_core::Error),

    /// The database could not be opened.
    #[error("cannot open database {database}: {reason}")]
    Open { database: String, reason: String },

    /// No model has the requested name.
    #[error("no model named {0}")]
    UnknownModel(String),

    /// Some schema statements failed.
    #[error("{0} failed; run with --debug to see the failing statements")]
    Schema(&'static str),
}
