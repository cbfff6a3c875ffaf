//! Ordered table creation and removal.
//!
//! Both operations are best effort: every model is attempted even after a
//! failure, and the result is `true` only if every model succeeded.

use tracing::warn;

use crate::database::Database;
use crate::model::ModelRegistry;
use crate::query::is_debug_enabled;
use crate::resolver::{resolve, Resolution};

fn resolve_reporting(registry: &ModelRegistry) -> Resolution {
    let resolution = resolve(registry);
    if is_debug_enabled() {
        for cycle in &resolution.cycles {
            warn!(cycle = %cycle.join(" -> "), "foreign key cycle between models");
        }
    }
    resolution
}

/// Create the tables of all registered models on `db`, referenced models
/// first.
pub fn create_tables(registry: &ModelRegistry, db: &Database) -> bool {
    resolve_reporting(registry)
        .order
        .iter()
        .fold(true, |ok, model| model.create_table(db) && ok)
}

/// Drop the tables of all registered models on `db`, referencing models
/// first.
pub fn drop_tables(registry: &ModelRegistry, db: &Database) -> bool {
    resolve_reporting(registry)
        .order
        .iter()
        .rev()
        .fold(true, |ok, model| model.drop_table(db) && ok)
}
