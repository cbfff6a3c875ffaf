//! Registered model descriptors.

use std::fmt;
use std::sync::{Arc, OnceLock};

use super::ModelDefinition;
use crate::database::Database;
use crate::query::Query;

struct MetaModelInner {
    name: String,
    definition: Box<dyn ModelDefinition>,
    foreign: OnceLock<Vec<String>>,
}

/// Descriptor of a registered model.
///
/// Descriptors are cheap to clone; clones share the registry's canonical
/// instance. The default descriptor is empty and stands for "no such model".
#[derive(Clone, Default)]
pub struct MetaModel {
    inner: Option<Arc<MetaModelInner>>,
}

impl MetaModel {
    /// Create a descriptor named `name`.
    pub fn new(name: impl Into<String>, definition: impl ModelDefinition) -> Self {
        Self {
            inner: Some(Arc::new(MetaModelInner {
                name: name.into(),
                definition: Box::new(definition),
                foreign: OnceLock::new(),
            })),
        }
    }

    /// Whether this descriptor refers to a model.
    pub fn is_valid(&self) -> bool {
        self.inner.is_some()
    }

    /// Model name, empty for the empty descriptor.
    pub fn name(&self) -> &str {
        self.inner.as_ref().map_or("", |inner| inner.name.as_str())
    }

    /// Backing table, empty for the empty descriptor.
    pub fn table(&self) -> &str {
        self.inner
            .as_ref()
            .map_or("", |inner| inner.definition.table())
    }

    /// Names of the models this one references, computed on first use.
    pub fn foreign_models(&self) -> &[String] {
        match &self.inner {
            Some(inner) => inner
                .foreign
                .get_or_init(|| inner.definition.foreign_models()),
            None => &[],
        }
    }

    /// Create the backing table on `db`.
    ///
    /// Statements run in order and the first failure stops the sequence.
    pub fn create_table(&self, db: &Database) -> bool {
        let Some(inner) = &self.inner else {
            return false;
        };
        run_all(db, inner.definition.create_table_sql(db.family()))
    }

    /// Drop the backing table on `db`.
    pub fn drop_table(&self, db: &Database) -> bool {
        let Some(inner) = &self.inner else {
            return false;
        };
        run_all(db, inner.definition.drop_table_sql(db.family()))
    }

    /// Whether both descriptors are the same registered instance.
    pub fn same_model(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

fn run_all(db: &Database, statements: Vec<String>) -> bool {
    let mut query = Query::new(db.clone());
    statements.iter().all(|sql| query.exec_sql(sql))
}

impl fmt::Debug for MetaModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Some(_) => f
                .debug_struct("MetaModel")
                .field("name", &self.name())
                .field("table", &self.table())
                .finish(),
            None => f.write_str("MetaModel(empty)"),
        }
    }
}
