//! The ORM context and its process-wide default instance.
//!
//! Statics are never dropped, so the process-wide instance is not torn down
//! at exit on its own. Applications using [`Orm::global`] call [`shutdown`]
//! before exiting to close its connections.

use std::sync::LazyLock;

use crate::connection::{ConfigureOptions, ConnectionManager};
use crate::database::Database;
use crate::family::DatabaseFamily;
use crate::model::{MetaModel, Model, ModelDefinition, ModelRegistry, TableDef};
use crate::resolver::{self, Resolution};
use crate::schema;

static GLOBAL: LazyLock<Orm> = LazyLock::new(Orm::new);

/// Connection manager and model registry used together.
///
/// Most applications use the process-wide instance from [`Orm::global`];
/// tests and embedders can create isolated instances.
#[derive(Debug, Default)]
pub struct Orm {
    manager: ConnectionManager,
    registry: ModelRegistry,
}

impl Orm {
    /// Create an unconfigured context with no models.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context around an existing manager.
    pub fn with_manager(manager: ConnectionManager) -> Self {
        Self {
            manager,
            registry: ModelRegistry::new(),
        }
    }

    /// The process-wide context.
    ///
    /// Its connections stay open until [`shutdown`] is called; call it once
    /// before the process exits.
    pub fn global() -> &'static Orm {
        &GLOBAL
    }

    /// Connection manager.
    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Model registry.
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Set the reference connection. See [`ConnectionManager::configure`].
    pub fn set_database(&self, db: Database, skip_init: bool, family: Option<DatabaseFamily>) {
        self.manager.configure(db, skip_init, family);
    }

    /// Set the reference connection using [`ConfigureOptions`].
    pub fn set_database_with(&self, db: Database, options: ConfigureOptions) {
        self.manager.configure_with(db, options);
    }

    /// Connection for the calling thread.
    pub fn database(&self) -> Database {
        self.manager.current_connection()
    }

    /// Family of the configured connection.
    pub fn database_family(&self) -> DatabaseFamily {
        self.manager.database_family()
    }

    /// Register a model by type.
    pub fn register_model<T: Model>(&self) -> MetaModel {
        self.registry.register::<T>()
    }

    /// Register a model under an explicit name.
    pub fn register_named<D: ModelDefinition>(
        &self,
        name: impl Into<String>,
        definition: D,
    ) -> MetaModel {
        self.registry.register_named(name, definition)
    }

    /// Register a table definition under its own name.
    pub fn register_table(&self, table: TableDef) -> MetaModel {
        self.registry.register_table(table)
    }

    /// Remove a model.
    pub fn unregister_model(&self, name: &str) {
        self.registry.unregister(name);
    }

    /// Find a model by name, ignoring case when there is no exact match.
    pub fn meta_model(&self, name: &str) -> MetaModel {
        self.registry.lookup(name)
    }

    /// Registered models with dependencies first, plus any reference cycles.
    pub fn resolve(&self) -> Resolution {
        resolver::resolve(&self.registry)
    }

    /// Registered models with dependencies first.
    pub fn ordered_models(&self) -> Vec<MetaModel> {
        resolver::ordered_models(&self.registry)
    }

    /// Create all tables on the calling thread's connection.
    pub fn create_tables(&self) -> bool {
        schema::create_tables(&self.registry, &self.database())
    }

    /// Drop all tables on the calling thread's connection.
    pub fn drop_tables(&self) -> bool {
        schema::drop_tables(&self.registry, &self.database())
    }
}

/// Release the process-wide connection state.
///
/// Call before the process exits to close thread connections deterministically;
/// registered models are kept.
pub fn shutdown() {
    Orm::global().manager().close();
}
