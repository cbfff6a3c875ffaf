//! ormkit core.
//!
//! The pieces an ORM needs underneath its query API:
//!
//! - [`ConnectionManager`]: one reference connection, transparently cloned
//!   per thread and released when the thread exits.
//! - [`ModelRegistry`]: models registered by name, each described by a
//!   [`MetaModel`].
//! - [`resolve`]: orders models so that referenced models come first.
//! - [`schema`]: creates and drops every registered table in that order.
//! - [`Query`]: the single path through which statements run, with
//!   process-wide SQL diagnostics toggled by [`set_debug_enabled`].
//!
//! [`Orm`] bundles a manager and a registry; [`Orm::global`] is the
//! process-wide instance.

pub mod connection;
pub mod database;
pub mod driver;
pub mod error;
pub mod family;
pub mod model;
pub mod orm;
pub mod query;
pub mod resolver;
pub mod schema;
pub mod value;

pub use connection::{ConfigureOptions, ConnectionManager, ManagerConfig, DEFAULT_NAME_PREFIX};
pub use database::{ConnectOptions, Database};
pub use driver::{Driver, DriverConnection, ResultSet, SqliteDriver, Statement};
pub use error::{Error, Result};
pub use family::{DatabaseFamily, DriverNameDetector, FamilyDetector};
pub use model::{
    ColumnType, DeleteBehavior, FieldDef, ForeignKey, MetaModel, Model, ModelDefinition,
    ModelRegistry, TableDef,
};
pub use orm::{shutdown, Orm};
pub use query::{is_debug_enabled, set_debug_enabled, Query};
pub use resolver::{ordered_models, resolve, Resolution};
pub use value::Value;
