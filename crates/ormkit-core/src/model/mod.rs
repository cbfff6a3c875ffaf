//! Model descriptors and the model registry.
//!
//! A model is a declared data entity backed by one table. The registry keeps
//! one [`MetaModel`] per model name; the descriptor knows which other models
//! it references and how to create and drop its table.

mod meta;
mod registry;
mod table;

pub use meta::MetaModel;
pub use registry::ModelRegistry;
pub use table::{ColumnType, DeleteBehavior, FieldDef, ForeignKey, TableDef};

use crate::family::DatabaseFamily;

/// Source of a model's schema.
///
/// Implementations produce the DDL for their table; the registry and the
/// schema orchestration only decide when to run it.
pub trait ModelDefinition: Send + Sync + 'static {
    /// Table backing the model.
    fn table(&self) -> &str;

    /// Names of the models this one references.
    fn foreign_models(&self) -> Vec<String>;

    /// Statements creating the table, in execution order.
    fn create_table_sql(&self, family: DatabaseFamily) -> Vec<String>;

    /// Statements dropping the table, in execution order.
    fn drop_table_sql(&self, family: DatabaseFamily) -> Vec<String> {
        vec![format!("DROP TABLE {}", family.quote_identifier(self.table()))]
    }
}

/// A model registered by type.
pub trait Model: 'static {
    /// Schema of the model.
    fn definition() -> TableDef;

    /// Canonical model name, the unqualified type name by default.
    fn model_name() -> String {
        short_type_name(std::any::type_name::<Self>()).to_string()
    }
}

/// Strip the module path from a type name, keeping generic arguments.
fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(pos) => &full[pos + 2..],
        None => full,
    }
}
