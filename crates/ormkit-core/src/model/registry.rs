//! Model registry.

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::{MetaModel, Model, ModelDefinition, TableDef};

/// Mapping from model name to descriptor.
///
/// Names are unique and registration is idempotent: the first descriptor
/// registered under a name stays in place. Iteration follows registration
/// order, which makes dependency ordering deterministic.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: RwLock<IndexMap<String, MetaModel>>,
}

impl ModelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model by type, named after [`Model::model_name`].
    pub fn register<T: Model>(&self) -> MetaModel {
        let name = T::model_name();
        if name.is_empty() {
            return MetaModel::default();
        }
        self.models
            .write()
            .entry(name)
            .or_insert_with_key(|name| MetaModel::new(name.clone(), T::definition()))
            .clone()
    }

    /// Register a model under an explicit name.
    ///
    /// An empty name registers nothing and returns the empty descriptor. If
    /// the name is taken, `definition` is discarded and the existing
    /// descriptor returned.
    pub fn register_named<D: ModelDefinition>(
        &self,
        name: impl Into<String>,
        definition: D,
    ) -> MetaModel {
        let name = name.into();
        if name.is_empty() {
            return MetaModel::default();
        }
        self.models
            .write()
            .entry(name)
            .or_insert_with_key(|name| MetaModel::new(name.clone(), definition))
            .clone()
    }

    /// Register a table definition under its own name.
    pub fn register_table(&self, table: TableDef) -> MetaModel {
        let name = table.name.clone();
        self.register_named(name, table)
    }

    /// Remove a model. Does nothing for unknown or empty names.
    pub fn unregister(&self, name: &str) {
        if name.is_empty() {
            return;
        }
        self.models.write().shift_remove(name);
    }

    /// Find a model by name.
    ///
    /// Exact matches win; otherwise the first registered model whose name
    /// matches ignoring ASCII case is returned. Returns the empty descriptor
    /// when nothing matches.
    pub fn lookup(&self, name: &str) -> MetaModel {
        let models = self.models.read();
        if let Some(model) = models.get(name) {
            return model.clone();
        }
        models
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, model)| model.clone())
            .unwrap_or_default()
    }

    /// Whether a model is registered under exactly `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.models.read().contains_key(name)
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.models.read().len()
    }

    /// Whether no model is registered.
    pub fn is_empty(&self) -> bool {
        self.models.read().is_empty()
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.models.read().keys().cloned().collect()
    }

    /// Registered descriptors in registration order.
    pub fn models(&self) -> Vec<MetaModel> {
        self.models.read().values().cloned().collect()
    }

    /// Remove every model.
    pub fn clear(&self) {
        self.models.write().clear();
    }

    /// Copy of the name-to-descriptor map.
    pub(crate) fn snapshot(&self) -> IndexMap<String, MetaModel> {
        self.models.read().clone()
    }
}
