//! In-memory registry of record schemas, keyed by schema name.
//!
//! The registry uses `arc-swap` for lock-free reads on the hot path; writers
//! swap in a whole new map.

use std::{collections::HashMap, sync::Arc};

use arc_swap::ArcSwap;

use super::{RecordSchema, SchemaError};

/// Shared, lock-free map of schema name to [`RecordSchema`].
#[derive(Clone, Debug)]
pub struct SchemaRegistry {
    inner: Arc<ArcSwap<HashMap<String, Arc<RecordSchema>>>>,
}

impl SchemaRegistry {
    /// Create a new, empty [`SchemaRegistry`].
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ArcSwap::new(Arc::new(HashMap::new()))),
        }
    }

    /// Number of schemas currently registered.
    pub fn len(&self) -> usize {
        self.inner.load().len()
    }

    /// `true` if no schemas are registered.
    pub fn is_empty(&self) -> bool {
        self.inner.load().is_empty()
    }

    /// Registered schema names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.load().keys().cloned().collect();
        names.sort();
        names
    }

    /// Look up a schema by name.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnknownSchema`] if `name` is not registered.
    pub fn get(&self, name: &str) -> Result<Arc<RecordSchema>, SchemaError> {
        self.inner
            .load()
            .get(name)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownSchema(name.to_owned()))
    }

    /// Add or replace a single schema under its own name.
    pub fn register(&self, schema: RecordSchema) {
        let schema = Arc::new(schema);
        self.inner.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(schema.name.clone(), Arc::clone(&schema));
            next
        });
    }

    /// Atomically replace the entire schema map.
    pub fn replace_all(&self, schemas: HashMap<String, RecordSchema>) {
        let next: HashMap<String, Arc<RecordSchema>> = schemas
            .into_iter()
            .map(|(name, schema)| (name, Arc::new(schema)))
            .collect();
        self.inner.store(Arc::new(next));
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}
