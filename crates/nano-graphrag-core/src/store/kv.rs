//! In-memory [`KvStorage`] implementation.
//!
//! A `HashMap` per namespace. Records are cloned out on read so callers
//! never hold references into the store.

use std::collections::HashMap;

use tracing::debug;

use super::KvStorage;

/// In-memory key-value store for documents, chunks and community reports.
#[derive(Debug, Clone)]
pub struct InMemoryKvStorage<V> {
    namespace: String,
    data: HashMap<String, V>,
}

impl<V> InMemoryKvStorage<V> {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            data: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<V: Clone> KvStorage<V> for InMemoryKvStorage<V> {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn all_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.data.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn get_by_id(&self, id: &str) -> Option<V> {
        self.data.get(id).cloned()
    }

    fn get_by_ids(&self, ids: &[String]) -> Vec<Option<V>> {
        ids.iter().map(|id| self.get_by_id(id)).collect()
    }

    fn filter_keys(&self, ids: &[String]) -> Vec<String> {
        ids.iter()
            .filter(|id| !self.data.contains_key(id.as_str()))
            .cloned()
            .collect()
    }

    fn upsert(&mut self, data: HashMap<String, V>) {
        debug!(namespace = %self.namespace, count = data.len(), "kv upsert");
        self.data.extend(data);
    }

    fn drop(&mut self) {
        debug!(namespace = %self.namespace, "kv drop");
        self.data.clear();
    }
}
