//! Storage abstractions.
//!
//! Three traits cover everything the orchestrator persists:
//!
//! | Trait | Impl | Holds |
//! |-------|------|-------|
//! | [`KvStorage`] | [`InMemoryKvStorage`](kv::InMemoryKvStorage) | full documents, text chunks, community reports |
//! | [`GraphStorage`] | [`InMemoryGraphStorage`](graph::InMemoryGraphStorage) | nodes, undirected edges, cluster labels |
//! | [`VectorStorage`] | [`VectorIndex`](vector::VectorIndex) | embedded chunk/entity content |
//!
//! All stores are single-owner and synchronous: mutation takes `&mut self`
//! and nothing is locked internally. Callers sharing a store across threads
//! must wrap it themselves.

pub mod graph;
pub mod kv;
pub mod vector;

use std::collections::HashMap;

use crate::error::Result;
use crate::models::{Properties, SingleCommunity};

pub use graph::{ClusterAlgorithm, InMemoryGraphStorage};
pub use kv::InMemoryKvStorage;
pub use vector::{Metric, StorageBackend, VectorIndex, VectorIndexConfig, VectorMatch};

/// Key-value storage of typed records, scoped by a namespace.
///
/// Absence is a value (`None`, or an omitted id), never an error.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get_by_id`](KvStorage::get_by_id) | single lookup |
/// | [`get_by_ids`](KvStorage::get_by_ids) | aligned batch lookup |
/// | [`filter_keys`](KvStorage::filter_keys) | ids not yet stored |
/// | [`upsert`](KvStorage::upsert) | whole-record insert or replace |
/// | [`drop`](KvStorage::drop) | clear the namespace |
pub trait KvStorage<V> {
    fn namespace(&self) -> &str;

    /// All stored ids, sorted.
    fn all_keys(&self) -> Vec<String>;

    fn get_by_id(&self, id: &str) -> Option<V>;

    /// One entry per requested id, in request order.
    fn get_by_ids(&self, ids: &[String]) -> Vec<Option<V>>;

    /// The subsequence of `ids` that is not stored.
    fn filter_keys(&self, ids: &[String]) -> Vec<String>;

    fn upsert(&mut self, data: HashMap<String, V>);

    /// Remove every record in the namespace. Irreversible.
    fn drop(&mut self);
}

/// Property graph with undirected, canonically keyed edges.
pub trait GraphStorage {
    fn namespace(&self) -> &str;

    fn has_node(&self, node_id: &str) -> bool;
    fn has_edge(&self, source: &str, target: &str) -> bool;

    /// Number of distinct neighbors.
    fn node_degree(&self, node_id: &str) -> usize;

    /// Sum of both endpoint degrees. A cheap ranking heuristic, not a
    /// centrality measure.
    fn edge_degree(&self, source: &str, target: &str) -> usize {
        self.node_degree(source) + self.node_degree(target)
    }

    fn get_node(&self, node_id: &str) -> Option<Properties>;
    fn get_edge(&self, source: &str, target: &str) -> Option<Properties>;

    /// Incident edges as `(node_id, neighbor)` pairs.
    fn get_node_edges(&self, node_id: &str) -> Vec<(String, String)>;

    fn upsert_node(&mut self, node_id: &str, data: Properties);
    fn upsert_edge(&mut self, source: &str, target: &str, data: Properties);

    /// Same as calling [`upsert_node`](GraphStorage::upsert_node) in order.
    fn upsert_nodes_batch(&mut self, nodes: Vec<(String, Properties)>) {
        for (id, data) in nodes {
            self.upsert_node(&id, data);
        }
    }

    /// Same as calling [`upsert_edge`](GraphStorage::upsert_edge) in order.
    fn upsert_edges_batch(&mut self, edges: Vec<(String, String, Properties)>) {
        for (source, target, data) in edges {
            self.upsert_edge(&source, &target, data);
        }
    }

    /// Label every node with a cluster id.
    fn clustering(&mut self, algorithm: ClusterAlgorithm);

    /// Group nodes by their cluster label.
    fn community_schema(&self) -> HashMap<String, SingleCommunity>;
}

/// Nearest-neighbor index over embedded record content.
pub trait VectorStorage {
    fn namespace(&self) -> &str;

    /// Embed and index records. Each record's `content` field is embedded;
    /// configured metadata fields are kept for query results.
    fn upsert(&mut self, data: HashMap<String, Properties>) -> Result<()>;

    /// Up to `top_k` matches in descending score order.
    fn query(&self, query: &str, top_k: usize) -> Result<Vec<VectorMatch>>;
}
