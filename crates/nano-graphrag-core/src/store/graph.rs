//! In-memory [`GraphStorage`] with connected-component clustering.
//!
//! Edges are undirected and stored once under their canonical key
//! `(min(a, b), max(a, b))`. Adjacency lists are ordered sets so traversal
//! order never depends on hash iteration.
//!
//! # Clustering
//!
//! [`ClusterAlgorithm::ConnectedComponents`] is the only algorithm. Nodes
//! are visited in ascending id order; each unvisited node starts a
//! breadth-first traversal that stamps the next integer label on every
//! reachable node. Labels are therefore stable for an unchanged graph.
//! The label is written to the node's `clusters` property as
//! `[{"level":0,"cluster":N}]`.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::GraphStorage;
use crate::error::RagError;
use crate::models::{Properties, SingleCommunity};

/// Node property holding the cluster assignment.
pub const CLUSTERS_KEY: &str = "clusters";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClusterAlgorithm {
    #[default]
    ConnectedComponents,
}

impl fmt::Display for ClusterAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterAlgorithm::ConnectedComponents => f.write_str("connected_components"),
        }
    }
}

impl FromStr for ClusterAlgorithm {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "connected_components" | "components" => Ok(ClusterAlgorithm::ConnectedComponents),
            other => Err(RagError::Configuration(format!(
                "unsupported clustering algorithm '{other}'. Only connected_components is available."
            ))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ClusterLabel {
    level: u32,
    cluster: usize,
}

/// Graph kept entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGraphStorage {
    namespace: String,
    nodes: HashMap<String, Properties>,
    edges: HashMap<(String, String), Properties>,
    adjacency: HashMap<String, BTreeSet<String>>,
}

impl InMemoryGraphStorage {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Cluster label of a node, if [`clustering`](GraphStorage::clustering)
    /// has run since the node was last upserted.
    pub fn cluster_of(&self, node_id: &str) -> Option<usize> {
        let raw = self.nodes.get(node_id)?.get(CLUSTERS_KEY)?;
        let labels: Vec<ClusterLabel> = serde_json::from_str(raw).ok()?;
        labels.first().map(|l| l.cluster)
    }

    fn connected_components(&mut self) {
        let mut order: Vec<String> = self.nodes.keys().cloned().collect();
        order.sort();

        let mut visited: HashSet<String> = HashSet::new();
        let mut next_label = 0usize;

        for start in order {
            if !visited.insert(start.clone()) {
                continue;
            }
            let label = serde_json::json!([{ "level": 0, "cluster": next_label }]).to_string();
            let mut queue = VecDeque::from([start]);
            while let Some(current) = queue.pop_front() {
                if let Some(neighbors) = self.adjacency.get(&current) {
                    for neighbor in neighbors {
                        if visited.insert(neighbor.clone()) {
                            queue.push_back(neighbor.clone());
                        }
                    }
                }
                self.nodes
                    .entry(current)
                    .or_default()
                    .insert(CLUSTERS_KEY.to_string(), label.clone());
            }
            next_label += 1;
        }
        debug!(namespace = %self.namespace, clusters = next_label, "connected components");
    }
}

fn canonical(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Occurrence score for a community.
///
/// Defined as the number of chunks associated with the community. No code
/// path associates chunks with communities yet, so this is zero until
/// entity extraction lands.
pub fn community_occurrence(community: &SingleCommunity) -> f64 {
    community.chunk_ids.len() as f64
}

impl GraphStorage for InMemoryGraphStorage {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn has_node(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    fn has_edge(&self, source: &str, target: &str) -> bool {
        self.edges.contains_key(&canonical(source, target))
    }

    fn node_degree(&self, node_id: &str) -> usize {
        self.adjacency.get(node_id).map_or(0, BTreeSet::len)
    }

    fn get_node(&self, node_id: &str) -> Option<Properties> {
        self.nodes.get(node_id).cloned()
    }

    fn get_edge(&self, source: &str, target: &str) -> Option<Properties> {
        self.edges.get(&canonical(source, target)).cloned()
    }

    fn get_node_edges(&self, node_id: &str) -> Vec<(String, String)> {
        self.adjacency
            .get(node_id)
            .map(|neighbors| {
                neighbors
                    .iter()
                    .map(|n| (node_id.to_string(), n.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn upsert_node(&mut self, node_id: &str, data: Properties) {
        self.nodes.insert(node_id.to_string(), data);
        self.adjacency.entry(node_id.to_string()).or_default();
    }

    /// Endpoints that are not nodes yet are created with no properties.
    fn upsert_edge(&mut self, source: &str, target: &str, data: Properties) {
        self.edges.insert(canonical(source, target), data);
        for (a, b) in [(source, target), (target, source)] {
            self.nodes.entry(a.to_string()).or_default();
            self.adjacency
                .entry(a.to_string())
                .or_default()
                .insert(b.to_string());
        }
    }

    fn clustering(&mut self, algorithm: ClusterAlgorithm) {
        match algorithm {
            ClusterAlgorithm::ConnectedComponents => self.connected_components(),
        }
    }

    fn community_schema(&self) -> HashMap<String, SingleCommunity> {
        let mut by_label: BTreeMap<usize, SingleCommunity> = BTreeMap::new();
        for node_id in self.nodes.keys() {
            let Some(label) = self.cluster_of(node_id) else {
                continue;
            };
            let community = by_label.entry(label).or_insert_with(|| SingleCommunity {
                level: 0,
                title: format!("Cluster {label}"),
                ..Default::default()
            });
            community.nodes.insert(node_id.clone());
            for (a, b) in self.get_node_edges(node_id) {
                community.edges.insert(canonical(&a, &b));
            }
        }

        by_label
            .into_iter()
            .map(|(label, mut community)| {
                community.occurrence = community_occurrence(&community);
                (label.to_string(), community)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn chain_with_isolated() -> InMemoryGraphStorage {
        let mut g = InMemoryGraphStorage::new("test");
        for id in ["A", "B", "C", "D"] {
            g.upsert_node(id, props(&[("name", id)]));
        }
        g.upsert_edge("A", "B", props(&[("w", "1")]));
        g.upsert_edge("C", "B", props(&[("w", "2")]));
        g
    }

    /// Node sets of all communities, sorted for comparison.
    fn partition(g: &InMemoryGraphStorage) -> Vec<BTreeSet<String>> {
        let mut sets: Vec<BTreeSet<String>> =
            g.community_schema().into_values().map(|c| c.nodes).collect();
        sets.sort();
        sets
    }

    #[test]
    fn test_edge_lookup_is_symmetric() {
        let mut g = InMemoryGraphStorage::new("test");
        let p = props(&[("relation", "knows")]);
        g.upsert_edge("x", "y", p.clone());
        assert!(g.has_edge("x", "y"));
        assert!(g.has_edge("y", "x"));
        assert_eq!(g.get_edge("x", "y"), Some(p.clone()));
        assert_eq!(g.get_edge("y", "x"), Some(p));
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn test_edge_reupsert_replaces_properties() {
        let mut g = InMemoryGraphStorage::new("test");
        g.upsert_edge("x", "y", props(&[("a", "1"), ("b", "2")]));
        g.upsert_edge("y", "x", props(&[("c", "3")]));
        assert_eq!(g.get_edge("x", "y"), Some(props(&[("c", "3")])));
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.node_degree("x"), 1);
    }

    #[test]
    fn test_edge_creates_missing_endpoints() {
        let mut g = InMemoryGraphStorage::new("test");
        g.upsert_edge("p", "q", Properties::new());
        assert!(g.has_node("p"));
        assert!(g.has_node("q"));
        assert_eq!(g.get_node("p"), Some(Properties::new()));
    }

    #[test]
    fn test_degrees() {
        let g = chain_with_isolated();
        assert_eq!(g.node_degree("A"), 1);
        assert_eq!(g.node_degree("B"), 2);
        assert_eq!(g.node_degree("D"), 0);
        assert_eq!(g.node_degree("missing"), 0);
        assert_eq!(g.edge_degree("A", "B"), 3);
    }

    #[test]
    fn test_node_edges_sorted_pairs() {
        let g = chain_with_isolated();
        assert_eq!(
            g.get_node_edges("B"),
            vec![
                ("B".to_string(), "A".to_string()),
                ("B".to_string(), "C".to_string())
            ]
        );
        assert!(g.get_node_edges("D").is_empty());
    }

    #[test]
    fn test_no_labels_before_clustering() {
        let g = chain_with_isolated();
        assert!(g.cluster_of("A").is_none());
        assert!(g.community_schema().is_empty());
    }

    #[test]
    fn test_clustering_chain_and_isolated() {
        let mut g = chain_with_isolated();
        g.clustering(ClusterAlgorithm::ConnectedComponents);

        let schema = g.community_schema();
        assert_eq!(schema.len(), 2);

        let abc = schema.values().find(|c| c.nodes.contains("A")).unwrap();
        let expected: BTreeSet<String> = ["A", "B", "C"].iter().map(|s| s.to_string()).collect();
        assert_eq!(abc.nodes, expected);
        assert_eq!(abc.edges.len(), 2);
        assert!(abc.edges.contains(&("A".to_string(), "B".to_string())));
        assert!(abc.edges.contains(&("B".to_string(), "C".to_string())));

        let d = schema.values().find(|c| c.nodes.contains("D")).unwrap();
        assert_eq!(d.nodes.len(), 1);
        assert!(d.edges.is_empty());
        assert_eq!(d.occurrence, 0.0);
        assert_eq!(abc.occurrence, 0.0);
    }

    #[test]
    fn test_labels_follow_sorted_ids() {
        let mut g = chain_with_isolated();
        g.clustering(ClusterAlgorithm::ConnectedComponents);
        assert_eq!(g.cluster_of("A"), Some(0));
        assert_eq!(g.cluster_of("C"), Some(0));
        assert_eq!(g.cluster_of("D"), Some(1));
        assert_eq!(g.community_schema()["1"].title, "Cluster 1");
    }

    #[test]
    fn test_every_node_labeled_exactly_once() {
        let mut g = InMemoryGraphStorage::new("test");
        for (a, b) in [("n1", "n2"), ("n3", "n4"), ("n4", "n5"), ("n2", "n6")] {
            g.upsert_edge(a, b, Properties::new());
        }
        g.upsert_node("n7", Properties::new());
        g.clustering(ClusterAlgorithm::ConnectedComponents);

        let sets = partition(&g);
        let total: usize = sets.iter().map(BTreeSet::len).sum();
        let union: BTreeSet<String> = sets.iter().flatten().cloned().collect();
        assert_eq!(total, g.node_count());
        assert_eq!(union.len(), g.node_count());
        assert_eq!(sets.len(), 3);
    }

    #[test]
    fn test_clustering_twice_same_partition() {
        let mut g = chain_with_isolated();
        g.clustering(ClusterAlgorithm::ConnectedComponents);
        let first = partition(&g);
        g.clustering(ClusterAlgorithm::ConnectedComponents);
        assert_eq!(partition(&g), first);
    }

    #[test]
    fn test_reupsert_node_clears_label() {
        let mut g = chain_with_isolated();
        g.clustering(ClusterAlgorithm::ConnectedComponents);
        g.upsert_node("D", props(&[("name", "D")]));
        assert!(g.cluster_of("D").is_none());
        assert!(g.get_node("A").unwrap().contains_key(CLUSTERS_KEY));
    }

    #[test]
    fn test_batch_upserts() {
        let mut g = InMemoryGraphStorage::new("test");
        g.upsert_nodes_batch(vec![
            ("a".to_string(), props(&[("k", "1")])),
            ("a".to_string(), props(&[("k", "2")])),
        ]);
        g.upsert_edges_batch(vec![("a".to_string(), "b".to_string(), Properties::new())]);
        assert_eq!(g.get_node("a").unwrap()["k"], "2");
        assert!(g.has_edge("b", "a"));
    }

    #[test]
    fn test_algorithm_parse() {
        assert_eq!(
            "connected_components".parse::<ClusterAlgorithm>().unwrap(),
            ClusterAlgorithm::ConnectedComponents
        );
        assert!(matches!(
            "leiden".parse::<ClusterAlgorithm>(),
            Err(RagError::Configuration(_))
        ));
    }
}
