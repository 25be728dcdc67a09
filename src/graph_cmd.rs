//! `ngrag graph`: load an edge list, cluster it, print the communities.
//!
//! Input format, one entry per line:
//!
//! ```text
//! # comment
//! alice bob            edge between alice and bob
//! bob carol knows      edge with a description
//! dave                 isolated node
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};

use nano_graphrag_core::models::{Properties, SingleCommunity};
use nano_graphrag_core::store::{ClusterAlgorithm, GraphStorage, InMemoryGraphStorage};

/// Build a graph from edge-list text.
pub fn parse_edge_list(text: &str) -> Result<InMemoryGraphStorage> {
    let mut graph = InMemoryGraphStorage::new("chunk_entity_relation");
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some(node), None) => {
                if !graph.has_node(node) {
                    graph.upsert_node(node, Properties::new());
                }
            }
            (Some(source), Some(target)) => {
                if source == target {
                    bail!("line {}: self-loop on '{}'", line_no + 1, source);
                }
                let description = parts.collect::<Vec<_>>().join(" ");
                let mut props = Properties::new();
                if !description.is_empty() {
                    props.insert("description".to_string(), description);
                }
                graph.upsert_edge(source, target, props);
            }
            (None, _) => {}
        }
    }
    Ok(graph)
}

/// Communities ordered by numeric label.
pub fn cluster(graph: &mut InMemoryGraphStorage) -> Vec<(String, SingleCommunity)> {
    graph.clustering(ClusterAlgorithm::ConnectedComponents);
    let mut communities: Vec<(String, SingleCommunity)> =
        graph.community_schema().into_iter().collect();
    communities.sort_by_key(|(label, _)| label.parse::<usize>().unwrap_or(usize::MAX));
    communities
}

pub fn run_graph(path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut graph = parse_edge_list(&text)?;
    println!(
        "nodes: {}  edges: {}",
        graph.node_count(),
        graph.edge_count()
    );

    for (_, community) in cluster(&mut graph) {
        println!(
            "{} (level {}): {} nodes, {} edges",
            community.title,
            community.level,
            community.nodes.len(),
            community.edges.len()
        );
        let nodes: Vec<&str> = community.nodes.iter().map(String::as_str).collect();
        println!("    nodes: {}", nodes.join(", "));
        for (a, b) in &community.edges {
            println!("    {a} -- {b}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_edges_nodes_and_comments() {
        let graph = parse_edge_list("# people\nA B\nC B knows well\n\nD\n").unwrap();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(
            graph.get_edge("B", "C").unwrap().get("description").map(String::as_str),
            Some("knows well")
        );
    }

    #[test]
    fn test_lone_id_does_not_clobber_existing_node() {
        let graph = parse_edge_list("A B first\nA\n").unwrap();
        assert_eq!(graph.node_degree("A"), 1);
        assert!(graph.has_edge("A", "B"));
    }

    #[test]
    fn test_self_loop_rejected() {
        let err = parse_edge_list("A A\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_cluster_order() {
        let mut graph = parse_edge_list("A B\nB C\nD\n").unwrap();
        let communities = cluster(&mut graph);
        let titles: Vec<&str> = communities.iter().map(|(_, c)| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Cluster 0", "Cluster 1"]);
        assert_eq!(communities[0].1.nodes.len(), 3);
        assert_eq!(communities[0].1.edges.len(), 2);
        assert!(communities[1].1.edges.is_empty());
    }
}
