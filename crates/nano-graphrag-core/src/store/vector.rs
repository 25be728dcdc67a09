//! Brute-force vector index over embedded record content.
//!
//! Every query scores all stored vectors. Scores are cosine similarity or,
//! for [`Metric::L2`], `1 / (1 + euclidean distance)` so that higher is
//! always better. Results scoring below `query_better_than_threshold` are
//! dropped; a threshold `<= 0` disables the cut.
//!
//! With [`StorageBackend::File`] the index is a JSON snapshot
//! `{dim, metric, records}` that is loaded on construction and rewritten by
//! [`VectorIndex::save`] (or on every upsert when `auto_save` is set).

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::VectorStorage;
use crate::embedding::{cosine_similarity, l2_distance, EmbeddingProvider};
use crate::error::{RagError, Result};
use crate::models::Properties;

/// Default snapshot file name, relative to the working directory.
pub const DEFAULT_STORAGE_FILE: &str = "nano-vectordb.json";

/// Record field that gets embedded.
const CONTENT_FIELD: &str = "content";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    L2,
}

impl Metric {
    fn score(self, query: &[f32], stored: &[f32]) -> f32 {
        match self {
            Metric::Cosine => cosine_similarity(query, stored),
            Metric::L2 => 1.0 / (1.0 + l2_distance(query, stored)),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Cosine => f.write_str("cosine"),
            Metric::L2 => f.write_str("l2"),
        }
    }
}

impl FromStr for Metric {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(Metric::Cosine),
            "l2" | "euclidean" => Ok(Metric::L2),
            other => Err(RagError::Configuration(format!(
                "unknown vector metric '{other}'. Use cosine or l2."
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
}

impl FromStr for StorageBackend {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "file" => Ok(StorageBackend::File),
            other => Err(RagError::Configuration(format!(
                "unknown vector storage backend '{other}'. Use memory or file."
            ))),
        }
    }
}

/// Options for a [`VectorIndex`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorIndexConfig {
    pub metric: Metric,
    pub query_better_than_threshold: f32,
    pub storage_backend: StorageBackend,
    pub storage_file: PathBuf,
    pub auto_save: bool,
    /// Record fields copied into each match's metadata.
    pub meta_fields: Vec<String>,
}

impl Default for VectorIndexConfig {
    fn default() -> Self {
        Self {
            metric: Metric::Cosine,
            query_better_than_threshold: 0.2,
            storage_backend: StorageBackend::Memory,
            storage_file: PathBuf::from(DEFAULT_STORAGE_FILE),
            auto_save: false,
            meta_fields: Vec::new(),
        }
    }
}

/// One query hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    pub id: String,
    pub score: f32,
    pub metadata: Properties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VectorRecord {
    id: String,
    embedding: Vec<f32>,
    metadata: Properties,
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    dim: usize,
    metric: Metric,
    records: Vec<VectorRecord>,
}

pub struct VectorIndex {
    namespace: String,
    config: VectorIndexConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    /// 0 until the first embedding is stored, unless the provider
    /// reports its dimension up front.
    dim: usize,
    records: HashMap<String, VectorRecord>,
}

impl fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorIndex")
            .field("namespace", &self.namespace)
            .field("config", &self.config)
            .field("embedder", &self.embedder.model_name())
            .field("dim", &self.dim)
            .field("records", &self.records.len())
            .finish()
    }
}

impl VectorIndex {
    /// Create an index. With the `File` backend an existing snapshot at
    /// `config.storage_file` is loaded.
    ///
    /// # Errors
    ///
    /// [`RagError::DimensionMismatch`] if the snapshot was built with a
    /// different dimension than the provider reports; I/O and parse errors
    /// from reading the snapshot.
    pub fn new(
        namespace: impl Into<String>,
        config: VectorIndexConfig,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let mut index = Self {
            namespace: namespace.into(),
            dim: embedder.dims(),
            config,
            embedder,
            records: HashMap::new(),
        };
        if index.config.storage_backend == StorageBackend::File
            && index.config.storage_file.exists()
        {
            index.load()?;
        }
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index dimension, or 0 if not sized yet.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn config(&self) -> &VectorIndexConfig {
        &self.config
    }

    pub fn storage_file(&self) -> &Path {
        &self.config.storage_file
    }

    /// Write the snapshot. A no-op for the `Memory` backend.
    pub fn save(&self) -> Result<()> {
        if self.config.storage_backend != StorageBackend::File {
            return Ok(());
        }
        let mut records: Vec<VectorRecord> = self.records.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        let snapshot = Snapshot {
            dim: self.dim,
            metric: self.config.metric,
            records,
        };
        let path = &self.config.storage_file;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string(&snapshot)?)?;
        debug!(namespace = %self.namespace, path = %path.display(), records = self.records.len(), "vector snapshot saved");
        Ok(())
    }

    fn load(&mut self) -> Result<()> {
        let path = &self.config.storage_file;
        let snapshot: Snapshot = serde_json::from_str(&fs::read_to_string(path)?)?;
        if self.dim != 0 && snapshot.dim != 0 && snapshot.dim != self.dim {
            return Err(RagError::DimensionMismatch {
                expected: self.dim,
                actual: snapshot.dim,
            });
        }
        if snapshot.metric != self.config.metric {
            warn!(
                namespace = %self.namespace,
                stored = %snapshot.metric,
                configured = %self.config.metric,
                "snapshot metric differs from configuration; scoring with the configured metric"
            );
        }
        if self.dim == 0 {
            self.dim = snapshot.dim;
        }
        info!(namespace = %self.namespace, path = %path.display(), records = snapshot.records.len(), "vector snapshot loaded");
        self.records = snapshot
            .records
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect();
        Ok(())
    }

    /// Dimension used for zero-vector fallbacks.
    fn fallback_dim(&self) -> usize {
        if self.dim > 0 {
            self.dim
        } else {
            self.embedder.dims()
        }
    }
}

impl VectorStorage for VectorIndex {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn upsert(&mut self, data: HashMap<String, Properties>) -> Result<()> {
        if data.is_empty() {
            warn!(namespace = %self.namespace, "vector upsert with no records");
            return Ok(());
        }

        let mut ids: Vec<&String> = data.keys().collect();
        ids.sort();
        let contents: Vec<String> = ids
            .iter()
            .map(|id| data[*id].get(CONTENT_FIELD).cloned().unwrap_or_default())
            .collect();

        let mut embeddings = self.embedder.embed(&contents)?;
        if embeddings.len() != contents.len() {
            warn!(
                namespace = %self.namespace,
                expected = contents.len(),
                actual = embeddings.len(),
                "embedding count mismatch; storing zero vectors"
            );
            embeddings = vec![vec![0.0; self.fallback_dim()]; contents.len()];
        }

        // Validate the whole batch before touching the index.
        let mut dim = self.dim;
        for embedding in &embeddings {
            if dim == 0 {
                dim = embedding.len();
            } else if embedding.len() != dim {
                return Err(RagError::DimensionMismatch {
                    expected: dim,
                    actual: embedding.len(),
                });
            }
        }
        self.dim = dim;

        for (id, embedding) in ids.into_iter().zip(embeddings) {
            let record = &data[id];
            let metadata: Properties = self
                .config
                .meta_fields
                .iter()
                .filter_map(|field| record.get(field).map(|v| (field.clone(), v.clone())))
                .collect();
            self.records.insert(
                id.clone(),
                VectorRecord {
                    id: id.clone(),
                    embedding,
                    metadata,
                },
            );
        }
        debug!(namespace = %self.namespace, count = data.len(), total = self.records.len(), "vector upsert");

        if self.config.auto_save {
            self.save()?;
        }
        Ok(())
    }

    fn query(&self, query: &str, top_k: usize) -> Result<Vec<VectorMatch>> {
        if self.dim == 0 || self.records.is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = self
            .embedder
            .embed(&[query.to_string()])?
            .into_iter()
            .next()
            .unwrap_or_else(|| vec![0.0; self.dim]);
        if query_vec.len() != self.dim {
            return Err(RagError::DimensionMismatch {
                expected: self.dim,
                actual: query_vec.len(),
            });
        }

        let threshold = self.config.query_better_than_threshold;
        let mut matches: Vec<VectorMatch> = self
            .records
            .values()
            .map(|r| VectorMatch {
                id: r.id.clone(),
                score: self.config.metric.score(&query_vec, &r.embedding),
                metadata: r.metadata.clone(),
            })
            .filter(|m| threshold <= 0.0 || m.score >= threshold)
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        matches.truncate(top_k);
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Embeds text as counts of the letters `a`, `b`, `c`.
    struct LetterEmbedder {
        dims: usize,
    }

    impl EmbeddingProvider for LetterEmbedder {
        fn model_name(&self) -> &str {
            "letters"
        }
        fn dims(&self) -> usize {
            self.dims
        }
        fn max_token_size(&self) -> usize {
            1024
        }
        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    ['a', 'b', 'c']
                        .iter()
                        .map(|l| t.chars().filter(|c| c == l).count() as f32)
                        .collect()
                })
                .collect())
        }
    }

    /// Drops the last embedding of every batch.
    struct ShortEmbedder;

    impl EmbeddingProvider for ShortEmbedder {
        fn model_name(&self) -> &str {
            "short"
        }
        fn dims(&self) -> usize {
            4
        }
        fn max_token_size(&self) -> usize {
            1024
        }
        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0; 4]; texts.len().saturating_sub(1)])
        }
    }

    /// Vector length equals the text length.
    struct RaggedEmbedder;

    impl EmbeddingProvider for RaggedEmbedder {
        fn model_name(&self) -> &str {
            "ragged"
        }
        fn dims(&self) -> usize {
            0
        }
        fn max_token_size(&self) -> usize {
            1024
        }
        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![1.0; t.len()]).collect())
        }
    }

    fn record(content: &str) -> Properties {
        Properties::from([(CONTENT_FIELD.to_string(), content.to_string())])
    }

    fn records(pairs: &[(&str, &str)]) -> HashMap<String, Properties> {
        pairs
            .iter()
            .map(|(id, content)| (id.to_string(), record(content)))
            .collect()
    }

    fn index(config: VectorIndexConfig) -> VectorIndex {
        VectorIndex::new("chunks", config, Arc::new(LetterEmbedder { dims: 3 })).unwrap()
    }

    #[test]
    fn test_query_orders_by_score() {
        let mut vdb = index(VectorIndexConfig::default());
        vdb.upsert(records(&[("x", "aaa"), ("y", "aab"), ("z", "ccc")])).unwrap();

        let hits = vdb.query("a", 10).unwrap();
        let ids: Vec<&str> = hits.iter().map(|m| m.id.as_str()).collect();
        // "ccc" is orthogonal to "a" and falls under the 0.2 threshold
        assert_eq!(ids, vec!["x", "y"]);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn test_threshold_disabled_keeps_everything() {
        let config = VectorIndexConfig {
            query_better_than_threshold: 0.0,
            ..Default::default()
        };
        let mut vdb = index(config);
        vdb.upsert(records(&[("x", "aaa"), ("z", "ccc")])).unwrap();
        let hits = vdb.query("a", 10).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].id, "z");
        assert_eq!(hits[1].score, 0.0);
    }

    #[test]
    fn test_ties_break_by_id() {
        let mut vdb = index(VectorIndexConfig::default());
        vdb.upsert(records(&[("b", "ab"), ("a", "ab"), ("c", "ab")])).unwrap();
        let ids: Vec<String> = vdb.query("ab", 2).unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_l2_scores_inverse_distance() {
        let config = VectorIndexConfig {
            metric: Metric::L2,
            query_better_than_threshold: 0.0,
            ..Default::default()
        };
        let mut vdb = index(config);
        vdb.upsert(records(&[("same", "a"), ("far", "aaaa")])).unwrap();
        let hits = vdb.query("a", 5).unwrap();
        assert_eq!(hits[0].id, "same");
        assert!((hits[0].score - 1.0).abs() < 1e-6);
        assert!((hits[1].score - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let vdb = index(VectorIndexConfig::default());
        assert!(vdb.query("anything", 5).unwrap().is_empty());
    }

    #[test]
    fn test_upsert_replaces_record() {
        let config = VectorIndexConfig {
            query_better_than_threshold: 0.0,
            meta_fields: vec!["doc".to_string()],
            ..Default::default()
        };
        let mut vdb = index(config);
        let mut first = record("aaa");
        first.insert("doc".into(), "d1".into());
        vdb.upsert(HashMap::from([("k".to_string(), first)])).unwrap();
        let mut second = record("ccc");
        second.insert("doc".into(), "d2".into());
        vdb.upsert(HashMap::from([("k".to_string(), second)])).unwrap();

        assert_eq!(vdb.len(), 1);
        let hit = &vdb.query("c", 1).unwrap()[0];
        assert!((hit.score - 1.0).abs() < 1e-6);
        assert_eq!(hit.metadata.get("doc").map(String::as_str), Some("d2"));
        assert!(!hit.metadata.contains_key(CONTENT_FIELD));
    }

    #[test]
    fn test_missing_content_embeds_empty_string() {
        let config = VectorIndexConfig {
            query_better_than_threshold: 0.0,
            ..Default::default()
        };
        let mut vdb = index(config);
        vdb.upsert(HashMap::from([("bare".to_string(), Properties::new())]))
            .unwrap();
        let hits = vdb.query("a", 1).unwrap();
        assert_eq!(hits[0].id, "bare");
        assert_eq!(hits[0].score, 0.0);
    }

    #[test]
    fn test_count_mismatch_stores_zero_vectors() {
        let config = VectorIndexConfig {
            query_better_than_threshold: 0.0,
            ..Default::default()
        };
        let mut vdb = VectorIndex::new("chunks", config, Arc::new(ShortEmbedder)).unwrap();
        vdb.upsert(records(&[("x", "one"), ("y", "two")])).unwrap();
        assert_eq!(vdb.len(), 2);
        assert_eq!(vdb.dim(), 4);
        let hits = vdb.query("q", 5);
        // the query batch of one comes back empty and falls back to zeros
        assert!(hits.unwrap().iter().all(|m| m.score == 0.0));
    }

    #[test]
    fn test_lazy_dimension_and_mismatch() {
        let mut vdb =
            VectorIndex::new("chunks", VectorIndexConfig::default(), Arc::new(RaggedEmbedder))
                .unwrap();
        assert_eq!(vdb.dim(), 0);
        vdb.upsert(records(&[("x", "abcd")])).unwrap();
        assert_eq!(vdb.dim(), 4);

        let err = vdb.upsert(records(&[("y", "ab")])).unwrap_err();
        assert!(matches!(
            err,
            RagError::DimensionMismatch {
                expected: 4,
                actual: 2
            }
        ));
        assert_eq!(vdb.len(), 1);
    }

    #[test]
    fn test_mixed_batch_rejected_atomically() {
        let mut vdb =
            VectorIndex::new("chunks", VectorIndexConfig::default(), Arc::new(RaggedEmbedder))
                .unwrap();
        let err = vdb.upsert(records(&[("a", "xyz"), ("b", "xy")])).unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { .. }));
        assert!(vdb.is_empty());
        assert_eq!(vdb.dim(), 0);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = VectorIndexConfig {
            storage_backend: StorageBackend::File,
            storage_file: dir.path().join("vdb").join(DEFAULT_STORAGE_FILE),
            meta_fields: vec!["doc".to_string()],
            ..Default::default()
        };
        let mut first = index(config.clone());
        let mut rec = record("aab");
        rec.insert("doc".into(), "d1".into());
        first
            .upsert(HashMap::from([("k".to_string(), rec)]))
            .unwrap();
        assert!(!config.storage_file.exists());
        first.save().unwrap();
        assert!(config.storage_file.exists());

        let second = index(config);
        assert_eq!(second.len(), 1);
        assert_eq!(second.dim(), 3);
        let hits = second.query("aab", 1).unwrap();
        assert_eq!(hits[0].id, "k");
        assert_eq!(hits[0].metadata["doc"], "d1");
    }

    #[test]
    fn test_auto_save_writes_on_upsert() {
        let dir = tempfile::tempdir().unwrap();
        let config = VectorIndexConfig {
            storage_backend: StorageBackend::File,
            storage_file: dir.path().join(DEFAULT_STORAGE_FILE),
            auto_save: true,
            ..Default::default()
        };
        let mut vdb = index(config.clone());
        vdb.upsert(records(&[("x", "abc")])).unwrap();
        let raw = fs::read_to_string(&config.storage_file).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["dim"], 3);
        assert_eq!(json["metric"], "cosine");
        assert_eq!(json["records"][0]["id"], "x");
    }

    #[test]
    fn test_snapshot_dimension_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let config = VectorIndexConfig {
            storage_backend: StorageBackend::File,
            storage_file: dir.path().join(DEFAULT_STORAGE_FILE),
            ..Default::default()
        };
        let mut vdb = index(config.clone());
        vdb.upsert(records(&[("x", "abc")])).unwrap();
        vdb.save().unwrap();

        let err = VectorIndex::new("chunks", config, Arc::new(LetterEmbedder { dims: 5 }))
            .unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { expected: 5, actual: 3 }));
    }

    #[test]
    fn test_memory_backend_never_writes() {
        let dir = tempfile::tempdir().unwrap();
        let config = VectorIndexConfig {
            storage_file: dir.path().join(DEFAULT_STORAGE_FILE),
            auto_save: true,
            ..Default::default()
        };
        let mut vdb = index(config.clone());
        vdb.upsert(records(&[("x", "abc")])).unwrap();
        vdb.save().unwrap();
        assert!(!config.storage_file.exists());
    }

    #[test]
    fn test_parse_options() {
        assert_eq!("L2".parse::<Metric>().unwrap(), Metric::L2);
        assert_eq!("file".parse::<StorageBackend>().unwrap(), StorageBackend::File);
        assert!("sqlite".parse::<StorageBackend>().is_err());
    }
}
