//! Core data models shared by the stores and the orchestrator.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::error::RagError;

/// Property map attached to graph nodes, graph edges and vector records.
pub type Properties = HashMap<String, String>;

/// Opaque, content-derived identifier.
///
/// Two records with identical content always receive the same id, which is
/// what makes re-insertion an overwrite rather than a duplicate. The textual
/// form is stable but not part of any contract; treat it as a key only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Id for a full document body.
    pub fn for_document(content: &str) -> Self {
        Self::hashed("doc-", content)
    }

    /// Id for a chunk. Derived from the chunk text only, so identical
    /// windows from different documents collapse onto one record.
    pub fn for_chunk(content: &str) -> Self {
        Self::hashed("chunk-", content)
    }

    fn hashed(prefix: &str, content: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        Self(format!("{}{:x}", prefix, hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ContentId> for String {
    fn from(id: ContentId) -> Self {
        id.0
    }
}

/// A full source document as stored in the `full_docs` namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: ContentId,
    pub content: String,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            id: ContentId::for_document(&content),
            content,
        }
    }
}

/// One token window of a document, with its reconstructed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Number of tokens in the window (not in `content`, which may be
    /// approximate for word-level tokenizers).
    pub tokens: usize,
    pub content: String,
    pub full_doc_id: ContentId,
    /// 0-based window position within `full_doc_id`.
    pub chunk_order_index: usize,
}

/// A cluster of graph nodes as derived by
/// [`GraphStorage::community_schema`](crate::store::GraphStorage::community_schema).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SingleCommunity {
    pub level: u32,
    pub title: String,
    /// Canonical `(min, max)` pairs, sorted and deduplicated.
    pub edges: BTreeSet<(String, String)>,
    pub nodes: BTreeSet<String>,
    /// Chunks associated with this community. Nothing populates this yet.
    pub chunk_ids: Vec<String>,
    pub occurrence: f64,
    pub sub_communities: Vec<String>,
}

/// A community plus its generated report, stored in `community_reports`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommunityReport {
    #[serde(flatten)]
    pub community: SingleCommunity,
    pub report_string: String,
    pub report_json: HashMap<String, String>,
}

/// Retrieval strategy requested by a [`QueryParam`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// Vector search over raw chunks. The only implemented mode.
    Naive,
    Local,
    Global,
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryMode::Naive => "naive",
            QueryMode::Local => "local",
            QueryMode::Global => "global",
        };
        write!(f, "{s}")
    }
}

impl FromStr for QueryMode {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "naive" => Ok(QueryMode::Naive),
            "local" => Ok(QueryMode::Local),
            "global" => Ok(QueryMode::Global),
            other => Err(RagError::Configuration(format!(
                "unknown query mode '{other}'. Use naive, local, or global."
            ))),
        }
    }
}

/// Per-query knobs. Only the naive fields are consulted today; the local
/// and global budgets are carried for the graph-based modes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryParam {
    pub mode: QueryMode,
    pub only_need_context: bool,
    pub response_type: String,
    pub level: u32,
    pub top_k: usize,

    pub naive_max_token_for_text_unit: usize,

    pub local_max_token_for_text_unit: usize,
    pub local_max_token_for_local_context: usize,
    pub local_max_token_for_community_report: usize,
    pub local_community_single_one: bool,

    pub global_min_community_rating: f64,
    pub global_max_consider_community: usize,
    pub global_max_token_for_community_report: usize,
}

impl Default for QueryParam {
    fn default() -> Self {
        Self {
            mode: QueryMode::Global,
            only_need_context: false,
            response_type: "Multiple Paragraphs".to_string(),
            level: 2,
            top_k: 20,
            naive_max_token_for_text_unit: 12_000,
            local_max_token_for_text_unit: 4_000,
            local_max_token_for_local_context: 4_800,
            local_max_token_for_community_report: 3_200,
            local_community_single_one: false,
            global_min_community_rating: 0.0,
            global_max_consider_community: 512,
            global_max_token_for_community_report: 16_384,
        }
    }
}
