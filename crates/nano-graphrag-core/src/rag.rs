//! The [`GraphRag`] orchestrator.
//!
//! Owns one instance of every store and drives the two public operations:
//!
//! - [`insert`](GraphRag::insert): documents → chunks → chunk vector index
//!   (when naive RAG is enabled) → `text_chunks` → `full_docs`.
//! - [`query`](GraphRag::query): dispatch on [`QueryMode`]. Only
//!   [`QueryMode::Naive`] has a retrieval path; the graph-based modes
//!   answer [`QueryResponse::Unsupported`].
//!
//! Everything runs on the caller's thread. Embedding and generation calls
//! block until the provider answers or times out.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::chunk::{get_chunks, stride};
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::llm::LlmProvider;
use crate::models::{
    CommunityReport, Document, Properties, QueryMode, QueryParam, TextChunk,
};
use crate::prompt::{naive_rag_response, CHUNK_SEPARATOR, FAIL_RESPONSE, UNSUPPORTED_MODE_RESPONSE};
use crate::store::{
    InMemoryGraphStorage, InMemoryKvStorage, KvStorage, VectorIndex, VectorIndexConfig,
    VectorStorage,
};
use crate::tokenizer::Tokenizer;

pub const FULL_DOCS_NAMESPACE: &str = "full_docs";
pub const TEXT_CHUNKS_NAMESPACE: &str = "text_chunks";
pub const COMMUNITY_REPORTS_NAMESPACE: &str = "community_reports";
pub const GRAPH_NAMESPACE: &str = "chunk_entity_relation";
pub const CHUNKS_VDB_NAMESPACE: &str = "chunks";
pub const ENTITIES_VDB_NAMESPACE: &str = "entities";

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphRagConfig {
    /// Root for persisted indices. Created on construction.
    pub working_dir: PathBuf,
    pub chunk_token_size: usize,
    pub chunk_overlap_token_size: usize,
    /// Index raw chunks for [`QueryMode::Naive`].
    pub enable_naive_rag: bool,
    /// Create the entity index used by local queries.
    pub enable_local: bool,
    /// Shared by every vector index. A relative `storage_file` is resolved
    /// against `working_dir` and prefixed with the index namespace.
    pub vector: VectorIndexConfig,
}

impl Default for GraphRagConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("./nano_graphrag_cache"),
            chunk_token_size: 1200,
            chunk_overlap_token_size: 100,
            enable_naive_rag: true,
            enable_local: false,
            vector: VectorIndexConfig::default(),
        }
    }
}

/// Counts from one [`GraphRag::insert`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertSummary {
    /// Distinct documents in the call.
    pub documents: usize,
    /// Distinct chunks derived from them.
    pub chunks: usize,
}

/// Outcome of [`GraphRag::query`].
///
/// The degenerate variants are values rather than errors so callers can
/// tell them apart from transport failures, which surface as `Err`.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResponse {
    /// Text produced by the generation provider.
    Answer(String),
    /// Assembled retrieval context, returned when it was asked for, when
    /// there is no generation provider, or when generation came back empty.
    Context(String),
    /// Retrieval found nothing to answer from.
    NoContext,
    /// The requested mode has no retrieval path.
    Unsupported { mode: QueryMode },
}

impl QueryResponse {
    /// User-facing text, with sentinels for the degenerate variants.
    pub fn into_text(self) -> String {
        match self {
            QueryResponse::Answer(text) | QueryResponse::Context(text) => text,
            QueryResponse::NoContext => FAIL_RESPONSE.to_string(),
            QueryResponse::Unsupported { .. } => UNSUPPORTED_MODE_RESPONSE.to_string(),
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(
            self,
            QueryResponse::NoContext | QueryResponse::Unsupported { .. }
        )
    }
}

impl fmt::Display for QueryResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResponse::Answer(text) | QueryResponse::Context(text) => f.write_str(text),
            QueryResponse::NoContext => f.write_str(FAIL_RESPONSE),
            QueryResponse::Unsupported { .. } => f.write_str(UNSUPPORTED_MODE_RESPONSE),
        }
    }
}

pub struct GraphRag {
    config: GraphRagConfig,
    tokenizer: Box<dyn Tokenizer>,
    llm: Option<Box<dyn LlmProvider>>,

    full_docs: InMemoryKvStorage<Document>,
    text_chunks: InMemoryKvStorage<TextChunk>,
    community_reports: InMemoryKvStorage<CommunityReport>,
    graph: InMemoryGraphStorage,
    chunks_vdb: Option<VectorIndex>,
    entities_vdb: Option<VectorIndex>,
}

impl fmt::Debug for GraphRag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphRag")
            .field("config", &self.config)
            .field("tokenizer", &self.tokenizer.kind())
            .field("llm", &self.llm.as_ref().map(|l| l.model_name().to_string()))
            .field("full_docs", &self.full_docs.len())
            .field("text_chunks", &self.text_chunks.len())
            .field("chunks_vdb", &self.chunks_vdb)
            .field("entities_vdb", &self.entities_vdb)
            .finish()
    }
}

/// Snapshot path for one vector index.
fn index_file(working_dir: &Path, namespace: &str, storage_file: &Path) -> PathBuf {
    let base = if storage_file.is_absolute() {
        storage_file.to_path_buf()
    } else {
        working_dir.join(storage_file)
    };
    let name = base
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| crate::store::vector::DEFAULT_STORAGE_FILE.to_string());
    base.with_file_name(format!("{namespace}_{name}"))
}

impl GraphRag {
    /// Build an orchestrator.
    ///
    /// Without an embedding provider no vector index is created and naive
    /// queries answer [`QueryResponse::NoContext`].
    ///
    /// # Errors
    ///
    /// [`RagError::Configuration`](crate::RagError::Configuration) for an
    /// invalid chunk stride; I/O errors creating the working directory or
    /// loading a vector snapshot.
    pub fn new(
        config: GraphRagConfig,
        tokenizer: Box<dyn Tokenizer>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
    ) -> Result<Self> {
        stride(config.chunk_token_size, config.chunk_overlap_token_size)?;
        fs::create_dir_all(&config.working_dir)?;

        let make_index = |namespace: &str, embedder: &Arc<dyn EmbeddingProvider>| {
            let vector_config = VectorIndexConfig {
                storage_file: index_file(
                    &config.working_dir,
                    namespace,
                    &config.vector.storage_file,
                ),
                ..config.vector.clone()
            };
            VectorIndex::new(namespace, vector_config, Arc::clone(embedder))
        };

        let (chunks_vdb, entities_vdb) = match &embedder {
            Some(embedder) => {
                let chunks = if config.enable_naive_rag {
                    Some(make_index(CHUNKS_VDB_NAMESPACE, embedder)?)
                } else {
                    None
                };
                let entities = if config.enable_local {
                    Some(make_index(ENTITIES_VDB_NAMESPACE, embedder)?)
                } else {
                    None
                };
                (chunks, entities)
            }
            None => {
                if config.enable_naive_rag || config.enable_local {
                    warn!("no embedding provider; vector indices disabled");
                }
                (None, None)
            }
        };

        info!(
            working_dir = %config.working_dir.display(),
            tokenizer = %tokenizer.kind(),
            embedder = embedder.as_ref().map(|e| e.model_name()).unwrap_or("none"),
            naive = chunks_vdb.is_some(),
            local = entities_vdb.is_some(),
            "graph rag initialized"
        );

        Ok(Self {
            config,
            tokenizer,
            llm: None,
            full_docs: InMemoryKvStorage::new(FULL_DOCS_NAMESPACE),
            text_chunks: InMemoryKvStorage::new(TEXT_CHUNKS_NAMESPACE),
            community_reports: InMemoryKvStorage::new(COMMUNITY_REPORTS_NAMESPACE),
            graph: InMemoryGraphStorage::new(GRAPH_NAMESPACE),
            chunks_vdb,
            entities_vdb,
        })
    }

    /// Attach a generation provider.
    pub fn with_llm(mut self, llm: Box<dyn LlmProvider>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn set_llm(&mut self, llm: Option<Box<dyn LlmProvider>>) {
        self.llm = llm;
    }

    pub fn set_tokenizer(&mut self, tokenizer: Box<dyn Tokenizer>) {
        self.tokenizer = tokenizer;
    }

    /// Change chunk parameters for subsequent inserts.
    pub fn set_chunk_params(&mut self, chunk_token_size: usize, overlap_token_size: usize) -> Result<()> {
        stride(chunk_token_size, overlap_token_size)?;
        self.config.chunk_token_size = chunk_token_size;
        self.config.chunk_overlap_token_size = overlap_token_size;
        Ok(())
    }

    pub fn config(&self) -> &GraphRagConfig {
        &self.config
    }

    pub fn full_docs(&self) -> &InMemoryKvStorage<Document> {
        &self.full_docs
    }

    pub fn text_chunks(&self) -> &InMemoryKvStorage<TextChunk> {
        &self.text_chunks
    }

    pub fn community_reports(&self) -> &InMemoryKvStorage<CommunityReport> {
        &self.community_reports
    }

    pub fn graph(&self) -> &InMemoryGraphStorage {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut InMemoryGraphStorage {
        &mut self.graph
    }

    pub fn chunks_vdb(&self) -> Option<&VectorIndex> {
        self.chunks_vdb.as_ref()
    }

    pub fn entities_vdb(&self) -> Option<&VectorIndex> {
        self.entities_vdb.as_ref()
    }

    /// Index documents.
    ///
    /// Documents are stored verbatim and identified by the hash of their
    /// exact content, so inserting the same text twice overwrites rather
    /// than duplicates. Chunks are always derived
    /// again, even for documents that are already stored.
    pub fn insert<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<InsertSummary> {
        let mut new_docs: Vec<Document> = Vec::with_capacity(documents.len());
        for text in documents {
            let doc = Document::new(text.as_ref());
            if !new_docs.iter().any(|d| d.id == doc.id) {
                new_docs.push(doc);
            }
        }
        if new_docs.is_empty() {
            warn!("insert called with no documents");
            return Ok(InsertSummary::default());
        }
        info!(documents = new_docs.len(), "inserting documents");

        let chunks = get_chunks(
            &new_docs,
            self.tokenizer.as_ref(),
            self.config.chunk_token_size,
            self.config.chunk_overlap_token_size,
        )?;
        info!(chunks = chunks.len(), "chunked documents");
        let summary = InsertSummary {
            documents: new_docs.len(),
            chunks: chunks.len(),
        };

        if let Some(vdb) = self.chunks_vdb.as_mut() {
            let records = chunks
                .iter()
                .map(|(id, chunk)| {
                    let props = Properties::from([
                        ("content".to_string(), chunk.content.clone()),
                        ("full_doc_id".to_string(), chunk.full_doc_id.to_string()),
                    ]);
                    (id.clone(), props)
                })
                .collect();
            vdb.upsert(records)?;
        }

        self.text_chunks.upsert(chunks);
        self.full_docs.upsert(
            new_docs
                .into_iter()
                .map(|d| (d.id.to_string(), d))
                .collect(),
        );
        Ok(summary)
    }

    /// Answer a question.
    ///
    /// # Errors
    ///
    /// Provider failures (embedding or generation) propagate unchanged.
    /// Empty retrieval and unsupported modes are `Ok` values.
    pub fn query(&self, query: &str, param: &QueryParam) -> Result<QueryResponse> {
        match param.mode {
            QueryMode::Naive => self.naive_query(query, param),
            mode => {
                debug!(%mode, "query mode has no retrieval path");
                Ok(QueryResponse::Unsupported { mode })
            }
        }
    }

    fn naive_query(&self, query: &str, param: &QueryParam) -> Result<QueryResponse> {
        let Some(vdb) = &self.chunks_vdb else {
            debug!("naive query without a chunk index");
            return Ok(QueryResponse::NoContext);
        };

        let matches = vdb.query(query, param.top_k)?;
        if matches.is_empty() {
            return Ok(QueryResponse::NoContext);
        }
        debug!(matches = matches.len(), "naive query retrieved chunks");

        let ids: Vec<String> = matches.into_iter().map(|m| m.id).collect();
        let chunks: Vec<TextChunk> = self.text_chunks.get_by_ids(&ids).into_iter().flatten().collect();
        // A reloaded index can hold ids whose chunk records were never loaded.
        if chunks.is_empty() {
            debug!(matches = ids.len(), "no retrieved id has a chunk record");
            return Ok(QueryResponse::NoContext);
        }
        let context = assemble_context(chunks.into_iter(), param.naive_max_token_for_text_unit);

        if param.only_need_context {
            return Ok(QueryResponse::Context(context));
        }
        let Some(llm) = &self.llm else {
            return Ok(QueryResponse::Context(context));
        };

        let system_prompt = naive_rag_response(&context, &param.response_type);
        let answer = llm.prompt(query, &system_prompt)?;
        if answer.is_empty() {
            debug!(model = llm.model_name(), "empty generation; returning context");
            Ok(QueryResponse::Context(context))
        } else {
            Ok(QueryResponse::Answer(answer))
        }
    }

    /// Write vector snapshots for file-backed indices.
    pub fn save(&self) -> Result<()> {
        for vdb in [&self.chunks_vdb, &self.entities_vdb].into_iter().flatten() {
            vdb.save()?;
        }
        Ok(())
    }
}

/// Join chunk texts in order until the next chunk would exceed
/// `max_tokens`. Chunks are never cut.
fn assemble_context(chunks: impl Iterator<Item = TextChunk>, max_tokens: usize) -> String {
    let mut total = 0usize;
    let mut context = String::new();
    for chunk in chunks {
        total += chunk.tokens;
        if total > max_tokens {
            break;
        }
        context.push_str(&chunk.content);
        context.push_str(CHUNK_SEPARATOR);
    }
    if context.ends_with(CHUNK_SEPARATOR) {
        context.truncate(context.len() - CHUNK_SEPARATOR.len());
    }
    debug!(tokens = total.min(max_tokens), chars = context.len(), "naive context assembled");
    context
}
