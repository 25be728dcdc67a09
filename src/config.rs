//! TOML configuration for the `ngrag` binary.
//!
//! Every section is optional. A missing file yields [`Config::default`],
//! so the binary works without a network using the defaults (`hash`
//! embeddings, no LLM).

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use nano_graphrag_core::models::{QueryMode, QueryParam};
use nano_graphrag_core::store::{Metric, StorageBackend, VectorIndexConfig};
use nano_graphrag_core::GraphRagConfig;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub chunking: ChunkingConfig,
    pub vector: VectorConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub rag: RagConfig,
    pub query: QueryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub working_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("./nano_graphrag_cache"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_token_size: usize,
    pub chunk_overlap_token_size: usize,
    pub tokenizer: String,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_token_size: 1200,
            chunk_overlap_token_size: 100,
            tokenizer: "tiktoken".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct VectorConfig {
    pub metric: String,
    pub query_better_than_threshold: f32,
    pub storage_backend: String,
    pub storage_file: Option<PathBuf>,
    pub auto_save: bool,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            metric: "cosine".to_string(),
            query_better_than_threshold: 0.2,
            storage_backend: "memory".to_string(),
            storage_file: None,
            auto_save: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub model: String,
    pub dims: usize,
    pub max_token_size: usize,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "hash".to_string(),
            model: "text-embedding-3-small".to_string(),
            dims: 256,
            max_token_size: 8192,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: "gpt-4.1".to_string(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RagConfig {
    pub enable_naive: bool,
    pub enable_local: bool,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            enable_naive: true,
            enable_local: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct QueryConfig {
    pub mode: String,
    pub top_k: usize,
    pub naive_max_token_for_text_unit: usize,
    pub response_type: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            mode: "naive".to_string(),
            top_k: 20,
            naive_max_token_for_text_unit: 12_000,
            response_type: "Multiple Paragraphs".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}

impl Config {
    /// Orchestrator settings derived from `[storage]`, `[chunking]`,
    /// `[vector]` and `[rag]`.
    pub fn graph_rag_config(&self) -> Result<GraphRagConfig> {
        let mut vector = VectorIndexConfig {
            metric: self.vector.metric.parse::<Metric>()?,
            query_better_than_threshold: self.vector.query_better_than_threshold,
            storage_backend: self.vector.storage_backend.parse::<StorageBackend>()?,
            auto_save: self.vector.auto_save,
            meta_fields: vec!["full_doc_id".to_string()],
            ..Default::default()
        };
        if let Some(file) = &self.vector.storage_file {
            vector.storage_file = file.clone();
        }
        Ok(GraphRagConfig {
            working_dir: self.storage.working_dir.clone(),
            chunk_token_size: self.chunking.chunk_token_size,
            chunk_overlap_token_size: self.chunking.chunk_overlap_token_size,
            enable_naive_rag: self.rag.enable_naive,
            enable_local: self.rag.enable_local,
            vector,
        })
    }

    /// Query defaults from `[query]`.
    pub fn query_param(&self) -> Result<QueryParam> {
        Ok(QueryParam {
            mode: self.query.mode.parse::<QueryMode>()?,
            top_k: self.query.top_k,
            naive_max_token_for_text_unit: self.query.naive_max_token_for_text_unit,
            response_type: self.query.response_type.clone(),
            ..Default::default()
        })
    }
}

/// Read and validate a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Like [`load_config`], but a missing file means defaults.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        let config = Config::default();
        validate(&config)?;
        Ok(config)
    }
}

fn validate(config: &Config) -> Result<()> {
    // Validate chunking
    if config.chunking.chunk_token_size == 0 {
        bail!("chunking.chunk_token_size must be > 0");
    }
    if config.chunking.chunk_overlap_token_size >= config.chunking.chunk_token_size {
        bail!(
            "chunking.chunk_overlap_token_size ({}) must be smaller than chunking.chunk_token_size ({})",
            config.chunking.chunk_overlap_token_size,
            config.chunking.chunk_token_size
        );
    }
    match config.chunking.tokenizer.as_str() {
        "simple" | "tiktoken" => {}
        other => bail!(
            "Unknown tokenizer: '{}'. Must be simple or tiktoken.",
            other
        ),
    }

    // Validate vector index
    config
        .vector
        .metric
        .parse::<Metric>()
        .with_context(|| "invalid vector.metric")?;
    config
        .vector
        .storage_backend
        .parse::<StorageBackend>()
        .with_context(|| "invalid vector.storage_backend")?;

    // Validate embedding
    match config.embedding.provider.as_str() {
        "disabled" | "hash" | "openai" => {}
        other => bail!(
            "Unknown embedding provider: '{}'. Must be disabled, hash, or openai.",
            other
        ),
    }
    if config.embedding.provider == "hash" && config.embedding.dims == 0 {
        bail!("embedding.dims must be > 0 when provider is 'hash'");
    }

    // Validate llm
    match config.llm.provider.as_str() {
        "disabled" | "openai" => {}
        other => bail!(
            "Unknown llm provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    // Validate query
    if config.query.top_k < 1 {
        bail!("query.top_k must be >= 1");
    }
    config
        .query
        .mode
        .parse::<QueryMode>()
        .with_context(|| "invalid query.mode")?;

    crate::logger::parse_level(&config.logging.level).with_context(|| "invalid logging.level")?;

    Ok(())
}
