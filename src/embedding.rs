//! Embedding providers and the provider factory.
//!
//! The [`EmbeddingProvider`] trait lives in `nano-graphrag-core`; this
//! module adds the remote implementation:
//!
//! - **[`OpenAIEmbedder`]** calls `POST {base_url}/embeddings` with one
//!   batched request per call.
//!
//! Use [`create_embedding_provider`] to pick a provider from the
//! `[embedding]` config section:
//!
//! ```rust
//! # use nano_graphrag::config::EmbeddingConfig;
//! # use nano_graphrag::embedding::create_embedding_provider;
//! let config = EmbeddingConfig::default(); // provider = "hash"
//! let provider = create_embedding_provider(&config).unwrap().unwrap();
//! assert_eq!(provider.model_name(), "hash");
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde_json::Value;
use tracing::debug;

use nano_graphrag_core::embedding::{EmbeddingProvider, HashEmbedder};
use nano_graphrag_core::RagError;

use crate::config::EmbeddingConfig;
use crate::http::RestClient;

/// Environment variable holding the OpenAI API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Read the API key, or fail with a configuration error.
pub(crate) fn api_key() -> nano_graphrag_core::Result<String> {
    std::env::var(API_KEY_ENV)
        .ok()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| RagError::Configuration(format!("{API_KEY_ENV} environment variable not set")))
}

// ============ OpenAI Provider ============

/// Embedding provider using the OpenAI API.
///
/// Requires `OPENAI_API_KEY` at construction time.
pub struct OpenAIEmbedder {
    client: RestClient,
    url: String,
    model: String,
    dims: usize,
    max_token_size: usize,
}

impl OpenAIEmbedder {
    /// # Errors
    ///
    /// [`RagError::Configuration`] if `OPENAI_API_KEY` is not set.
    pub fn new(config: &EmbeddingConfig) -> nano_graphrag_core::Result<Self> {
        Self::with_key(config, api_key()?)
    }

    fn with_key(config: &EmbeddingConfig, key: String) -> nano_graphrag_core::Result<Self> {
        let client = RestClient::new(Duration::from_secs(config.timeout_secs))?.with_bearer(key);
        Ok(Self {
            client,
            url: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            dims: config.dims,
            max_token_size: config.max_token_size,
        })
    }
}

impl EmbeddingProvider for OpenAIEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    fn max_token_size(&self) -> usize {
        self.max_token_size
    }

    fn embed(&self, texts: &[String]) -> nano_graphrag_core::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(model = %self.model, batch = texts.len(), "embedding batch");

        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
            "encoding_format": "float",
        });
        let json = self.client.post_json(&self.url, &body)?;
        let embeddings = parse_openai_response(&json);
        debug!(items = embeddings.len(), "embedding response");
        Ok(embeddings)
    }
}

/// Extract `data[].embedding` arrays in response order.
///
/// Items without an embedding are skipped, so the result can be shorter
/// than the request; the vector index treats that as a count mismatch.
fn parse_openai_response(json: &Value) -> Vec<Vec<f32>> {
    let Some(data) = json.get("data").and_then(|d| d.as_array()) else {
        return Vec::new();
    };

    data.iter()
        .filter_map(|item| item.get("embedding").and_then(|e| e.as_array()))
        .map(|embedding| {
            embedding
                .iter()
                .map(|v| v.as_f64().unwrap_or(0.0) as f32)
                .collect()
        })
        .collect()
}

/// Create the [`EmbeddingProvider`] named by the configuration.
///
/// | Config Value | Provider |
/// |-------------|----------|
/// | `"hash"` | [`HashEmbedder`] |
/// | `"openai"` | [`OpenAIEmbedder`] |
/// | anything else | `None` |
///
/// # Errors
///
/// Returns an error if the OpenAI provider cannot be initialized (missing
/// API key).
pub fn create_embedding_provider(
    config: &EmbeddingConfig,
) -> Result<Option<Arc<dyn EmbeddingProvider>>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.provider.as_str() {
        "hash" => Arc::new(HashEmbedder::new(config.dims, config.max_token_size)),
        "openai" => Arc::new(OpenAIEmbedder::new(config)?),
        _ => return Ok(None),
    };
    Ok(Some(provider))
}
