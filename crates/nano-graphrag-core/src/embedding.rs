//! Embedding provider trait, the offline hash embedder, and vector math.
//!
//! Concrete remote providers (OpenAI) live in the `nano-graphrag` app
//! crate. Every provider is batch-in, batch-aligned-out: one call to
//! [`EmbeddingProvider::embed`] covers a whole upsert or query.

use sha2::{Digest, Sha256};

use crate::error::Result;

/// Trait for embedding providers.
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `1536`).
    ///
    /// `0` means "unknown until the first embedding comes back".
    fn dims(&self) -> usize;
    /// Maximum number of tokens the model accepts per input.
    fn max_token_size(&self) -> usize;
    /// Embed a batch of texts. The output should have one vector per input,
    /// in input order; callers tolerate a mismatched count.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Deterministic bag-of-words embedder that needs no model or network.
///
/// Each whitespace-separated token is hashed (SHA-256) into one of `dims`
/// buckets; the bucket counts are L2-normalized. Texts sharing words get a
/// positive cosine similarity, which is enough for demos and tests.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dims: usize,
    max_tokens: usize,
}

impl HashEmbedder {
    pub fn new(dims: usize, max_tokens: usize) -> Self {
        Self { dims, max_tokens }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.dims];
        if self.dims == 0 {
            return vec;
        }
        for token in text.split_whitespace().take(self.max_tokens) {
            let digest = Sha256::digest(token.as_bytes());
            let mut head = [0u8; 8];
            head.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(head) % self.dims as u64) as usize;
            vec[bucket] += 1.0;
        }
        let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vec {
                *v /= norm;
            }
        }
        vec
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(256, 8192)
    }
}

impl EmbeddingProvider for HashEmbedder {
    fn model_name(&self) -> &str {
        "hash"
    }
    fn dims(&self) -> usize {
        self.dims
    }
    fn max_token_size(&self) -> usize {
        self.max_tokens
    }
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`, or `0.0` for empty vectors, vectors of
/// different lengths, or a zero-norm operand.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

/// Euclidean distance. Mismatched lengths compare over the shared prefix.
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
