//! Token-window chunker.
//!
//! Splits a document's token sequence into fixed-size, overlapping windows
//! and asks the [`Tokenizer`] to turn each window back into text.
//!
//! # Algorithm
//!
//! 1. `tokens = tokenizer.encode(document)`.
//! 2. `stride = max_tokens - overlap_tokens`; a non-positive stride is a
//!    [`RagError::Configuration`] (the loop would never advance).
//! 3. Windows start at `0, stride, 2·stride, …` while `start < len(tokens)`
//!    and cover `tokens[start .. min(start + max_tokens, len)]`.
//! 4. Window texts come from [`Tokenizer::decode`], exact or word-level
//!    depending on the tokenizer kind.
//! 5. Each chunk records its window length as `tokens` and its sequence
//!    number as `chunk_order_index`.
//!
//! Chunking is a pure function of `(document, max_tokens, overlap_tokens,
//! tokenizer)`: documents are chunked independently and order indices
//! never span documents.
//!
//! # Example
//!
//! ```rust
//! use nano_graphrag_core::chunk::plan_windows;
//!
//! let windows = plan_windows(10, 4, 1).unwrap();
//! let starts: Vec<usize> = windows.iter().map(|w| w.start).collect();
//! assert_eq!(starts, vec![0, 3, 6, 9]);
//! ```

use std::collections::HashMap;

use crate::error::{RagError, Result};
use crate::models::{ContentId, Document, TextChunk};
use crate::tokenizer::Tokenizer;

/// Position of one window within a token sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: usize,
    pub len: usize,
}

/// Compute window offsets for a sequence of `n_tokens` tokens.
///
/// # Errors
///
/// [`RagError::Configuration`] if `overlap_tokens >= max_tokens`.
pub fn plan_windows(n_tokens: usize, max_tokens: usize, overlap_tokens: usize) -> Result<Vec<Window>> {
    let stride = stride(max_tokens, overlap_tokens)?;
    Ok((0..n_tokens)
        .step_by(stride)
        .map(|start| Window {
            start,
            len: max_tokens.min(n_tokens - start),
        })
        .collect())
}

/// Validate chunk parameters and return the stride.
pub fn stride(max_tokens: usize, overlap_tokens: usize) -> Result<usize> {
    if overlap_tokens >= max_tokens {
        return Err(RagError::Configuration(format!(
            "chunk overlap ({overlap_tokens}) must be smaller than chunk size ({max_tokens})"
        )));
    }
    Ok(max_tokens - overlap_tokens)
}

/// Chunk a single document.
///
/// An empty document (no tokens) yields no chunks.
pub fn chunk_by_token_size(
    doc_id: &ContentId,
    content: &str,
    tokenizer: &dyn Tokenizer,
    max_tokens: usize,
    overlap_tokens: usize,
) -> Result<Vec<TextChunk>> {
    let tokens = tokenizer.encode(content);
    let windows = plan_windows(tokens.len(), max_tokens, overlap_tokens)?;
    if windows.is_empty() {
        return Ok(Vec::new());
    }

    let chunk_tokens: Vec<Vec<_>> = windows
        .iter()
        .map(|w| tokens[w.start..w.start + w.len].to_vec())
        .collect();
    let starts: Vec<usize> = windows.iter().map(|w| w.start).collect();
    let lengths: Vec<usize> = windows.iter().map(|w| w.len).collect();

    let texts = tokenizer.decode(&chunk_tokens, content, &starts, &lengths)?;

    Ok(texts
        .into_iter()
        .zip(lengths)
        .enumerate()
        .map(|(index, (text, len))| TextChunk {
            tokens: len,
            content: text,
            full_doc_id: doc_id.clone(),
            chunk_order_index: index,
        })
        .collect())
}

/// Chunk a batch of documents, keying each chunk by its content-hash id.
///
/// Chunks with identical text collapse onto one entry; the entry from the
/// later document in `docs` wins.
pub fn get_chunks(
    docs: &[Document],
    tokenizer: &dyn Tokenizer,
    max_tokens: usize,
    overlap_tokens: usize,
) -> Result<HashMap<String, TextChunk>> {
    let mut inserting = HashMap::new();
    for doc in docs {
        for chunk in chunk_by_token_size(&doc.id, &doc.content, tokenizer, max_tokens, overlap_tokens)? {
            let id = ContentId::for_chunk(&chunk.content);
            inserting.insert(id.into(), chunk);
        }
    }
    Ok(inserting)
}
