//! `ngrag chunk`: dry-run preview of how a file would be chunked.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use nano_graphrag_core::chunk::chunk_by_token_size;
use nano_graphrag_core::models::{ContentId, Document};

use crate::config::Config;
use crate::tokenizer::create_tokenizer_or_simple;

#[derive(Debug, Clone, Serialize)]
pub struct ChunkPreview {
    pub index: usize,
    pub tokens: usize,
    pub id: String,
    pub snippet: String,
}

/// Chunk `text` with the configured tokenizer and window sizes.
pub fn preview_chunks(config: &Config, text: &str) -> Result<Vec<ChunkPreview>> {
    let tokenizer = create_tokenizer_or_simple(&config.chunking.tokenizer)?;
    let doc = Document::new(text);
    let chunks = chunk_by_token_size(
        &doc.id,
        &doc.content,
        tokenizer.as_ref(),
        config.chunking.chunk_token_size,
        config.chunking.chunk_overlap_token_size,
    )?;

    Ok(chunks
        .into_iter()
        .map(|c| ChunkPreview {
            index: c.chunk_order_index,
            tokens: c.tokens,
            id: ContentId::for_chunk(&c.content).to_string(),
            snippet: c
                .content
                .chars()
                .take(60)
                .collect::<String>()
                .replace('\n', " "),
        })
        .collect())
}

/// Print the preview, as a table or as a JSON array with `json`.
pub fn run_chunk(config: &Config, path: &Path, json: bool) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let previews = preview_chunks(config, &text)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&previews)?);
        return Ok(());
    }
    if previews.is_empty() {
        println!("No chunks.");
        return Ok(());
    }
    for p in &previews {
        println!("{:>4}  tokens={:<6} {}", p.index, p.tokens, p.id);
        println!("      {}", p.snippet);
    }
    println!("chunks: {}", previews.len());
    Ok(())
}
