//! Wiring from [`Config`] to a ready [`GraphRag`].

use anyhow::{Context, Result};
use tracing::info;

use nano_graphrag_core::GraphRag;

use crate::config::Config;
use crate::embedding::create_embedding_provider;
use crate::llm::create_llm_provider;
use crate::tokenizer::create_tokenizer_or_simple;

/// Build the orchestrator with the configured tokenizer, embedder and LLM.
pub fn build_graph_rag(config: &Config) -> Result<GraphRag> {
    let tokenizer = create_tokenizer_or_simple(&config.chunking.tokenizer)?;
    let embedder = create_embedding_provider(&config.embedding)?;
    let llm = create_llm_provider(&config.llm)?;

    let mut rag = GraphRag::new(config.graph_rag_config()?, tokenizer, embedder)
        .with_context(|| {
            format!(
                "Failed to initialize working dir {}",
                config.storage.working_dir.display()
            )
        })?;
    if let Some(llm) = llm {
        info!(model = llm.model_name(), "llm enabled");
        rag.set_llm(Some(llm));
    }
    Ok(rag)
}

/// Split text into paragraphs on blank lines, dropping empty ones.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }
    paragraphs
}
