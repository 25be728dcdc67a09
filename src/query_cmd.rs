//! `ngrag query`: index documents, then answer a question over them.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::info;

use nano_graphrag_core::models::{QueryMode, QueryParam};
use nano_graphrag_core::QueryResponse;

use crate::config::Config;
use crate::pipeline::{build_graph_rag, split_paragraphs};

/// Command-line overrides for the `[query]` defaults.
#[derive(Debug, Clone, Default)]
pub struct QueryOverrides {
    pub mode: Option<String>,
    pub top_k: Option<usize>,
    pub max_tokens: Option<usize>,
    pub only_context: bool,
    pub response_type: Option<String>,
}

impl QueryOverrides {
    pub fn apply(&self, mut param: QueryParam) -> Result<QueryParam> {
        if let Some(mode) = &self.mode {
            param.mode = mode.parse::<QueryMode>()?;
        }
        if let Some(top_k) = self.top_k {
            if top_k == 0 {
                bail!("--top-k must be >= 1");
            }
            param.top_k = top_k;
        }
        if let Some(max_tokens) = self.max_tokens {
            param.naive_max_token_for_text_unit = max_tokens;
        }
        if let Some(response_type) = &self.response_type {
            param.response_type = response_type.clone();
        }
        param.only_need_context |= self.only_context;
        Ok(param)
    }
}

/// Insert every paragraph of `docs` and run one query.
pub fn answer(
    config: &Config,
    question: &str,
    docs: &[PathBuf],
    overrides: &QueryOverrides,
) -> Result<QueryResponse> {
    let param = overrides.apply(config.query_param()?)?;

    let mut paragraphs = Vec::new();
    for path in docs {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        paragraphs.extend(split_paragraphs(&text));
    }

    let mut rag = build_graph_rag(config)?;
    let summary = rag.insert(&paragraphs)?;
    info!(
        documents = summary.documents,
        chunks = summary.chunks,
        "indexed"
    );
    rag.save()?;

    Ok(rag.query(question, &param)?)
}

pub fn run_query(
    config: &Config,
    question: &str,
    docs: &[PathBuf],
    overrides: &QueryOverrides,
) -> Result<()> {
    let response = answer(config, question, docs, overrides)?;
    println!("{}", response.into_text());
    Ok(())
}
