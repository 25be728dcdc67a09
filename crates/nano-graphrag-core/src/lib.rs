//! # nano-graphrag core
//!
//! Synchronous, network-free building blocks for a small GraphRAG
//! pipeline: content-addressed ids, token-window chunking, the three
//! storage abstractions (key-value, property graph, vector index) and the
//! [`GraphRag`](rag::GraphRag) orchestrator that composes them.
//!
//! Remote providers (OpenAI embeddings and completions) and the BPE
//! tokenizer live in the `nano-graphrag` application crate; this crate
//! only defines the traits they implement plus offline variants
//! ([`SimpleTokenizer`](tokenizer::SimpleTokenizer),
//! [`HashEmbedder`](embedding::HashEmbedder)) that make the pipeline
//! usable and testable without a network.
//!
//! ```text
//! documents ──▶ chunk ──▶ text_chunks (KV) ──┐
//!     │             └───▶ chunks_vdb ─────────┼──▶ naive query ──▶ LLM
//!     └───────────────▶ full_docs (KV)        │
//!                        graph (clustering) ──┘ (future entity retrieval)
//! ```

pub mod chunk;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod models;
pub mod prompt;
pub mod rag;
pub mod store;
pub mod tokenizer;

pub use error::{RagError, Result};
pub use rag::{GraphRag, GraphRagConfig, InsertSummary, QueryResponse};
