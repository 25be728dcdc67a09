//! # nano-graphrag
//!
//! Command-line front end and remote providers for the
//! [`nano_graphrag_core`] pipeline.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────────┐   ┌───────────────┐
//! │  Documents   │──▶│  Chunk (tokenizer)   │──▶│ KV + vector   │
//! │ (paragraphs) │   │  Embed (hash/openai) │   │ stores        │
//! └──────────────┘   └──────────────────────┘   └──────┬────────┘
//!                                                      │ naive query
//!                                                      ▼
//!                                               ┌───────────────┐
//!                                               │ LLM (openai)  │
//!                                               └───────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! ngrag chunk book.txt
//! ngrag query "Who is Scrooge?" --doc book.txt --mode naive
//! ngrag graph edges.txt
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`http`] | Blocking JSON client for remote providers |
//! | [`embedding`] | OpenAI embeddings and the provider factory |
//! | [`llm`] | OpenAI Responses API and the provider factory |
//! | [`tokenizer`] | BPE tokenizer and the tokenizer factory |
//! | [`pipeline`] | Config → orchestrator wiring |
//! | [`logger`] | tracing-subscriber setup |

pub mod chunk_cmd;
pub mod config;
pub mod embedding;
pub mod graph_cmd;
pub mod http;
pub mod llm;
pub mod logger;
pub mod pipeline;
pub mod query_cmd;
pub mod tokenizer;
