//! Tokenizer selection, including the BPE tokenizer.
//!
//! [`TiktokenTokenizer`] wraps `tiktoken-rs` with the `o200k_base`
//! encoding and reconstructs chunk text exactly by decoding each token
//! window. It is compiled in with the default `tiktoken` feature.

use tracing::warn;

use nano_graphrag_core::tokenizer::{self as core_tokenizer, Tokenizer, TokenizerKind};

#[cfg(feature = "tiktoken")]
pub use bpe::TiktokenTokenizer;

#[cfg(feature = "tiktoken")]
mod bpe {
    use tiktoken_rs::{CoreBPE, Rank};

    use nano_graphrag_core::tokenizer::{TokenId, Tokenizer, TokenizerKind};
    use nano_graphrag_core::{RagError, Result};

    pub struct TiktokenTokenizer {
        bpe: CoreBPE,
    }

    impl TiktokenTokenizer {
        pub fn new() -> Result<Self> {
            let bpe = tiktoken_rs::o200k_base()
                .map_err(|e| RagError::Tokenizer(format!("failed to load o200k_base: {e}")))?;
            Ok(Self { bpe })
        }
    }

    impl TiktokenTokenizer {
        fn decode_window(&self, tokens: &[TokenId]) -> Result<String> {
            let ranks: Vec<Rank> = tokens.iter().map(|&t| t as Rank).collect();
            if let Ok(text) = self.bpe.decode(ranks.clone()) {
                return Ok(text);
            }
            // Byte-level decoding panics on ids outside the vocabulary.
            if let Some(&bad) = ranks.iter().find(|&&r| !self.is_known(r)) {
                return Err(RagError::Tokenizer(format!("unknown token id {bad}")));
            }
            let bytes: Vec<u8> = self
                .bpe
                ._decode_native_and_split(ranks)
                .flatten()
                .collect();
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }

        fn is_known(&self, rank: Rank) -> bool {
            match self.bpe.decode(vec![rank]) {
                Ok(_) => true,
                Err(e) => !e.to_string().starts_with("Invalid token"),
            }
        }
    }

    impl Tokenizer for TiktokenTokenizer {
        fn encode(&self, text: &str) -> Vec<TokenId> {
            self.bpe
                .encode_ordinary(text)
                .into_iter()
                .map(|t| t as TokenId)
                .collect()
        }

        /// A window cut through a multi-byte character decodes lossily,
        /// with U+FFFD in place of the partial bytes.
        fn decode_batch(&self, tokens_list: &[Vec<TokenId>]) -> Result<Vec<String>> {
            tokens_list
                .iter()
                .map(|tokens| self.decode_window(tokens))
                .collect()
        }

        /// Windows decode on their own; the document and offsets are unused.
        fn decode(
            &self,
            chunk_tokens: &[Vec<TokenId>],
            _doc: &str,
            _starts: &[usize],
            _lengths: &[usize],
        ) -> Result<Vec<String>> {
            self.decode_batch(chunk_tokens)
        }

        fn kind(&self) -> TokenizerKind {
            TokenizerKind::Tiktoken
        }
    }
}

/// Build a tokenizer by name (`simple` or `tiktoken`).
///
/// Returns `Ok(None)` for unknown names, and for `tiktoken` when the
/// feature is compiled out.
pub fn create_tokenizer(name: &str) -> anyhow::Result<Option<Box<dyn Tokenizer>>> {
    let Ok(kind) = name.parse::<TokenizerKind>() else {
        return Ok(None);
    };
    match kind {
        TokenizerKind::Simple => Ok(core_tokenizer::create_tokenizer(kind)),
        TokenizerKind::Tiktoken => tiktoken(),
    }
}

#[cfg(feature = "tiktoken")]
fn tiktoken() -> anyhow::Result<Option<Box<dyn Tokenizer>>> {
    Ok(Some(Box::new(TiktokenTokenizer::new()?)))
}

#[cfg(not(feature = "tiktoken"))]
fn tiktoken() -> anyhow::Result<Option<Box<dyn Tokenizer>>> {
    warn!("built without the tiktoken feature");
    Ok(None)
}

/// [`create_tokenizer`], falling back to the whitespace tokenizer.
pub fn create_tokenizer_or_simple(name: &str) -> anyhow::Result<Box<dyn Tokenizer>> {
    match create_tokenizer(name)? {
        Some(tokenizer) => Ok(tokenizer),
        None => {
            warn!(tokenizer = name, "tokenizer unavailable; using simple");
            Ok(Box::new(core_tokenizer::SimpleTokenizer))
        }
    }
}
