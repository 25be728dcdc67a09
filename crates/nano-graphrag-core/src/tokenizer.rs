//! Tokenizer trait and the built-in whitespace tokenizer.
//!
//! Chunking works on token ids, but the text of each chunk has to come back
//! from somewhere. Tokenizers differ in how faithfully they can do that:
//!
//! | Kind | Reconstruction |
//! |------|----------------|
//! | [`TokenizerKind::Tiktoken`] | exact; decodes the token window itself |
//! | [`TokenizerKind::Simple`] | approximate; re-slices the original text by word index |
//!
//! The BPE tokenizer lives in the application crate (it pulls in large
//! vocabularies); [`create_tokenizer`] here only knows the variants this
//! crate can build.

use std::fmt;
use std::str::FromStr;

use crate::error::{RagError, Result};

/// Token id as produced by [`Tokenizer::encode`].
pub type TokenId = u32;

/// Which reconstruction capability a tokenizer offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizerKind {
    /// Whitespace word counting; word-granularity reconstruction.
    Simple,
    /// BPE (`o200k_base`); exact reconstruction.
    Tiktoken,
}

impl TokenizerKind {
    pub fn is_exact(self) -> bool {
        matches!(self, TokenizerKind::Tiktoken)
    }
}

impl fmt::Display for TokenizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenizerKind::Simple => f.write_str("simple"),
            TokenizerKind::Tiktoken => f.write_str("tiktoken"),
        }
    }
}

impl FromStr for TokenizerKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "simple" => Ok(TokenizerKind::Simple),
            "tiktoken" => Ok(TokenizerKind::Tiktoken),
            other => Err(RagError::Configuration(format!(
                "unknown tokenizer '{other}'. Use simple or tiktoken."
            ))),
        }
    }
}

/// Text ↔ token-id conversion used by the chunker.
pub trait Tokenizer: Send + Sync {
    fn encode(&self, text: &str) -> Vec<TokenId>;

    /// Decode each token sequence independently.
    fn decode_batch(&self, tokens_list: &[Vec<TokenId>]) -> Result<Vec<String>>;

    /// Reconstruct chunk texts for windows cut from `doc`.
    ///
    /// `starts[i]` and `lengths[i]` locate `chunk_tokens[i]` in the token
    /// sequence of `doc`. Exact tokenizers may ignore everything but
    /// `chunk_tokens`; approximate ones need the original text.
    fn decode(
        &self,
        chunk_tokens: &[Vec<TokenId>],
        doc: &str,
        starts: &[usize],
        lengths: &[usize],
    ) -> Result<Vec<String>>;

    fn kind(&self) -> TokenizerKind;
}

/// Whitespace tokenizer: one token per word.
///
/// Every word maps to the same id, so the ids carry no information and
/// [`decode_batch`](Tokenizer::decode_batch) can only report lengths.
/// Chunk text is rebuilt from the source document, joining words with a
/// single space (original spacing is lost).
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleTokenizer;

impl Tokenizer for SimpleTokenizer {
    fn encode(&self, text: &str) -> Vec<TokenId> {
        split_words(text).map(|_| 1).collect()
    }

    fn decode_batch(&self, tokens_list: &[Vec<TokenId>]) -> Result<Vec<String>> {
        Ok(tokens_list.iter().map(|t| t.len().to_string()).collect())
    }

    fn decode(
        &self,
        chunk_tokens: &[Vec<TokenId>],
        doc: &str,
        starts: &[usize],
        lengths: &[usize],
    ) -> Result<Vec<String>> {
        let words: Vec<&str> = split_words(doc).collect();
        let texts = (0..chunk_tokens.len())
            .map(|i| {
                let start = starts[i].min(words.len());
                let end = (starts[i] + lengths[i]).min(words.len());
                words[start..end].join(" ")
            })
            .collect();
        Ok(texts)
    }

    fn kind(&self) -> TokenizerKind {
        TokenizerKind::Simple
    }
}

/// Words as the simple tokenizer sees them: runs separated by space,
/// newline or tab.
fn split_words(text: &str) -> impl Iterator<Item = &str> {
    text.split([' ', '\n', '\t']).filter(|w| !w.is_empty())
}

/// Build one of the tokenizers this crate ships.
///
/// Returns `None` for kinds that need an external implementation
/// (`Tiktoken`).
pub fn create_tokenizer(kind: TokenizerKind) -> Option<Box<dyn Tokenizer>> {
    match kind {
        TokenizerKind::Simple => Some(Box::new(SimpleTokenizer)),
        TokenizerKind::Tiktoken => None,
    }
}
