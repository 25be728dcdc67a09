//! Generation provider trait.
//!
//! The orchestrator hands the assembled context to an [`LlmProvider`] as a
//! system prompt. Implementations live in the app crate.

use crate::error::Result;

pub trait LlmProvider: Send + Sync {
    /// Complete `user_prompt` under `system_prompt` (may be empty).
    ///
    /// An empty string is a valid answer; callers decide how to fall back.
    fn prompt(&self, user_prompt: &str, system_prompt: &str) -> Result<String>;

    fn model_name(&self) -> &str;
}
