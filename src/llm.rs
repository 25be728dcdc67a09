//! Generation providers and the provider factory.
//!
//! [`OpenAILlm`] talks to the Responses API (`POST {base_url}/responses`)
//! with the user prompt as `input` and the system prompt as
//! `instructions`. The answer is read from the first of:
//!
//! 1. `output_text`
//! 2. the first `text` in `output[0].content[]`
//! 3. `choices[0].message.content` (chat-completions shaped replies)
//!
//! and is the empty string when none is present.

use std::time::Duration;

use anyhow::Result;
use serde_json::Value;
use tracing::debug;

use nano_graphrag_core::llm::LlmProvider;

use crate::config::LlmConfig;
use crate::embedding::api_key;
use crate::http::RestClient;

pub struct OpenAILlm {
    client: RestClient,
    url: String,
    model: String,
}

impl OpenAILlm {
    /// # Errors
    ///
    /// Configuration error if `OPENAI_API_KEY` is not set.
    pub fn new(config: &LlmConfig) -> nano_graphrag_core::Result<Self> {
        Self::with_key(config, api_key()?)
    }

    fn with_key(config: &LlmConfig, key: String) -> nano_graphrag_core::Result<Self> {
        let client = RestClient::new(Duration::from_secs(config.timeout_secs))?.with_bearer(key);
        Ok(Self {
            client,
            url: format!("{}/responses", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
        })
    }
}

impl LlmProvider for OpenAILlm {
    fn prompt(&self, user_prompt: &str, system_prompt: &str) -> nano_graphrag_core::Result<String> {
        let mut body = serde_json::json!({
            "model": self.model,
            "input": user_prompt,
        });
        if !system_prompt.is_empty() {
            body["instructions"] = Value::String(system_prompt.to_string());
        }

        debug!(model = %self.model, "sending prompt");
        let response = self.client.post_json(&self.url, &body)?;
        Ok(extract_text(&response))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn extract_text(response: &Value) -> String {
    if let Some(text) = response.get("output_text").and_then(Value::as_str) {
        return text.to_string();
    }

    let structured = response
        .get("output")
        .and_then(|o| o.get(0))
        .and_then(|item| item.get("content"))
        .and_then(Value::as_array)
        .and_then(|content| {
            content
                .iter()
                .find_map(|c| c.get("text").and_then(Value::as_str))
        });
    if let Some(text) = structured {
        return text.to_string();
    }

    response
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Create the [`LlmProvider`] named by the configuration.
///
/// `"openai"` builds an [`OpenAILlm`]; any other name (including
/// `"disabled"`) returns `None`.
pub fn create_llm_provider(config: &LlmConfig) -> Result<Option<Box<dyn LlmProvider>>> {
    match config.provider.as_str() {
        "openai" => Ok(Some(Box::new(OpenAILlm::new(config)?))),
        _ => Ok(None),
    }
}
