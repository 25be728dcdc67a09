//! Blocking JSON-over-HTTP client shared by the remote providers.
//!
//! One request, one complete JSON body back. Anything else is a
//! [`RagError::Transport`]:
//!
//! - a non-success status (the body is kept in the message)
//! - a streamed body (`text/event-stream`, `application/x-ndjson`)
//! - `Transfer-Encoding: chunked`
//! - connection failures and timeouts
//!
//! There is no retry; the configured timeout bounds every call.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, TRANSFER_ENCODING};
use serde_json::Value;
use tracing::debug;

use nano_graphrag_core::{RagError, Result};

const STREAM_CONTENT_TYPES: [&str; 2] = ["text/event-stream", "application/x-ndjson"];

#[derive(Debug, Clone)]
pub struct RestClient {
    client: reqwest::blocking::Client,
    bearer: Option<String>,
}

impl RestClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RagError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            bearer: None,
        })
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// POST `body` as JSON and parse the JSON response.
    pub fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        debug!(url, "POST");
        let mut request = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .json(body);
        if let Some(token) = &self.bearer {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .map_err(|e| RagError::Transport(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        debug!(url, status = status.as_u16(), "response received");
        if !status.is_success() {
            let body_text = response.text().unwrap_or_default();
            return Err(RagError::Transport(format!("HTTP {status}: {body_text}")));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if STREAM_CONTENT_TYPES
            .iter()
            .any(|t| content_type.starts_with(t))
        {
            return Err(RagError::Transport(format!(
                "streamed response ({content_type}) is not supported"
            )));
        }

        let chunked = response
            .headers()
            .get(TRANSFER_ENCODING)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"));
        if chunked {
            return Err(RagError::Transport(
                "chunked transfer encoding is not supported".to_string(),
            ));
        }

        response
            .json::<Value>()
            .map_err(|e| RagError::Transport(format!("invalid JSON response from {url}: {e}")))
    }
}
