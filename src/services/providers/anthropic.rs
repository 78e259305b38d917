//! Anthropic Messages API provider
//!
//! Declares the single tool and sets `tool_choice` to it, so a compliant reply is
//! one `tool_use` block. Whatever comes back is passed up unvalidated; the
//! intent resolver decides whether it honours the contract.

use std::time::Duration;

use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    models::{ModelReply, ToolInvocation, ToolInvocationRequest},
    services::providers::LanguageModel,
};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse { name: String, input: Value },
    #[serde(other)]
    Other,
}

#[derive(Clone)]
pub struct AnthropicModel {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicModel {
    pub fn new(
        api_key: String,
        api_url: String,
        model: String,
        max_tokens: u32,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            model,
            max_tokens,
        })
    }

    fn build_body(&self, request: &ToolInvocationRequest) -> Value {
        json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "system": request.instructions,
            "messages": [
                {
                    "role": "user",
                    "content": request.user_message(),
                }
            ],
            "tools": [
                {
                    "name": request.tool.name,
                    "description": request.tool.description,
                    "input_schema": request.tool.input_schema,
                }
            ],
            "tool_choice": {
                "type": "tool",
                "name": request.tool.name,
            },
        })
    }

    fn convert_response(response: MessagesResponse) -> ModelReply {
        let mut reply = ModelReply::default();

        for block in response.content {
            match block {
                ContentBlock::Text { text } => reply.text.push(text),
                ContentBlock::ToolUse { name, input } => {
                    reply.tool_calls.push(ToolInvocation { name, input })
                }
                ContentBlock::Other => {}
            }
        }

        reply
    }

    fn is_retryable(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }
}

#[async_trait::async_trait]
impl LanguageModel for AnthropicModel {
    async fn invoke(&self, request: &ToolInvocationRequest) -> AppResult<ModelReply> {
        let url = format!("{}/v1/messages", self.api_url);
        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.build_body(request))
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() { "timed out" } else { "failed" };
                AppError::UpstreamUnavailable(format!("Model request {}: {}", kind, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "Model API returned an error");

            let message = format!("Model API returned status {}: {}", status, body);
            return Err(if Self::is_retryable(status) {
                AppError::UpstreamUnavailable(message)
            } else {
                AppError::UpstreamRejected(message)
            });
        }

        let parsed: MessagesResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AppError::UpstreamUnavailable(format!("Model response timed out: {}", e))
            } else {
                AppError::IntentResolution(format!("Unreadable model response: {}", e))
            }
        })?;

        let stop_reason = parsed.stop_reason.clone().unwrap_or_default();
        let reply = Self::convert_response(parsed);

        tracing::info!(
            provider = self.name(),
            tool_calls = reply.tool_calls.len(),
            text_blocks = reply.text.len(),
            stop_reason = %stop_reason,
            "Model reply received"
        );

        Ok(reply)
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}
