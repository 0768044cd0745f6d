//! Anthropic Claude LLM client implementation
//!
//! Calls the Messages API directly over `reqwest` so tool-use and
//! tool-result blocks round-trip exactly as the generator builds them.
//!
//! # Example
//!
//! ```rust,ignore
//! use course_rag::llm::{AnthropicClient, LLMClient};
//!
//! let client = AnthropicClient::new(api_key, "claude-sonnet-4-20250514".to_string());
//! let response = client.complete(&request).await?;
//! ```

use crate::llm::client::{
    ChatMessage, CompletionRequest, LLMClient, LLMResponse, ModelParams, TokenUsage,
};
use crate::types::{AppError, Result, ToolCall, ToolDefinition};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct AnthropicTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a Value,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<AnthropicTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorResponse {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

/// Anthropic Claude client for API-based inference
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    params: ModelParams,
}

impl AnthropicClient {
    /// Create a new Anthropic client
    ///
    /// # Arguments
    ///
    /// * `api_key` - Anthropic API key
    /// * `model` - Model identifier (e.g., "claude-sonnet-4-20250514")
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_params(api_key, model, ModelParams::default())
    }

    /// Create a new Anthropic client with model parameters
    pub fn with_params(api_key: String, model: String, params: ModelParams) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model,
            params,
        }
    }

    /// Point the client at another endpoint (proxies, test servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn convert_tool(tool: &ToolDefinition) -> AnthropicTool<'_> {
        AnthropicTool {
            name: &tool.name,
            description: &tool.description,
            input_schema: &tool.parameters,
        }
    }

    fn build_request<'a>(&'a self, request: &'a CompletionRequest) -> AnthropicRequest<'a> {
        let tools: Vec<AnthropicTool<'a>> = request.tools.iter().map(Self::convert_tool).collect();
        let tool_choice = (!tools.is_empty()).then(|| json!({"type": "auto"}));

        AnthropicRequest {
            model: &self.model,
            max_tokens: self.params.max_tokens,
            temperature: self.params.temperature,
            system: Some(request.system.as_str()).filter(|s| !s.is_empty()),
            messages: &request.messages,
            tools,
            tool_choice,
        }
    }

    fn into_llm_response(response: AnthropicResponse) -> LLMResponse {
        let mut content = String::new();
        let mut tool_calls = Vec::new();

        for block in response.content {
            match block {
                ResponseBlock::Text { text } => content.push_str(&text),
                ResponseBlock::ToolUse { id, name, input } => tool_calls.push(ToolCall {
                    id,
                    name,
                    arguments: input,
                }),
                ResponseBlock::Other => {}
            }
        }

        LLMResponse {
            content,
            tool_calls,
            finish_reason: response.stop_reason.unwrap_or_else(|| "stop".to_string()),
            usage: response
                .usage
                .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens)),
        }
    }
}

#[async_trait]
impl LLMClient for AnthropicClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<LLMResponse> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.build_request(request);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LLM(format!("Anthropic API request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicErrorResponse>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            return Err(AppError::LLM(format!(
                "Anthropic API error ({}): {}",
                status.as_u16(),
                message
            )));
        }

        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| AppError::LLM(format!("Invalid Anthropic response: {}", e)))?;

        let result = Self::into_llm_response(parsed);
        debug!(
            model = %self.model,
            finish_reason = %result.finish_reason,
            tool_calls = result.tool_calls.len(),
            "Anthropic response"
        );
        Ok(result)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
