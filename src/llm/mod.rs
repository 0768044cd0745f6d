//! LLM client and answer generation
//!
//! # Architecture
//!
//! - [`LLMClient`] - the trait every provider implements
//! - [`AnthropicClient`] - Anthropic Messages API over HTTP
//! - [`AIGenerator`] - drives the tool-calling conversation for one query
//!
//! # Example
//!
//! ```ignore
//! use course_rag::llm::{AIGenerator, AnthropicClient};
//!
//! let client = Arc::new(AnthropicClient::new(api_key, model));
//! let generator = AIGenerator::new(client, 1);
//! let answer = generator.generate("What is MCP?", None, &tools).await?;
//! println!("{}", answer.answer);
//! ```

/// Anthropic Messages API client.
pub mod anthropic;
/// Core LLM client trait and message types.
pub mod client;
/// Tool-calling answer generation.
pub mod generator;

pub use anthropic::AnthropicClient;
pub use client::{
    ChatMessage, CompletionRequest, ContentBlock, LLMClient, LLMResponse, ModelParams, Role,
    TokenUsage,
};
pub use generator::{AIGenerator, GeneratedAnswer};
