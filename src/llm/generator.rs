//! Tool-orchestration loop.
//!
//! The model is first offered the registered tools. Each round in which it
//! asks for tools, every call is executed and all results go back in a single
//! user turn. Once `max_tool_rounds` rounds have been used, the next request
//! carries no tools, so the model has to answer in text.

use crate::llm::client::{ChatMessage, CompletionRequest, ContentBlock, LLMClient};
use crate::tools::registry::ToolRegistry;
use crate::types::{Result, Source};
use std::sync::Arc;
use tracing::{debug, info};

pub const SYSTEM_PROMPT: &str = "You are an assistant specialised in course materials and educational content, with tools for looking up course information.

Tools:
- search_course_content: find specific content inside course lessons
- get_course_outline: get a course's title, link, instructor and full lesson list

Guidelines:
- Use search_course_content for questions about what a course or lesson teaches
- Use get_course_outline for questions about course structure or which lessons exist; keep every course and lesson link from its output
- Answer general knowledge questions from your own knowledge without tools
- If a tool finds nothing, say so plainly

Answers must be:
1. Brief and to the point
2. Accurate and educational
3. Free of meta-commentary: do not describe your search or mention the tool results";

/// Final answer and the sources the tools reported along the way
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedAnswer {
    pub answer: String,
    pub sources: Vec<Source>,
}

pub struct AIGenerator {
    client: Arc<dyn LLMClient>,
    max_tool_rounds: usize,
}

impl AIGenerator {
    pub fn new(client: Arc<dyn LLMClient>, max_tool_rounds: usize) -> Self {
        Self {
            client,
            max_tool_rounds,
        }
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    fn system_prompt(history: Option<&str>) -> String {
        match history {
            Some(history) => format!("{}\n\nPrevious conversation:\n{}", SYSTEM_PROMPT, history),
            None => SYSTEM_PROMPT.to_string(),
        }
    }

    pub async fn generate(
        &self,
        query: &str,
        history: Option<&str>,
        tools: &ToolRegistry,
    ) -> Result<GeneratedAnswer> {
        let system = Self::system_prompt(history);
        let definitions = tools.get_tool_definitions();
        let mut messages = vec![ChatMessage::user(query)];
        let mut sources = Vec::new();
        let mut rounds = 0;

        loop {
            let offer_tools = rounds < self.max_tool_rounds && !definitions.is_empty();
            let request = CompletionRequest {
                system: system.clone(),
                messages: messages.clone(),
                tools: if offer_tools {
                    definitions.clone()
                } else {
                    Vec::new()
                },
            };

            let response = self.client.complete(&request).await?;

            if !offer_tools || !response.wants_tools() {
                info!(
                    model = self.client.model_name(),
                    tool_rounds = rounds,
                    sources = sources.len(),
                    "Generated answer"
                );
                return Ok(GeneratedAnswer {
                    answer: response.content,
                    sources,
                });
            }

            rounds += 1;
            debug!(round = rounds, calls = response.tool_calls.len(), "Model requested tools");
            messages.push(response.to_message());

            let mut results = Vec::with_capacity(response.tool_calls.len());
            for call in &response.tool_calls {
                let outcome = tools.run(&call.name, call.arguments.clone()).await;
                sources.extend(outcome.sources);
                results.push(ContentBlock::ToolResult {
                    tool_use_id: call.id.clone(),
                    content: outcome.content,
                    is_error: outcome.is_error,
                });
            }
            messages.push(ChatMessage::tool_results(results));
        }
    }
}
