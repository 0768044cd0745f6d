use crate::types::{Result, Source, ToolDefinition};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// What a tool hands back: text for the model, sources for the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    pub content: String,
    pub sources: Vec<Source>,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sources: Vec::new(),
        }
    }
}

/// Result of running a tool on the model's behalf. Never an `Err`:
/// failures become text flagged with `is_error`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub content: String,
    pub sources: Vec<Source>,
    pub is_error: bool,
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Value;
    async fn execute(&self, args: Value) -> Result<ToolOutput>;
}

pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Definitions of every registered tool, ordered by name
    pub fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    pub async fn execute(&self, name: &str, args: Value) -> Result<ToolOutput> {
        if let Some(tool) = self.tools.get(name) {
            tool.execute(args).await
        } else {
            Err(crate::types::AppError::NotFound(format!(
                "Tool not found: {}",
                name
            )))
        }
    }

    /// Run a tool requested by the model, turning any failure into a
    /// descriptive message the model can read.
    pub async fn run(&self, name: &str, args: Value) -> ToolOutcome {
        match self.execute(name, args).await {
            Ok(output) => {
                debug!(
                    tool = name,
                    chars = output.content.len(),
                    sources = output.sources.len(),
                    "Tool executed"
                );
                ToolOutcome {
                    content: output.content,
                    sources: output.sources,
                    is_error: false,
                }
            }
            Err(e) => {
                warn!(tool = name, error = %e, "Tool execution failed");
                ToolOutcome {
                    content: format!("Error executing tool '{}': {}", name, e),
                    sources: Vec::new(),
                    is_error: true,
                }
            }
        }
    }

    /// Get a list of all registered tool names
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a tool is registered
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AppError;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes its text argument"
        }

        fn parameters_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": {"text": {"type": "string"}},
                "required": ["text"]
            })
        }

        async fn execute(&self, args: Value) -> Result<ToolOutput> {
            let text = args["text"]
                .as_str()
                .ok_or_else(|| AppError::InvalidInput("text is required".to_string()))?;
            Ok(ToolOutput {
                content: text.to_string(),
                sources: vec![Source::new("echo", None)],
            })
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        registry
    }

    #[test]
    fn test_registry_creation() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.tool_names().len(), 0);
    }

    #[test]
    fn test_get_tool_definitions() {
        let definitions = registry().get_tool_definitions();

        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].name, "echo");
        assert!(definitions[0].parameters.is_object());
    }

    #[tokio::test]
    async fn test_run_success() {
        let outcome = registry().run("echo", json!({"text": "hi"})).await;

        assert!(!outcome.is_error);
        assert_eq!(outcome.content, "hi");
        assert_eq!(outcome.sources.len(), 1);
    }

    #[tokio::test]
    async fn test_run_bad_arguments_becomes_message() {
        let outcome = registry().run("echo", json!({})).await;

        assert!(outcome.is_error);
        assert!(outcome.content.contains("text is required"));
        assert!(outcome.sources.is_empty());
    }

    #[tokio::test]
    async fn test_nonexistent_tool() {
        let registry = registry();

        assert!(registry.execute("nonexistent_tool", json!({})).await.is_err());

        let outcome = registry.run("nonexistent_tool", json!({})).await;
        assert!(outcome.is_error);
        assert!(outcome.content.contains("Tool not found: nonexistent_tool"));
    }
}
