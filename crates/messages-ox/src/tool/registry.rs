use std::{collections::BTreeMap, fmt, sync::Arc};

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use super::{Tool, ToolError, ToolResult, ToolUse, schema_for_type};
use crate::response::ChatResponse;

/// A caller-side tool the model may ask to run.
///
/// `Input` is decoded from the `input` of the `tool_use` block and also drives
/// the JSON schema advertised in the tool definition.
#[async_trait]
pub trait ToolFunction: Send + Sync + 'static {
    type Input: DeserializeOwned + JsonSchema + Send + 'static;
    type Output: Serialize + Send;
    type Error: fmt::Display + Send;

    fn name(&self) -> String;

    fn description(&self) -> String;

    async fn invoke(&self, input: Self::Input) -> Result<Self::Output, Self::Error>;

    fn definition(&self) -> Tool {
        Tool::new(self.name(), self.description()).with_schema(schema_for_type::<Self::Input>())
    }
}

/// A tool with its arguments already decoded, waiting to run.
#[async_trait]
trait PreparedInvocation: Send {
    async fn run(self: Box<Self>) -> Result<String, ToolError>;
}

struct Bound<T: ToolFunction> {
    tool: Arc<T>,
    input: T::Input,
}

#[async_trait]
impl<T: ToolFunction> PreparedInvocation for Bound<T> {
    async fn run(self: Box<Self>) -> Result<String, ToolError> {
        let Bound { tool, input } = *self;
        let output = tool
            .invoke(input)
            .await
            .map_err(|e| ToolError::execution(tool.name(), e))?;

        match serde_json::to_value(output) {
            Ok(Value::String(text)) => Ok(text),
            Ok(value) => Ok(value.to_string()),
            Err(e) => Err(ToolError::output_serialization(tool.name(), e)),
        }
    }
}

/// Object-safe face of a registered [`ToolFunction`].
trait ErasedTool: Send + Sync {
    fn definition(&self) -> Tool;

    fn prepare(&self, input: &Value) -> Result<Box<dyn PreparedInvocation>, ToolError>;
}

struct Registered<T>(Arc<T>);

impl<T: ToolFunction> ErasedTool for Registered<T> {
    fn definition(&self) -> Tool {
        self.0.definition()
    }

    fn prepare(&self, input: &Value) -> Result<Box<dyn PreparedInvocation>, ToolError> {
        let input = T::Input::deserialize(input)
            .map_err(|e| ToolError::input_deserialization(self.0.name(), e))?;
        Ok(Box::new(Bound {
            tool: Arc::clone(&self.0),
            input,
        }))
    }
}

/// A `tool_use` block bound to its tool, with decoded arguments.
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// The `input` exactly as the model sent it.
    pub arguments: Value,
    prepared: Box<dyn PreparedInvocation>,
}

impl fmt::Debug for ToolCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolCall")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

impl ToolCall {
    /// Runs the tool, surfacing execution and serialization failures.
    pub async fn try_invoke(self) -> Result<ToolResult, ToolError> {
        let text = self.prepared.run().await?;
        Ok(ToolResult::text(self.id, text))
    }

    /// Runs the tool and always produces a result block to send back; failures
    /// become an `is_error` result.
    pub async fn invoke(self) -> ToolResult {
        let id = self.id.clone();
        match self.try_invoke().await {
            Ok(result) => result,
            Err(e) => {
                log::warn!("Tool `{}` failed: {e}", e.tool_name());
                e.into_tool_result(id)
            }
        }
    }
}

/// Caller-registered tools, looked up by name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn ErasedTool>>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `tool` under its name, replacing any tool already there.
    pub fn register<T: ToolFunction>(&mut self, tool: T) {
        let name = tool.name();
        if self
            .tools
            .insert(name.clone(), Arc::new(Registered(Arc::new(tool))))
            .is_some()
        {
            log::warn!("Replacing previously registered tool `{name}`");
        }
    }

    #[must_use]
    pub fn with_tool<T: ToolFunction>(mut self, tool: T) -> Self {
        self.register(tool);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions of every registered tool, ordered by name.
    pub fn definitions(&self) -> Vec<Tool> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    pub fn resolve(&self, tool_use: &ToolUse) -> Result<ToolCall, ToolError> {
        let tool = self
            .tools
            .get(&tool_use.name)
            .ok_or_else(|| ToolError::not_found(&tool_use.name))?;
        let prepared = tool.prepare(&tool_use.input)?;

        Ok(ToolCall {
            id: tool_use.id.clone(),
            name: tool_use.name.clone(),
            arguments: tool_use.input.clone(),
            prepared,
        })
    }

    /// Resolves every `tool_use` block of `response`, in content order.
    pub fn resolve_all(&self, response: &ChatResponse) -> Vec<Result<ToolCall, ToolError>> {
        response
            .tool_uses()
            .map(|tool_use| self.resolve(tool_use))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct Echo {
        text: String,
    }

    struct EchoTool;

    #[async_trait]
    impl ToolFunction for EchoTool {
        type Input = Echo;
        type Output = String;
        type Error = String;

        fn name(&self) -> String {
            "echo".to_string()
        }

        fn description(&self) -> String {
            "Repeats its input".to_string()
        }

        async fn invoke(&self, input: Echo) -> Result<String, String> {
            if input.text.is_empty() {
                Err("nothing to echo".to_string())
            } else {
                Ok(input.text)
            }
        }
    }

    #[test]
    fn test_definition_carries_schema() {
        let registry = ToolRegistry::new().with_tool(EchoTool);
        let definitions = registry.definitions();

        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].name, "echo");
        assert_eq!(definitions[0].input_schema["properties"]["text"]["type"], "string");
    }

    #[test]
    fn test_resolve_unknown_tool() {
        let registry = ToolRegistry::new().with_tool(EchoTool);
        let tool_use = ToolUse::new("toolu_1", "shout", json!({}));

        assert!(matches!(
            registry.resolve(&tool_use),
            Err(ToolError::NotFound { name }) if name == "shout"
        ));
    }

    #[test]
    fn test_resolve_bad_arguments() {
        let registry = ToolRegistry::new().with_tool(EchoTool);
        let tool_use = ToolUse::new("toolu_1", "echo", json!({"txt": 1}));

        assert!(matches!(
            registry.resolve(&tool_use),
            Err(ToolError::InputDeserialization { .. })
        ));
    }

    #[tokio::test]
    async fn test_invoke_success_and_failure() {
        let registry = ToolRegistry::new().with_tool(EchoTool);

        let ok = registry
            .resolve(&ToolUse::new("toolu_1", "echo", json!({"text": "hi"})))
            .unwrap();
        assert_eq!(ok.arguments, json!({"text": "hi"}));
        let result = ok.invoke().await;
        assert_eq!(result, ToolResult::text("toolu_1", "hi"));

        let failing = registry
            .resolve(&ToolUse::new("toolu_2", "echo", json!({"text": ""})))
            .unwrap();
        let result = failing.invoke().await;
        assert_eq!(result.tool_use_id, "toolu_2");
        assert!(result.is_error());
    }
}
