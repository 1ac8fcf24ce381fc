use std::error::Error as StdError;
use thiserror::Error;

use super::ToolResult;

/// A type alias for a boxed error that is thread-safe.
type BoxedError = Box<dyn StdError + Send + Sync>;

/// Errors raised while binding a `tool_use` block to a registered tool or
/// while running it.
///
/// Resolution returns these as plain data; nothing here is raised out of the
/// stream engine.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool with this name is registered.
    #[error("Tool not found: {name}")]
    NotFound { name: String },

    /// The `input` of the tool use does not fit the tool's argument type.
    #[error("Input deserialization failed for tool '{name}'")]
    InputDeserialization {
        name: String,
        #[source]
        error: BoxedError,
    },

    /// The tool ran and reported its own failure.
    #[error("Tool execution failed for tool '{name}'")]
    Execution {
        name: String,
        #[source]
        error: BoxedError,
    },

    /// The tool succeeded but its output could not be serialized.
    #[error("Output serialization failed for tool '{name}'")]
    OutputSerialization {
        name: String,
        #[source]
        error: BoxedError,
    },
}

impl ToolError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn input_deserialization(
        name: impl Into<String>,
        error: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::InputDeserialization {
            name: name.into(),
            error: Box::new(error),
        }
    }

    /// Wraps a tool-defined failure, which only needs to be displayable.
    pub fn execution(name: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::Execution {
            name: name.into(),
            error: error.to_string().into(),
        }
    }

    pub fn output_serialization(
        name: impl Into<String>,
        error: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::OutputSerialization {
            name: name.into(),
            error: Box::new(error),
        }
    }

    pub fn tool_name(&self) -> &str {
        match self {
            Self::NotFound { name }
            | Self::InputDeserialization { name, .. }
            | Self::Execution { name, .. }
            | Self::OutputSerialization { name, .. } => name,
        }
    }

    /// Renders this error as an `is_error` tool result answering `tool_use_id`.
    pub fn into_tool_result(self, tool_use_id: impl Into<String>) -> ToolResult {
        let message = match &self {
            Self::NotFound { .. } => self.to_string(),
            Self::InputDeserialization { error, .. }
            | Self::Execution { error, .. }
            | Self::OutputSerialization { error, .. } => format!("{self}: {error}"),
        };
        ToolResult::error(tool_use_id, message)
    }
}
