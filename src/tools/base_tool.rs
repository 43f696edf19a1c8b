//! Tool abstractions.
//!
//! Provides the [`BaseTool`] trait agents call through and the text
//! rendering of tool descriptions that goes into the agent's system prompt.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::utilities::errors::Result;

// ---------------------------------------------------------------------------
// BaseTool trait
// ---------------------------------------------------------------------------

/// Interface for tools an agent can call.
///
/// Tools are shared between agents as `Arc<dyn BaseTool>`, so `run` takes
/// `&self`.
#[async_trait]
pub trait BaseTool: Send + Sync + fmt::Debug {
    /// The unique name of the tool that clearly communicates its purpose.
    fn name(&self) -> &str;

    /// Description used to tell the model how/when/why to use the tool.
    fn description(&self) -> &str;

    /// JSON schema for the arguments that the tool accepts.
    fn args_schema(&self) -> Value {
        Value::Object(serde_json::Map::new())
    }

    /// Run the tool with the arguments the model supplied.
    async fn run(&self, args: HashMap<String, Value>) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render one tool as the block shown to the model.
pub fn render_tool_description(tool: &dyn BaseTool) -> String {
    format!(
        "Tool Name: {}\nTool Arguments: {}\nTool Description: {}",
        tool.name(),
        tool.args_schema(),
        tool.description()
    )
}

/// Render every tool, one block per tool.
pub fn render_text_description_and_args(tools: &[Arc<dyn BaseTool>]) -> String {
    tools
        .iter()
        .map(|t| render_tool_description(t.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Comma-separated tool names, as used in the `Action:` instructions.
pub fn tool_names(tools: &[Arc<dyn BaseTool>]) -> String {
    tools
        .iter()
        .map(|t| t.name())
        .collect::<Vec<_>>()
        .join(", ")
}
