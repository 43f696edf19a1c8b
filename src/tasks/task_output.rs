//! Task output representation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::llms::base_llm::LLMMessage;

/// The result of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub description: String,
    pub name: Option<String>,
    pub expected_output: Option<String>,
    /// First ten words of the description.
    pub summary: Option<String>,
    /// Raw output of the task.
    pub raw: String,
    /// Role of the agent that executed the task.
    pub agent: String,
    /// Messages exchanged with the model.
    #[serde(default)]
    pub messages: Vec<LLMMessage>,
}

impl TaskOutput {
    /// Create a new TaskOutput with summary auto-generated from description.
    pub fn new(description: impl Into<String>, agent: impl Into<String>, raw: impl Into<String>) -> Self {
        let description = description.into();
        let summary = Self::generate_summary(&description);
        Self {
            description,
            name: None,
            expected_output: None,
            summary: Some(summary),
            raw: raw.into(),
            agent: agent.into(),
            messages: Vec::new(),
        }
    }

    fn generate_summary(description: &str) -> String {
        let excerpt: String = description
            .split_whitespace()
            .take(10)
            .collect::<Vec<&str>>()
            .join(" ");
        format!("{}...", excerpt)
    }
}

impl fmt::Display for TaskOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}
