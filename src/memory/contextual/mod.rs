//! Contextual memory: turns stored memories into prompt context for a task.

use crate::memory::external::ExternalMemory;
use crate::utilities::errors::Result;

/// Number of memories pulled into a task prompt.
pub const CONTEXT_LIMIT: usize = 5;
/// Minimum relevance score for a memory to be used.
pub const CONTEXT_SCORE_THRESHOLD: f64 = 0.6;

/// Aggregates memory sources into a context block.
#[derive(Debug, Clone)]
pub struct ContextualMemory {
    /// External memory instance.
    pub exm: Option<ExternalMemory>,
}

impl ContextualMemory {
    pub fn new(exm: Option<ExternalMemory>) -> Self {
        Self { exm }
    }

    /// Build the memory context for a task.
    ///
    /// Returns an empty string when there is nothing to query or nothing
    /// relevant was found.
    pub async fn build_context_for_task(&self, task_description: &str, context: &str) -> Result<String> {
        let query = format!("{} {}", task_description, context).trim().to_string();
        if query.is_empty() {
            return Ok(String::new());
        }
        self.fetch_external_context(&query).await
    }

    async fn fetch_external_context(&self, query: &str) -> Result<String> {
        let exm = match &self.exm {
            Some(e) => e,
            None => return Ok(String::new()),
        };

        let results = exm.search(query, CONTEXT_LIMIT, CONTEXT_SCORE_THRESHOLD).await?;
        let formatted: Vec<String> = results
            .iter()
            .filter_map(|r| r.get("content").and_then(|c| c.as_str()))
            .map(|c| format!("- {}", c))
            .collect();

        if formatted.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("User memories/preferences:\n{}", formatted.join("\n")))
    }
}
