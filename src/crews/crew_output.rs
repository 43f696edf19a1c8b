//! Crew output representation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tasks::task_output::TaskOutput;
use crate::types::usage_metrics::UsageMetrics;

/// The result of a crew run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrewOutput {
    /// Raw output of the final task.
    pub raw: String,
    /// Output of each task, in execution order.
    pub tasks_output: Vec<TaskOutput>,
    /// Token usage summed over the crew's agents.
    pub token_usage: UsageMetrics,
}

impl CrewOutput {
    pub fn new(raw: String, tasks_output: Vec<TaskOutput>, token_usage: UsageMetrics) -> Self {
        Self {
            raw,
            tasks_output,
            token_usage,
        }
    }
}

impl fmt::Display for CrewOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}
