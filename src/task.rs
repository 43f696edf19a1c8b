//! The `Task`: a description and expected output bound to an agent role.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::Agent;
use crate::tasks::task_output::TaskOutput;
use crate::utilities::errors::{CrewError, Result};
use crate::utilities::i18n::I18N;

/// A task to be executed by an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub name: Option<String>,
    /// Descriptive text detailing the task's purpose and execution.
    pub description: String,
    /// Clear definition of expected task outcome.
    pub expected_output: String,
    /// Role of the agent responsible for execution.
    pub agent: Option<String>,
    /// Output of the last execution.
    pub output: Option<TaskOutput>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip)]
    original_description: Option<String>,
    #[serde(skip)]
    original_expected_output: Option<String>,
}

impl Task {
    pub fn new(description: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: None,
            description: description.into(),
            expected_output: expected_output.into(),
            agent: None,
            output: None,
            start_time: None,
            end_time: None,
            original_description: None,
            original_expected_output: None,
        }
    }

    /// Bind the task to an agent.
    pub fn with_agent(mut self, agent: &Agent) -> Self {
        self.agent = Some(agent.role.clone());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The prompt handed to the agent: description plus expected output.
    pub fn prompt(&self, i18n: &I18N) -> Result<String> {
        let expected = i18n
            .slice("expected_output")?
            .replace("{expected_output}", &self.expected_output);
        Ok(format!("{}{}", self.description, expected))
    }

    /// Execute the task with `agent`.
    pub async fn execute(
        &mut self,
        agent: &mut Agent,
        context: Option<&str>,
        memory_context: Option<&str>,
    ) -> Result<TaskOutput> {
        if let Some(ref role) = self.agent {
            if role != &agent.role {
                return Err(CrewError::TaskExecution(format!(
                    "Task is bound to agent '{}' but was given agent '{}'",
                    role, agent.role
                )));
            }
        }

        self.start_time = Some(Utc::now());
        let task_prompt = self.prompt(&agent.i18n)?;
        let raw = agent.execute_task(&task_prompt, context, memory_context).await?;

        let mut output = TaskOutput::new(self.description.clone(), agent.role.clone(), raw);
        output.name = self.name.clone().or_else(|| Some(self.description.clone()));
        output.expected_output = Some(self.expected_output.clone());
        output.messages = agent.last_messages.clone();

        self.output = Some(output.clone());
        self.end_time = Some(Utc::now());
        log::debug!(
            "Task {} finished in {:?}s",
            self.id,
            self.execution_duration()
        );
        Ok(output)
    }

    /// Execution duration in seconds, if both start and end times are set.
    pub fn execution_duration(&self) -> Option<f64> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds() as f64 / 1000.0),
            _ => None,
        }
    }

    /// Replace `{key}` placeholders in the description and expected output.
    ///
    /// Interpolation always starts from the original text, so it can be
    /// applied repeatedly with different inputs.
    pub fn interpolate_inputs(&mut self, inputs: &HashMap<String, String>) {
        let description = self
            .original_description
            .get_or_insert_with(|| self.description.clone())
            .clone();
        let expected_output = self
            .original_expected_output
            .get_or_insert_with(|| self.expected_output.clone())
            .clone();

        if inputs.is_empty() {
            return;
        }
        self.description = interpolate_string(&description, inputs);
        self.expected_output = interpolate_string(&expected_output, inputs);
    }
}

fn interpolate_string(template: &str, inputs: &HashMap<String, String>) -> String {
    inputs.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("{{{}}}", key), value)
    })
}
