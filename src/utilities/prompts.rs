//! Prompt assembly for agents.

use crate::utilities::errors::Result;
use crate::utilities::i18n::I18N;

/// System and user prompt templates for one task execution.
///
/// Templates still carry `{input}`, `{tools}` and `{tool_names}`
/// placeholders; the executor fills them in.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemPromptResult {
    pub system: String,
    pub user: String,
}

/// Component identifiers for prompt building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptComponent {
    RolePlaying,
    Tools,
    NoTools,
    Task,
    TaskNoTools,
}

impl PromptComponent {
    fn as_str(&self) -> &'static str {
        match self {
            Self::RolePlaying => "role_playing",
            Self::Tools => "tools",
            Self::NoTools => "no_tools",
            Self::Task => "task",
            Self::TaskNoTools => "task_no_tools",
        }
    }
}

/// Agent fields interpolated into the prompts.
pub struct AgentInfo<'a> {
    pub role: &'a str,
    pub goal: &'a str,
    pub backstory: &'a str,
}

/// Builds the prompts for an agent.
#[derive(Debug, Clone, Default)]
pub struct Prompts {
    pub i18n: I18N,
    /// Indicates if the agent has access to tools.
    pub has_tools: bool,
}

impl Prompts {
    pub fn new(i18n: I18N, has_tools: bool) -> Self {
        Self { i18n, has_tools }
    }

    /// Generate the system and user prompts for task execution.
    pub fn task_execution(&self, agent: &AgentInfo<'_>) -> Result<SystemPromptResult> {
        let (tools_slice, task_slice) = if self.has_tools {
            (PromptComponent::Tools, PromptComponent::Task)
        } else {
            (PromptComponent::NoTools, PromptComponent::TaskNoTools)
        };

        Ok(SystemPromptResult {
            system: self.build_prompt(&[PromptComponent::RolePlaying, tools_slice], agent)?,
            user: self.build_prompt(&[task_slice], agent)?,
        })
    }

    fn build_prompt(&self, components: &[PromptComponent], agent: &AgentInfo<'_>) -> Result<String> {
        let mut prompt = String::new();
        for component in components {
            prompt.push_str(&self.i18n.slice(component.as_str())?);
        }
        Ok(prompt
            .replace("{goal}", agent.goal)
            .replace("{role}", agent.role)
            .replace("{backstory}", agent.backstory))
    }
}
