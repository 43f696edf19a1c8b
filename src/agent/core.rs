//! The `Agent`: a role-described actor that executes tasks with an LLM and tools.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::agents::crew_agent_executor::CrewAgentExecutor;
use crate::llms::base_llm::{BaseLLM, LLMMessage};
use crate::tools::base_tool::BaseTool;
use crate::types::usage_metrics::UsageMetrics;
use crate::utilities::errors::{CrewError, Result};
use crate::utilities::i18n::I18N;
use crate::utilities::logger::Logger;
use crate::utilities::printer::{Printer, PrinterColor};
use crate::utilities::prompts::{AgentInfo, Prompts};

/// Default iteration budget of the agent loop.
pub const DEFAULT_MAX_ITER: u32 = 25;

/// An agent in a crew.
///
/// Each agent has a role, a goal, a backstory and a language model. Tools
/// and the model handle are shared (`Arc`), so agents clone cheaply.
#[derive(Debug, Clone)]
pub struct Agent {
    // ---- Identity ----
    pub id: Uuid,
    /// Role of the agent. Tasks refer to their agent by role.
    pub role: String,
    pub goal: String,
    pub backstory: String,

    // ---- Configuration ----
    /// Print progress while executing.
    pub verbose: bool,
    /// Enable agent to delegate and ask questions among each other.
    ///
    /// Recorded only; this runtime has no delegation tools.
    pub allow_delegation: bool,
    /// Whether the crew injects stored memories into this agent's tasks.
    pub memory: bool,
    /// Maximum iterations for an agent to execute a task.
    pub max_iter: u32,
    /// Maximum execution time for one task, in seconds.
    pub max_execution_time: Option<u64>,
    pub tools: Vec<Arc<dyn BaseTool>>,
    pub llm: Option<Arc<dyn BaseLLM>>,
    pub i18n: I18N,

    // ---- Runtime ----
    printer: Printer,
    /// Messages of the last execution.
    pub last_messages: Vec<LLMMessage>,
}

impl Agent {
    /// Create a new Agent with required fields.
    pub fn new(role: impl Into<String>, goal: impl Into<String>, backstory: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
            verbose: false,
            allow_delegation: false,
            memory: false,
            max_iter: DEFAULT_MAX_ITER,
            max_execution_time: None,
            tools: Vec::new(),
            llm: None,
            i18n: I18N::default(),
            printer: Printer::default(),
            last_messages: Vec::new(),
        }
    }

    pub fn with_llm(mut self, llm: Arc<dyn BaseLLM>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn BaseTool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_memory(mut self, memory: bool) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_allow_delegation(mut self, allow_delegation: bool) -> Self {
        self.allow_delegation = allow_delegation;
        self
    }

    pub fn with_max_iter(mut self, max_iter: u32) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_printer(mut self, printer: Printer) -> Self {
        self.printer = printer;
        self
    }

    /// Token usage of this agent's LLM handle.
    pub fn token_usage(&self) -> UsageMetrics {
        self.llm
            .as_ref()
            .map(|llm| llm.get_token_usage_summary())
            .unwrap_or_default()
    }

    /// Execute a task prompt and return the final answer.
    ///
    /// `context` is output from earlier tasks; `memory_context` is text
    /// built from stored memories.
    pub async fn execute_task(
        &mut self,
        task_prompt: &str,
        context: Option<&str>,
        memory_context: Option<&str>,
    ) -> Result<String> {
        let llm = self
            .llm
            .clone()
            .ok_or_else(|| CrewError::Validation(format!("Agent '{}' has no LLM configured", self.role)))?;

        log::debug!("Agent '{}' executing task", self.role);
        let input = self.build_task_input(task_prompt, context, memory_context)?;

        let prompts = Prompts::new(self.i18n.clone(), !self.tools.is_empty());
        let prompt = prompts.task_execution(&AgentInfo {
            role: &self.role,
            goal: &self.goal,
            backstory: &self.backstory,
        })?;

        let logger = Logger::with_printer(self.verbose, self.printer.clone());
        logger.log(
            "info",
            &format!("Agent: {}\nTask: {}", self.role, task_prompt),
            Some(PrinterColor::BoldPurple),
        );

        let mut executor = CrewAgentExecutor::new(llm, self.tools.clone(), self.role.clone(), self.max_iter)
            .with_logger(logger);
        executor.i18n = self.i18n.clone();

        let run = executor.invoke(&prompt.system, &prompt.user, &input);
        let finish = match self.max_execution_time {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), run)
                .await
                .map_err(|_| {
                    CrewError::TaskExecution(format!(
                        "Agent '{}' exceeded the maximum execution time of {} seconds",
                        self.role, secs
                    ))
                })??,
            None => run.await?,
        };

        self.last_messages = executor.messages;
        Ok(finish.output)
    }

    fn build_task_input(
        &self,
        task_prompt: &str,
        context: Option<&str>,
        memory_context: Option<&str>,
    ) -> Result<String> {
        let mut input = match context.filter(|c| !c.trim().is_empty()) {
            Some(ctx) => self
                .i18n
                .slice("task_with_context")?
                .replace("{task}", task_prompt)
                .replace("{context}", ctx),
            None => task_prompt.to_string(),
        };

        if let Some(memory) = memory_context.filter(|m| !m.trim().is_empty()) {
            input.push_str(&self.i18n.slice("memory")?.replace("{memory}", memory));
        }
        Ok(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeLLM, FakeTool};

    fn agent(llm: Arc<FakeLLM>) -> Agent {
        Agent::new("Guide", "Help travelers", "You know Kyoto well.").with_llm(llm)
    }

    #[test]
    fn test_defaults() {
        let agent = Agent::new("r", "g", "b");
        assert_eq!(agent.max_iter, 25);
        assert!(!agent.allow_delegation);
        assert!(!agent.memory);
        assert!(agent.llm.is_none());
        assert_eq!(agent.token_usage(), UsageMetrics::default());
    }

    #[tokio::test]
    async fn test_execute_task_without_llm() {
        let mut agent = Agent::new("r", "g", "b");
        let err = agent.execute_task("do it", None, None).await.unwrap_err();
        assert!(matches!(err, CrewError::Validation(_)));
    }

    #[tokio::test]
    async fn test_execute_task_injects_context_and_memory() {
        let llm = Arc::new(FakeLLM::new(["Final Answer: Gion at dusk"]));
        let mut agent = agent(llm.clone());

        let output = agent
            .execute_task(
                "Recommend an evening walk",
                Some("Earlier: arrive Tuesday"),
                Some("User memories/preferences:\n- Avoids tourist traps"),
            )
            .await
            .unwrap();
        assert_eq!(output, "Gion at dusk");

        let calls = llm.calls();
        let system = &calls[0][0].content;
        let user = &calls[0][1].content;
        assert!(system.starts_with("You are Guide. You know Kyoto well.\nYour personal goal is: Help travelers"));
        assert!(user.contains("Recommend an evening walk\n\nThis is the context you're working with:\nEarlier: arrive Tuesday"));
        assert!(user.contains("# Useful context: \nUser memories/preferences:\n- Avoids tourist traps"));
        assert_eq!(agent.last_messages.len(), 3);
    }

    #[tokio::test]
    async fn test_execute_task_with_tools_uses_tool_prompt() {
        let llm = Arc::new(FakeLLM::new(["Final Answer: ok"]));
        let mut agent = agent(llm.clone()).with_tool(Arc::new(FakeTool::new("search", "r")));

        agent.execute_task("t", None, Some("   ")).await.unwrap();
        let calls = llm.calls();
        assert!(calls[0][0].content.contains("Tool Name: search"));
        assert!(!calls[0][1].content.contains("Useful context"));
    }

    #[tokio::test]
    async fn test_execute_task_times_out() {
        let llm = Arc::new(FakeLLM::new(["Final Answer: late"]).with_delay(Duration::from_millis(1500)));
        let mut agent = agent(llm);
        agent.max_execution_time = Some(1);

        let err = agent.execute_task("t", None, None).await.unwrap_err();
        assert!(matches!(err, CrewError::TaskExecution(_)));
    }
}
