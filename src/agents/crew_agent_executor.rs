//! Agent executor: the ReAct loop between an agent's LLM and its tools.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::parser::{self, AgentAction, AgentFinish, ParseResult};
use crate::llms::base_llm::{BaseLLM, LLMMessage};
use crate::tools::base_tool::{render_text_description_and_args, tool_names, BaseTool};
use crate::utilities::errors::{CrewError, Result};
use crate::utilities::i18n::I18N;
use crate::utilities::logger::Logger;
use crate::utilities::printer::PrinterColor;

/// Stop sequence that ends each model turn before it invents an observation.
pub const OBSERVATION_STOP: &str = "\nObservation:";

/// Drives one agent through one task.
pub struct CrewAgentExecutor {
    pub llm: Arc<dyn BaseLLM>,
    pub tools: Vec<Arc<dyn BaseTool>>,
    /// Role of the agent, for logs and errors.
    pub role: String,
    pub stop: Vec<String>,
    /// Maximum iterations before forcing a final answer.
    pub max_iter: u32,
    pub i18n: I18N,
    pub logger: Logger,
    /// Conversation message history.
    pub messages: Vec<LLMMessage>,
    /// Current iteration count.
    pub iterations: u32,
}

impl fmt::Debug for CrewAgentExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrewAgentExecutor")
            .field("role", &self.role)
            .field("model", &self.llm.model())
            .field("max_iter", &self.max_iter)
            .field("iterations", &self.iterations)
            .field("messages_count", &self.messages.len())
            .field("tools_count", &self.tools.len())
            .finish()
    }
}

impl CrewAgentExecutor {
    pub fn new(
        llm: Arc<dyn BaseLLM>,
        tools: Vec<Arc<dyn BaseTool>>,
        role: impl Into<String>,
        max_iter: u32,
    ) -> Self {
        Self {
            llm,
            tools,
            role: role.into(),
            stop: vec![OBSERVATION_STOP.to_string()],
            max_iter,
            i18n: I18N::default(),
            logger: Logger::default(),
            messages: Vec::new(),
            iterations: 0,
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Run the loop until the model gives a final answer.
    ///
    /// `system` and `user` are prompt templates; `{input}`, `{tools}` and
    /// `{tool_names}` are filled from `input` and the executor's tools.
    pub async fn invoke(&mut self, system: &str, user: &str, input: &str) -> Result<AgentFinish> {
        self.messages.clear();
        self.iterations = 0;
        self.messages.push(LLMMessage::system(self.format_prompt(system, input)));
        self.messages.push(LLMMessage::user(self.format_prompt(user, input)));

        self.invoke_loop_react().await
    }

    fn format_prompt(&self, prompt: &str, input: &str) -> String {
        prompt
            .replace("{tools}", &render_text_description_and_args(&self.tools))
            .replace("{tool_names}", &tool_names(&self.tools))
            .replace("{input}", input)
    }

    async fn invoke_loop_react(&mut self) -> Result<AgentFinish> {
        loop {
            if self.iterations >= self.max_iter {
                return self.handle_max_iterations_exceeded().await;
            }

            let answer = self.llm.call(&self.messages, &self.stop).await?;
            self.iterations += 1;
            log::debug!(
                "Agent '{}' iteration {}/{}",
                self.role,
                self.iterations,
                self.max_iter
            );

            match parser::parse(&answer) {
                Ok(ParseResult::Finish(finish)) => {
                    self.messages.push(LLMMessage::assistant(answer));
                    self.logger.log(
                        "info",
                        &format!("Agent: {}\nFinal Answer:\n{}", self.role, finish.output),
                        Some(PrinterColor::BoldGreen),
                    );
                    return Ok(finish);
                }
                Ok(ParseResult::Action(mut action)) => {
                    let observation = self.execute_tool(&action).await?;
                    self.logger.log(
                        "info",
                        &format!(
                            "Agent: {}\nUsing tool: {}\nTool Input: {}\nTool Output: {}",
                            self.role, action.tool, action.tool_input, observation
                        ),
                        Some(PrinterColor::BoldPurple),
                    );
                    self.messages.push(LLMMessage::assistant(format!(
                        "{}\nObservation: {}",
                        answer, observation
                    )));
                    action.result = Some(observation);
                }
                Err(parse_error) => {
                    log::debug!("Agent '{}' output not parseable: {}", self.role, parse_error);
                    self.messages.push(LLMMessage::assistant(answer));
                    self.messages.push(LLMMessage::user(parse_error.error));
                }
            }
        }
    }

    /// Ask for a final answer one last time.
    async fn handle_max_iterations_exceeded(&mut self) -> Result<AgentFinish> {
        log::warn!(
            "Agent '{}' reached max iterations ({}), forcing final answer",
            self.role,
            self.max_iter
        );
        self.messages
            .push(LLMMessage::assistant(self.i18n.slice("force_final_answer")?));

        let answer = self.llm.call(&self.messages, &self.stop).await?;
        match parser::parse(&answer) {
            Ok(ParseResult::Finish(finish)) => {
                self.messages.push(LLMMessage::assistant(answer));
                Ok(finish)
            }
            _ => Err(CrewError::MaxIterations {
                role: self.role.clone(),
                max_iter: self.max_iter,
            }),
        }
    }

    /// Run the requested tool and return the observation text.
    ///
    /// Unknown tools, bad inputs and tool failures become observations.
    async fn execute_tool(&self, action: &AgentAction) -> Result<String> {
        let wanted = action.tool.trim().to_lowercase();
        let tool = match self
            .tools
            .iter()
            .find(|t| t.name().trim().to_lowercase() == wanted)
        {
            Some(tool) => tool,
            None => {
                return Ok(self
                    .i18n
                    .errors("wrong_tool_name")?
                    .replace("{tool}", &action.tool)
                    .replace("{tools}", &tool_names(&self.tools)));
            }
        };

        let args = match parse_tool_input(&action.tool_input) {
            Some(args) => args,
            None => return self.i18n.errors("tool_arguments_error"),
        };

        match tool.run(args).await {
            Ok(output) => Ok(output),
            Err(e) => {
                log::warn!("Tool '{}' failed: {}", tool.name(), e);
                Ok(self
                    .i18n
                    .errors("tool_usage_error")?
                    .replace("{error}", &e.to_string())
                    .replace("{tool}", tool.name())
                    .replace("{tool_inputs}", &tool.args_schema().to_string()))
            }
        }
    }
}

/// Parse an `Action Input` as a JSON object. An empty input is no arguments.
fn parse_tool_input(input: &str) -> Option<HashMap<String, Value>> {
    let input = input.trim();
    if input.is_empty() {
        return Some(HashMap::new());
    }
    match serde_json::from_str::<Value>(input).ok()? {
        Value::Object(map) => Some(map.into_iter().collect()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llms::base_llm::MessageRole;
    use crate::testing::{FakeLLM, FakeTool};

    const SYSTEM: &str = "You are a guide.\nTools:\n{tools}\nNames: {tool_names}";
    const USER: &str = "Current Task: {input}";

    #[test]
    fn test_parse_tool_input() {
        let args = parse_tool_input(r#"{"search_query": "kyoto"}"#).unwrap();
        assert_eq!(args["search_query"], "kyoto");
        assert!(parse_tool_input("  ").unwrap().is_empty());
        assert!(parse_tool_input("[1, 2]").is_none());
        assert!(parse_tool_input("not json").is_none());
    }

    #[tokio::test]
    async fn test_direct_final_answer() {
        let llm = Arc::new(FakeLLM::new(["Thought: easy\nFinal Answer: Visit Fushimi Inari"]));
        let mut executor = CrewAgentExecutor::new(llm.clone(), vec![], "Guide", 5);

        let finish = executor.invoke(SYSTEM, USER, "Plan a day").await.unwrap();
        assert_eq!(finish.output, "Visit Fushimi Inari");
        assert_eq!(executor.iterations, 1);

        let calls = llm.calls();
        assert_eq!(calls[0][0].role, MessageRole::System);
        assert_eq!(calls[0][1].content, "Current Task: Plan a day");
        assert_eq!(llm.stops()[0], vec![OBSERVATION_STOP.to_string()]);
    }

    #[tokio::test]
    async fn test_tool_call_then_final_answer() {
        let llm = Arc::new(FakeLLM::new([
            "Thought: search first\nAction: search\nAction Input: {\"search_query\": \"kyoto food\"}",
            "Thought: I now know the final answer\nFinal Answer: Eat at Nishiki Market",
        ]));
        let tool = Arc::new(FakeTool::new("search", "Nishiki Market is a food street"));
        let mut executor = CrewAgentExecutor::new(llm.clone(), vec![tool.clone()], "Guide", 5);

        let finish = executor.invoke(SYSTEM, USER, "Where to eat?").await.unwrap();
        assert_eq!(finish.output, "Eat at Nishiki Market");
        assert_eq!(executor.iterations, 2);

        let calls = tool.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0]["search_query"], "kyoto food");

        let llm_calls = llm.calls();
        assert!(llm_calls[0][0].content.contains("Tool Name: search"));
        assert!(llm_calls[0][0].content.contains("Names: search"));
        let observed = &llm_calls[1][2];
        assert_eq!(observed.role, MessageRole::Assistant);
        assert!(observed
            .content
            .ends_with("Observation: Nishiki Market is a food street"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_fed_back() {
        let llm = Arc::new(FakeLLM::new([
            "Action: teleport\nAction Input: {}",
            "Final Answer: fine",
        ]));
        let tool = Arc::new(FakeTool::new("search", "unused"));
        let mut executor = CrewAgentExecutor::new(llm.clone(), vec![tool.clone()], "Guide", 5);

        executor.invoke(SYSTEM, USER, "x").await.unwrap();
        assert!(tool.calls().is_empty());
        let observation = &llm.calls()[1][2].content;
        assert!(observation.contains("You tried to use the tool teleport, but it doesn't exist"));
    }

    #[tokio::test]
    async fn test_tool_failure_is_fed_back() {
        let llm = Arc::new(FakeLLM::new([
            "Action: search\nAction Input: {\"search_query\": \"q\"}",
            "Final Answer: recovered",
        ]));
        let tool = Arc::new(FakeTool::failing("search", "quota exceeded"));
        let mut executor = CrewAgentExecutor::new(llm.clone(), vec![tool], "Guide", 5);

        let finish = executor.invoke(SYSTEM, USER, "x").await.unwrap();
        assert_eq!(finish.output, "recovered");
        assert!(llm.calls()[1][2].content.contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_parse_error_is_fed_back_as_user_message() {
        let llm = Arc::new(FakeLLM::new(["I am just rambling", "Final Answer: ok"]));
        let mut executor = CrewAgentExecutor::new(llm.clone(), vec![], "Guide", 5);

        executor.invoke(SYSTEM, USER, "x").await.unwrap();
        let second = &llm.calls()[1];
        assert_eq!(second[2].content, "I am just rambling");
        assert_eq!(second[3].role, MessageRole::User);
        assert!(second[3].content.contains("couldn't find an Action"));
    }

    #[tokio::test]
    async fn test_max_iterations_forces_final_answer() {
        let llm = Arc::new(FakeLLM::new([
            "Thought: still thinking",
            "Thought: still thinking",
            "Final Answer: forced",
        ]));
        let mut executor = CrewAgentExecutor::new(llm.clone(), vec![], "Guide", 2);

        let finish = executor.invoke(SYSTEM, USER, "x").await.unwrap();
        assert_eq!(finish.output, "forced");
        let last_call = llm.calls().pop().unwrap();
        assert!(last_call
            .iter()
            .any(|m| m.content.contains("MUST give your absolute best final answer")));
    }

    #[tokio::test]
    async fn test_max_iterations_error_without_final_answer() {
        let llm = Arc::new(FakeLLM::new(["Thought: a", "Thought: b"]));
        let mut executor = CrewAgentExecutor::new(llm, vec![], "Guide", 1);

        let err = executor.invoke(SYSTEM, USER, "x").await.unwrap_err();
        assert!(matches!(err, CrewError::MaxIterations { max_iter: 1, .. }));
    }

    #[tokio::test]
    async fn test_llm_error_propagates() {
        let llm = Arc::new(FakeLLM::new(Vec::<&str>::new()));
        let mut executor = CrewAgentExecutor::new(llm, vec![], "Guide", 3);
        assert!(matches!(
            executor.invoke(SYSTEM, USER, "x").await,
            Err(CrewError::Llm(_))
        ));
    }
}
