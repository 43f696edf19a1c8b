//! Parsing of ReAct-style LLM responses.
//!
//! A response is either an action request:
//!
//! ```text
//! Thought: I should look this up
//! Action: Search the internet with Serper
//! Action Input: {"search_query": "Kyoto ryokan mid-range"}
//! ```
//!
//! or a final answer:
//!
//! ```text
//! Thought: I now know the final answer
//! Final Answer: ...
//! ```

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const FINAL_ANSWER_ACTION: &str = "Final Answer:";

const MISSING_ACTION_AFTER_THOUGHT_ERROR_MESSAGE: &str =
    "I just got this: I couldn't find an Action after the Thought.";

const MISSING_ACTION_INPUT_AFTER_ACTION_ERROR_MESSAGE: &str =
    "I just got this: I found an Action but couldn't find a valid Action Input right after it.";

static ACTION_INPUT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)Action\s*\d*\s*:\s*(.+?)\s*(?:\n|\r\n?)Action\s*\d*\s*Input\s*\d*\s*:\s*(.*)")
        .unwrap()
});
static ACTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Action\s*\d*\s*:").unwrap());
static ACTION_INPUT_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Action\s*\d*\s*Input\s*\d*\s*:").unwrap());

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentAction {
    pub thought: String,
    /// Name of the tool to use.
    pub tool: String,
    /// Raw tool input, usually a JSON object.
    pub tool_input: String,
    /// The text that was parsed.
    pub text: String,
    /// Observation from running the tool.
    pub result: Option<String>,
}

/// The model's final answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentFinish {
    pub thought: String,
    pub output: String,
    pub text: String,
}

/// The response did not follow the expected format.
///
/// The message is fed back to the model as an observation.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputParserError {
    pub error: String,
}

impl OutputParserError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

impl fmt::Display for OutputParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for OutputParserError {}

/// Result of parsing agent output.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseResult {
    Action(AgentAction),
    Finish(AgentFinish),
}

/// Parse agent output text into an action or a final answer.
///
/// A final answer wins when both are present.
pub fn parse(text: &str) -> Result<ParseResult, OutputParserError> {
    let thought = extract_thought(text);

    if text.contains(FINAL_ANSWER_ACTION) {
        let final_answer = text
            .rsplit(FINAL_ANSWER_ACTION)
            .next()
            .unwrap_or_default()
            .trim();

        return Ok(ParseResult::Finish(AgentFinish {
            thought,
            output: clean_trailing_backticks(final_answer),
            text: text.to_string(),
        }));
    }

    if let Some(caps) = ACTION_INPUT_RE.captures(text) {
        let action = caps.get(1).map_or("", |m| m.as_str());
        let action_input = caps.get(2).map_or("", |m| m.as_str()).trim();
        let tool_input = action_input.trim_matches('"');

        return Ok(ParseResult::Action(AgentAction {
            thought,
            tool: clean_action(action),
            tool_input: safe_repair_json(tool_input),
            text: text.to_string(),
            result: None,
        }));
    }

    if !ACTION_RE.is_match(text) {
        return Err(OutputParserError::new(format!(
            "{}\nYou MUST use the following format:\n\
             Thought: [your thought]\n\
             Final Answer: [your final answer]",
            MISSING_ACTION_AFTER_THOUGHT_ERROR_MESSAGE
        )));
    }

    if !ACTION_INPUT_ONLY_RE.is_match(text) {
        return Err(OutputParserError::new(
            MISSING_ACTION_INPUT_AFTER_ACTION_ERROR_MESSAGE,
        ));
    }

    Err(OutputParserError::new(
        "Could not parse the output. Please use the correct format.",
    ))
}

fn extract_thought(text: &str) -> String {
    let thought_index = text.find("\nAction").or_else(|| text.find("\nFinal Answer"));
    match thought_index {
        Some(idx) => text[..idx].replace("```", "").trim().to_string(),
        None => String::new(),
    }
}

/// Strip markdown emphasis around a tool name.
fn clean_action(text: &str) -> String {
    text.trim().trim_matches('*').trim().to_string()
}

/// Drop an unmatched trailing code fence.
fn clean_trailing_backticks(text: &str) -> String {
    if text.ends_with("```") && text.matches("```").count() % 2 != 0 {
        return text[..text.len() - 3].trim_end().to_string();
    }
    text.to_string()
}

/// Replace triple quotes when that yields valid JSON.
fn safe_repair_json(tool_input: &str) -> String {
    if tool_input.starts_with('[') && tool_input.ends_with(']') {
        return tool_input.to_string();
    }

    let cleaned = tool_input.replace("\"\"\"", "\"");
    if serde_json::from_str::<Value>(&cleaned).is_ok() {
        return cleaned;
    }
    tool_input.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_final_answer() {
        let text = "Thought: I know the answer\nFinal Answer: Stay near Gion.";
        match parse(text).unwrap() {
            ParseResult::Finish(finish) => {
                assert_eq!(finish.output, "Stay near Gion.");
                assert_eq!(finish.thought, "Thought: I know the answer");
            }
            other => panic!("Expected AgentFinish, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_action_with_json_input() {
        let text = "Thought: I need to search\nAction: Search the internet with Serper\nAction Input: {\"search_query\": \"Kyoto kaiseki\"}";
        match parse(text).unwrap() {
            ParseResult::Action(action) => {
                assert_eq!(action.tool, "Search the internet with Serper");
                assert_eq!(action.tool_input, "{\"search_query\": \"Kyoto kaiseki\"}");
                assert_eq!(action.thought, "Thought: I need to search");
            }
            other => panic!("Expected AgentAction, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_action_strips_markdown() {
        let text = "Action: **search**\nAction Input: \"plain text\"";
        match parse(text).unwrap() {
            ParseResult::Action(action) => {
                assert_eq!(action.tool, "search");
                assert_eq!(action.tool_input, "plain text");
            }
            other => panic!("Expected AgentAction, got {other:?}"),
        }
    }

    #[test]
    fn test_final_answer_wins_over_action() {
        let text = "Action: search\nAction Input: {}\nFinal Answer: done";
        assert!(matches!(parse(text).unwrap(), ParseResult::Finish(_)));
    }

    #[test]
    fn test_trailing_backticks_removed() {
        let text = "Final Answer: ```json\n{\"a\": 1}\n```\n```";
        match parse(text).unwrap() {
            ParseResult::Finish(finish) => assert_eq!(finish.output, "```json\n{\"a\": 1}\n```"),
            other => panic!("Expected AgentFinish, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_missing_action() {
        let err = parse("Thought: I need to do something").unwrap_err();
        assert!(err.error.contains("couldn't find an Action"));
    }

    #[test]
    fn test_parse_missing_action_input() {
        let err = parse("Thought: hmm\nAction: search").unwrap_err();
        assert!(err.error.contains("couldn't find a valid Action Input"));
    }
}
