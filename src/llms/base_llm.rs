//! Base LLM abstraction.
//!
//! Provides the [`BaseLLM`] trait every provider implements, the chat
//! message type shared with the memory layer, and [`BaseLLMState`], the
//! common state (model, credentials, token counters) providers embed.

use std::fmt;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::usage_metrics::UsageMetrics;
use crate::utilities::errors::Result;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single message in an LLM conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LLMMessage {
    pub role: MessageRole,
    pub content: String,
}

impl LLMMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

// ---------------------------------------------------------------------------
// BaseLLM trait
// ---------------------------------------------------------------------------

/// Interface all language-model providers implement.
///
/// Handles are shared between agents as `Arc<dyn BaseLLM>`, so `call` takes
/// `&self` and providers keep their counters behind interior mutability.
#[async_trait]
pub trait BaseLLM: Send + Sync + fmt::Debug {
    /// Model identifier sent to the provider.
    fn model(&self) -> &str;

    /// Provider name.
    fn provider(&self) -> &str {
        "openai"
    }

    /// Whether the provider honours stop sequences.
    fn supports_stop_words(&self) -> bool {
        true
    }

    /// Run one chat completion and return the text of the reply.
    ///
    /// `stop` sequences cut generation; providers also truncate the
    /// returned text at the earliest stop sequence.
    async fn call(&self, messages: &[LLMMessage], stop: &[String]) -> Result<String>;

    /// Token usage accumulated by this handle.
    fn get_token_usage_summary(&self) -> UsageMetrics;
}

// ---------------------------------------------------------------------------
// BaseLLMState
// ---------------------------------------------------------------------------

/// State shared by provider implementations.
#[derive(Debug)]
pub struct BaseLLMState {
    /// The model identifier/name.
    pub model: String,
    /// Optional sampling temperature.
    pub temperature: Option<f64>,
    /// Optional API key.
    pub api_key: Option<String>,
    /// Optional base URL for the API.
    pub base_url: Option<String>,
    /// Provider name (e.g., "openai").
    pub provider: String,
    token_usage: Mutex<UsageMetrics>,
}

impl BaseLLMState {
    /// Create a new `BaseLLMState` for `model`.
    ///
    /// # Panics
    ///
    /// Panics if `model` is empty.
    pub fn new(model: impl Into<String>) -> Self {
        let model = model.into();
        assert!(!model.is_empty(), "Model name is required and cannot be empty");

        Self {
            model,
            temperature: None,
            api_key: None,
            base_url: None,
            provider: "openai".to_string(),
            token_usage: Mutex::new(UsageMetrics::default()),
        }
    }

    /// Record the `usage` object of a provider response.
    pub fn track_token_usage(&self, usage: &Value) {
        self.token_usage.lock().record(usage);
    }

    /// Snapshot of the token counters.
    pub fn get_token_usage_summary(&self) -> UsageMetrics {
        *self.token_usage.lock()
    }

    /// Extract provider from model string (e.g., "openai/gpt-4" -> "openai").
    pub fn extract_provider(model: &str) -> String {
        match model.find('/') {
            Some(idx) => model[..idx].to_string(),
            None => "openai".to_string(),
        }
    }
}

/// Truncate `content` at the earliest occurrence of any stop sequence.
pub fn apply_stop_words(content: &str, stop: &[String]) -> String {
    if stop.is_empty() || content.is_empty() {
        return content.to_string();
    }

    let earliest = stop
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| content.find(s.as_str()).map(|pos| (pos, s)))
        .min_by_key(|(pos, _)| *pos);

    match earliest {
        Some((pos, word)) => {
            log::debug!("Applied stop word '{}' at position {}", word.escape_debug(), pos);
            content[..pos].trim().to_string()
        }
        None => content.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_base_llm_state_new() {
        let state = BaseLLMState::new("gpt-4o");
        assert_eq!(state.model, "gpt-4o");
        assert_eq!(state.provider, "openai");
        assert_eq!(state.get_token_usage_summary(), UsageMetrics::default());
    }

    #[test]
    #[should_panic(expected = "Model name is required")]
    fn test_base_llm_state_empty_model() {
        BaseLLMState::new("");
    }

    #[test]
    fn test_apply_stop_words() {
        let stop = vec!["\nObservation:".to_string(), "Final Answer:".to_string()];
        let content = "I need to search.\nAction: search\nObservation: Found results";
        assert_eq!(
            apply_stop_words(content, &stop),
            "I need to search.\nAction: search"
        );
    }

    #[test]
    fn test_apply_stop_words_no_match() {
        let stop = vec!["STOP".to_string()];
        assert_eq!(apply_stop_words("No stop word here", &stop), "No stop word here");
        assert_eq!(apply_stop_words("untouched", &[]), "untouched");
    }

    #[test]
    fn test_extract_provider() {
        assert_eq!(BaseLLMState::extract_provider("openai/gpt-4"), "openai");
        assert_eq!(BaseLLMState::extract_provider("anthropic/claude-3"), "anthropic");
        assert_eq!(BaseLLMState::extract_provider("gpt-4"), "openai");
    }

    #[test]
    fn test_track_token_usage_accumulates() {
        let state = BaseLLMState::new("test");
        let usage = json!({"prompt_tokens": 100, "completion_tokens": 50});
        state.track_token_usage(&usage);
        state.track_token_usage(&usage);

        let summary = state.get_token_usage_summary();
        assert_eq!(summary.total_tokens, 300);
        assert_eq!(summary.successful_requests, 2);
    }

    #[test]
    fn test_message_serialization() {
        let msg = LLMMessage::assistant("Do you have any budget constraints?");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["content"], "Do you have any budget constraints?");
    }
}
