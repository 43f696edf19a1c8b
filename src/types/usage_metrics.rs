//! Token usage accounting for LLM calls.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Cumulative token usage for one LLM handle or one crew run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetrics {
    pub total_tokens: i64,
    pub prompt_tokens: i64,
    pub cached_prompt_tokens: i64,
    pub completion_tokens: i64,
    pub successful_requests: i64,
}

impl UsageMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one successful request from a provider `usage` object.
    ///
    /// Accepts OpenAI (`prompt_tokens`/`completion_tokens`) and
    /// Anthropic-style (`input_tokens`/`output_tokens`) field names.
    pub fn record(&mut self, usage: &Value) {
        let field = |names: &[&str]| {
            names
                .iter()
                .find_map(|n| usage.get(*n).and_then(Value::as_i64))
                .unwrap_or(0)
        };
        let prompt = field(&["prompt_tokens", "input_tokens"]);
        let completion = field(&["completion_tokens", "output_tokens"]);
        let cached = usage
            .get("prompt_tokens_details")
            .and_then(|d| d.get("cached_tokens"))
            .and_then(Value::as_i64)
            .unwrap_or_else(|| field(&["cached_tokens"]));

        self.prompt_tokens += prompt;
        self.completion_tokens += completion;
        self.total_tokens += prompt + completion;
        self.cached_prompt_tokens += cached;
        self.successful_requests += 1;
    }
}

impl AddAssign for UsageMetrics {
    fn add_assign(&mut self, other: Self) {
        self.total_tokens += other.total_tokens;
        self.prompt_tokens += other.prompt_tokens;
        self.cached_prompt_tokens += other.cached_prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.successful_requests += other.successful_requests;
    }
}
