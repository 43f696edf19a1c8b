//! OpenAI chat-completions provider.
//!
//! Talks to `POST {base_url}/chat/completions` over `reqwest`, retrying
//! transport failures, rate limits and server errors with exponential
//! backoff, and tracking token usage per handle.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::DEFAULT_OPENAI_BASE_URL;
use crate::llms::base_llm::{apply_stop_words, BaseLLM, BaseLLMState, LLMMessage};
use crate::types::usage_metrics::UsageMetrics;
use crate::utilities::errors::{CrewError, Result};

/// OpenAI chat-completions implementation of [`BaseLLM`].
#[derive(Debug)]
pub struct OpenAICompletion {
    /// Shared base LLM state.
    pub state: BaseLLMState,
    /// Organization ID sent as `OpenAI-Organization`.
    pub organization: Option<String>,
    /// Maximum tokens in the response.
    pub max_tokens: Option<u32>,
    /// Number of retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each further retry.
    pub retry_delay: Duration,
    client: reqwest::Client,
}

impl OpenAICompletion {
    /// Create a provider for `model`.
    ///
    /// The key is only checked when a call is made, so a handle can be built
    /// before credentials are known.
    pub fn new(
        model: impl Into<String>,
        api_key: Option<String>,
        base_url: Option<String>,
    ) -> Result<Self> {
        let mut state = BaseLLMState::new(model);
        state.api_key = api_key.filter(|k| !k.is_empty());
        state.base_url = base_url;
        state.provider = "openai".to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            state,
            organization: None,
            max_tokens: None,
            max_retries: 2,
            retry_delay: Duration::from_secs(1),
            client,
        })
    }

    /// Builder: set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.state.temperature = Some(temperature);
        self
    }

    /// Get the API base URL.
    pub fn api_base_url(&self) -> &str {
        self.state
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_OPENAI_BASE_URL)
            .trim_end_matches('/')
    }

    /// Build the request body for the Chat Completions API.
    pub fn build_request_body(&self, messages: &[LLMMessage], stop: &[String]) -> Value {
        let mut body = json!({
            "model": self.state.model,
            "messages": messages,
        });

        if let Some(temp) = self.state.temperature {
            body["temperature"] = json!(temp);
        }
        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if !stop.is_empty() {
            // The API accepts at most four stop sequences.
            let stop: Vec<&String> = stop.iter().take(4).collect();
            body["stop"] = json!(stop);
        }

        body
    }

    /// Extract the reply text from a Chat Completions response.
    fn parse_completions_response(&self, response: &Value, stop: &[String]) -> Result<String> {
        let message = response
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .ok_or_else(|| CrewError::Llm("No choices in OpenAI response".to_string()))?;

        if let Some(usage) = response.get("usage") {
            self.state.track_token_usage(usage);
            log::debug!(
                "OpenAI token usage: prompt={}, completion={}",
                usage.get("prompt_tokens").and_then(Value::as_i64).unwrap_or(0),
                usage.get("completion_tokens").and_then(Value::as_i64).unwrap_or(0),
            );
        }

        let content = message
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(CrewError::Llm(
                "Invalid response from LLM call - None or empty.".to_string(),
            ));
        }

        Ok(apply_stop_words(content, stop))
    }
}

#[async_trait]
impl BaseLLM for OpenAICompletion {
    fn model(&self) -> &str {
        &self.state.model
    }

    fn provider(&self) -> &str {
        &self.state.provider
    }

    fn supports_stop_words(&self) -> bool {
        // Reasoning models reject the `stop` parameter.
        let model = self.state.model.to_lowercase();
        !(model.starts_with("o1") || model.starts_with("o3") || model.starts_with("o4"))
    }

    async fn call(&self, messages: &[LLMMessage], stop: &[String]) -> Result<String> {
        let api_key = self
            .state
            .api_key
            .as_deref()
            .ok_or(CrewError::MissingCredential("OPENAI_API_KEY"))?;

        let stop: &[String] = if self.supports_stop_words() { stop } else { &[] };
        let body = self.build_request_body(messages, stop);
        let endpoint = format!("{}/chat/completions", self.api_base_url());

        log::debug!(
            "OpenAICompletion.call: model={}, messages={}",
            self.state.model,
            messages.len()
        );

        let mut last_error: Option<CrewError> = None;
        let mut retry_delay = self.retry_delay;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                log::warn!("OpenAI API retry attempt {} after {:?}", attempt, retry_delay);
                tokio::time::sleep(retry_delay).await;
                retry_delay *= 2;
            }

            let mut request = self.client.post(&endpoint).bearer_auth(api_key).json(&body);
            if let Some(ref org) = self.organization {
                request = request.header("OpenAI-Organization", org);
            }

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = Some(e.into());
                    continue;
                }
            };

            let status = response.status();
            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    last_error = Some(e.into());
                    continue;
                }
            };

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                last_error = Some(CrewError::api("OpenAI", status, text));
                continue;
            }
            if !status.is_success() {
                return Err(CrewError::api("OpenAI", status, text));
            }

            let response_json: Value = serde_json::from_str(&text)?;
            return self.parse_completions_response(&response_json, stop);
        }

        Err(last_error
            .unwrap_or_else(|| CrewError::Llm("OpenAI API call failed after all retries".into())))
    }

    fn get_token_usage_summary(&self) -> UsageMetrics {
        self.state.get_token_usage_summary()
    }
}
