//! Test doubles shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::llms::base_llm::{BaseLLM, LLMMessage};
use crate::memory::client::{AddOptions, MemoryRecord, MemoryStore, SearchOptions};
use crate::tools::base_tool::BaseTool;
use crate::types::usage_metrics::UsageMetrics;
use crate::utilities::errors::{CrewError, Result};

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

// ---------------------------------------------------------------------------
// FakeLLM
// ---------------------------------------------------------------------------

/// LLM that replays scripted replies and records every request.
#[derive(Debug, Default)]
pub struct FakeLLM {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<Vec<LLMMessage>>>,
    stops: Mutex<Vec<Vec<String>>>,
    usage: Mutex<UsageMetrics>,
    delay: Option<Duration>,
}

impl FakeLLM {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Vec<LLMMessage>> {
        self.calls.lock().clone()
    }

    pub fn stops(&self) -> Vec<Vec<String>> {
        self.stops.lock().clone()
    }

    pub fn record_usage(&self, prompt: i64, completion: i64) {
        self.usage
            .lock()
            .record(&json!({"prompt_tokens": prompt, "completion_tokens": completion}));
    }
}

#[async_trait]
impl BaseLLM for FakeLLM {
    fn model(&self) -> &str {
        "fake-model"
    }

    async fn call(&self, messages: &[LLMMessage], stop: &[String]) -> Result<String> {
        self.calls.lock().push(messages.to_vec());
        self.stops.lock().push(stop.to_vec());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let reply = self.responses.lock().pop_front();
        match reply {
            Some(reply) => {
                self.record_usage(10, 5);
                Ok(reply)
            }
            None => Err(CrewError::Llm("no scripted response left".to_string())),
        }
    }

    fn get_token_usage_summary(&self) -> UsageMetrics {
        *self.usage.lock()
    }
}

// ---------------------------------------------------------------------------
// FakeMemoryStore
// ---------------------------------------------------------------------------

/// In-memory [`MemoryStore`] that records calls.
#[derive(Debug, Default)]
pub struct FakeMemoryStore {
    records: Vec<MemoryRecord>,
    fail_add: bool,
    fail_search: bool,
    adds: Mutex<Vec<(Vec<LLMMessage>, AddOptions)>>,
    searches: Mutex<Vec<(String, SearchOptions)>>,
    deleted: Mutex<Vec<String>>,
}

impl FakeMemoryStore {
    /// A store whose searches return `records`.
    pub fn with_records(records: Vec<MemoryRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    /// A store where every add and search fails.
    pub fn failing() -> Self {
        Self {
            fail_add: true,
            fail_search: true,
            ..Self::default()
        }
    }

    pub fn failing_search() -> Self {
        Self {
            fail_search: true,
            ..Self::default()
        }
    }

    pub fn failing_add() -> Self {
        Self {
            fail_add: true,
            ..Self::default()
        }
    }

    pub fn adds(&self) -> Vec<(Vec<LLMMessage>, AddOptions)> {
        self.adds.lock().clone()
    }

    pub fn searches(&self) -> Vec<(String, SearchOptions)> {
        self.searches.lock().clone()
    }

    pub fn deleted_users(&self) -> Vec<String> {
        self.deleted.lock().clone()
    }
}

#[async_trait]
impl MemoryStore for FakeMemoryStore {
    async fn add(&self, messages: &[LLMMessage], options: &AddOptions) -> Result<Value> {
        self.adds.lock().push((messages.to_vec(), options.clone()));
        if self.fail_add {
            return Err(CrewError::Memory("add rejected".to_string()));
        }
        Ok(json!([{"id": "mem-1", "event": "ADD"}]))
    }

    async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<MemoryRecord>> {
        self.searches.lock().push((query.to_string(), options.clone()));
        if self.fail_search {
            return Err(CrewError::Memory("search unavailable".to_string()));
        }
        Ok(self.records.clone())
    }

    async fn delete_all(&self, user_id: &str) -> Result<()> {
        self.deleted.lock().push(user_id.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeTool
// ---------------------------------------------------------------------------

/// Tool that returns a fixed output (or error) and records its inputs.
#[derive(Debug)]
pub struct FakeTool {
    name: String,
    output: std::result::Result<String, String>,
    calls: Mutex<Vec<HashMap<String, Value>>>,
}

impl FakeTool {
    pub fn new(name: &str, output: &str) -> Self {
        Self {
            name: name.to_string(),
            output: Ok(output.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(name: &str, error: &str) -> Self {
        Self {
            name: name.to_string(),
            output: Err(error.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<HashMap<String, Value>> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl BaseTool for FakeTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Test tool."
    }

    async fn run(&self, args: HashMap<String, Value>) -> Result<String> {
        self.calls.lock().push(args);
        self.output.clone().map_err(CrewError::Tool)
    }
}
