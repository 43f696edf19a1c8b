//! Mem0 platform client.
//!
//! [`MemoryStore`] is the seam between the crew and the memory service;
//! [`MemoryClient`] implements it against the Mem0 REST API.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::config::{Settings, DEFAULT_MEM0_BASE_URL};
use crate::llms::base_llm::LLMMessage;
use crate::utilities::errors::{CrewError, Result};

// ---------------------------------------------------------------------------
// Request options and records
// ---------------------------------------------------------------------------

/// Options for [`MemoryStore::add`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddOptions {
    pub user_id: Option<String>,
    pub agent_id: Option<String>,
    pub run_id: Option<String>,
    pub metadata: HashMap<String, Value>,
    /// Let the service extract facts instead of storing raw messages.
    pub infer: bool,
}

impl AddOptions {
    /// Options scoped to one user, with inference on.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            infer: true,
            ..Self::default()
        }
    }
}

/// Options for [`MemoryStore::search`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub user_id: Option<String>,
    pub agent_id: Option<String>,
    pub limit: usize,
    pub threshold: Option<f64>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            user_id: None,
            agent_id: None,
            limit: 100,
            threshold: None,
        }
    }
}

impl SearchOptions {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }
}

/// One memory returned by a search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub memory: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

// ---------------------------------------------------------------------------
// MemoryStore trait
// ---------------------------------------------------------------------------

/// Long-term memory service keyed by user id.
#[async_trait]
pub trait MemoryStore: Send + Sync + std::fmt::Debug {
    /// Store a conversation. Returns the service's response payload.
    async fn add(&self, messages: &[LLMMessage], options: &AddOptions) -> Result<Value>;

    /// Semantic search over stored memories.
    async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<MemoryRecord>>;

    /// Remove every memory stored for `user_id`.
    async fn delete_all(&self, user_id: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// MemoryClient
// ---------------------------------------------------------------------------

/// HTTP client for the Mem0 platform API.
#[derive(Debug, Clone)]
pub struct MemoryClient {
    api_key: Option<String>,
    base_url: String,
    org_id: Option<String>,
    project_id: Option<String>,
    client: reqwest::Client,
}

impl MemoryClient {
    /// Create a client. The key is checked on each call.
    pub fn new(api_key: Option<String>, base_url: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_MEM0_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            org_id: None,
            project_id: None,
            client,
        })
    }

    /// Build a client from run settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut client = Self::new(
            settings.credentials.mem0().map(str::to_string),
            Some(settings.mem0_base_url.clone()),
        )?;
        client.org_id = settings.mem0_org_id.clone();
        client.project_id = settings.mem0_project_id.clone();
        Ok(client)
    }

    /// Builder: scope requests to an organization and project.
    pub fn with_project(mut self, org_id: impl Into<String>, project_id: impl Into<String>) -> Self {
        self.org_id = Some(org_id.into());
        self.project_id = Some(project_id.into());
        self
    }

    fn auth_header(&self) -> Result<String> {
        self.api_key
            .as_deref()
            .map(|k| format!("Token {}", k))
            .ok_or(CrewError::MissingCredential("MEM0_API_KEY"))
    }

    fn project_fields(&self, body: &mut Map<String, Value>) {
        if let Some(ref org) = self.org_id {
            body.insert("org_id".into(), json!(org));
        }
        if let Some(ref project) = self.project_id {
            body.insert("project_id".into(), json!(project));
        }
    }

    /// Request body for `POST /v1/memories/`.
    pub fn add_body(&self, messages: &[LLMMessage], options: &AddOptions) -> Value {
        let mut body = Map::new();
        body.insert("messages".into(), json!(messages));
        if let Some(ref user_id) = options.user_id {
            body.insert("user_id".into(), json!(user_id));
        }
        if let Some(ref agent_id) = options.agent_id {
            body.insert("agent_id".into(), json!(agent_id));
        }
        if let Some(ref run_id) = options.run_id {
            body.insert("run_id".into(), json!(run_id));
        }
        if !options.metadata.is_empty() {
            body.insert("metadata".into(), json!(options.metadata));
        }
        body.insert("infer".into(), json!(options.infer));
        self.project_fields(&mut body);
        Value::Object(body)
    }

    /// Request body for `POST /v1/memories/search/`.
    pub fn search_body(&self, query: &str, options: &SearchOptions) -> Value {
        let mut body = Map::new();
        body.insert("query".into(), json!(query));
        if let Some(ref user_id) = options.user_id {
            body.insert("user_id".into(), json!(user_id));
        }
        if let Some(ref agent_id) = options.agent_id {
            body.insert("agent_id".into(), json!(agent_id));
        }
        body.insert("limit".into(), json!(options.limit));
        if let Some(threshold) = options.threshold {
            body.insert("threshold".into(), json!(threshold));
        }
        self.project_fields(&mut body);
        Value::Object(body)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(CrewError::api("Mem0", status, body))
    }
}

/// Parse a search response, which is either a list or `{"results": [...]}`.
pub fn parse_search_response(value: Value) -> Result<Vec<MemoryRecord>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(CrewError::Memory(
                    "search response has no results list".to_string(),
                ))
            }
        },
        other => {
            return Err(CrewError::Memory(format!(
                "unexpected search response: {}",
                other
            )))
        }
    };
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(CrewError::from))
        .collect()
}

#[async_trait]
impl MemoryStore for MemoryClient {
    async fn add(&self, messages: &[LLMMessage], options: &AddOptions) -> Result<Value> {
        let auth = self.auth_header()?;
        log::debug!(
            "Mem0 add: {} messages for user {:?}",
            messages.len(),
            options.user_id
        );
        let response = self
            .client
            .post(format!("{}/v1/memories/", self.base_url))
            .header(reqwest::header::AUTHORIZATION, auth)
            .json(&self.add_body(messages, options))
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<MemoryRecord>> {
        let auth = self.auth_header()?;
        log::debug!("Mem0 search: '{}' for user {:?}", query, options.user_id);
        let response = self
            .client
            .post(format!("{}/v1/memories/search/", self.base_url))
            .header(reqwest::header::AUTHORIZATION, auth)
            .json(&self.search_body(query, options))
            .send()
            .await?;
        let response = Self::check(response).await?;
        parse_search_response(response.json().await?)
    }

    async fn delete_all(&self, user_id: &str) -> Result<()> {
        let auth = self.auth_header()?;
        log::debug!("Mem0 delete_all for user {}", user_id);
        let response = self
            .client
            .delete(format!("{}/v1/memories/", self.base_url))
            .header(reqwest::header::AUTHORIZATION, auth)
            .query(&[("user_id", user_id)])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
