//! Web search through the Serper API.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::DEFAULT_SERPER_BASE_URL;
use crate::tools::base_tool::BaseTool;
use crate::utilities::errors::{CrewError, Result};

const TOOL_NAME: &str = "Search the internet with Serper";
const TOOL_DESCRIPTION: &str =
    "A tool that can be used to search the internet with a search_query. Supports different search types: 'search' (default), 'news'";

/// Google search through `POST {base_url}/search`.
#[derive(Debug, Clone)]
pub struct SerperDevTool {
    api_key: Option<String>,
    base_url: String,
    /// Number of organic results requested.
    pub n_results: usize,
    client: reqwest::Client,
}

impl SerperDevTool {
    /// Build the tool. The key is checked when the tool runs.
    pub fn new(api_key: Option<String>, base_url: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_SERPER_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            n_results: 10,
            client,
        })
    }

    /// Query Serper and return the raw JSON response.
    pub async fn search(&self, query: &str) -> Result<Value> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(CrewError::MissingCredential("SERPER_API_KEY"))?;

        log::debug!("Serper search: {}", query);
        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("X-API-KEY", api_key)
            .json(&json!({"q": query, "num": self.n_results}))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CrewError::api("Serper", status, body));
        }
        Ok(response.json().await?)
    }
}

/// Render a Serper response as text for the agent.
pub fn format_results(response: &Value) -> String {
    let mut blocks = Vec::new();

    if let Some(answer) = response.get("answerBox") {
        let text = answer
            .get("answer")
            .or_else(|| answer.get("snippet"))
            .and_then(Value::as_str);
        if let Some(text) = text {
            blocks.push(format!("Answer: {}\n---", text));
        }
    }

    if let Some(organic) = response.get("organic").and_then(Value::as_array) {
        for item in organic {
            let field = |name: &str| item.get(name).and_then(Value::as_str).unwrap_or_default();
            blocks.push(format!(
                "Title: {}\nLink: {}\nSnippet: {}\n---",
                field("title"),
                field("link"),
                field("snippet")
            ));
        }
    }

    if blocks.is_empty() {
        "No search results found.".to_string()
    } else {
        blocks.join("\n")
    }
}

#[async_trait]
impl BaseTool for SerperDevTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        TOOL_DESCRIPTION
    }

    fn args_schema(&self) -> Value {
        json!({
            "search_query": {
                "description": "Mandatory search query you want to use to search the internet",
                "type": "str"
            }
        })
    }

    async fn run(&self, args: HashMap<String, Value>) -> Result<String> {
        let query = args
            .get("search_query")
            .or_else(|| args.get("query"))
            .and_then(Value::as_str)
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| CrewError::Tool("search_query is required".to_string()))?;

        let response = self.search(query).await?;
        Ok(format_results(&response))
    }
}
