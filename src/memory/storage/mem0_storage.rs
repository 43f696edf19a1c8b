//! Mem0-backed storage for external memory.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::llms::base_llm::LLMMessage;
use crate::memory::client::{AddOptions, MemoryStore, SearchOptions};
use crate::memory::storage::interface::Storage;
use crate::utilities::errors::{CrewError, Result};

/// Maximum agent ID length for Mem0.
const MAX_AGENT_ID_LENGTH_MEM0: usize = 255;

/// Storage that writes to and searches a [`MemoryStore`] for one user.
#[derive(Debug, Clone)]
pub struct Mem0Storage {
    store: Arc<dyn MemoryStore>,
    /// Namespace for saved and searched memories.
    pub user_id: String,
    /// Agent the memories are attributed to, if any.
    pub agent_id: Option<String>,
    /// Whether the service should extract facts from saved text.
    pub infer: bool,
}

impl Mem0Storage {
    pub fn new(store: Arc<dyn MemoryStore>, user_id: impl Into<String>) -> Result<Self> {
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            return Err(CrewError::Validation(
                "Mem0Storage requires a non-empty user_id".to_string(),
            ));
        }
        Ok(Self {
            store,
            user_id,
            agent_id: None,
            infer: true,
        })
    }

    /// Builder: attribute memories to an agent role.
    pub fn with_agent(mut self, role: &str) -> Self {
        self.agent_id = Some(agent_id_for(role));
        self
    }

    /// Messages saved for `value`.
    fn messages_for(value: &str) -> Vec<LLMMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(user) = get_user_message(value) {
            messages.push(LLMMessage::user(user));
        }
        messages.push(LLMMessage::assistant(get_assistant_message(value)));
        messages
    }
}

/// Sanitize an agent role for use as a Mem0 agent id.
fn sanitize_role(role: &str) -> String {
    role.replace('\n', "").replace([' ', '/'], "_")
}

/// Mem0 agent id for `role`, cut to the service limit on a char boundary.
fn agent_id_for(role: &str) -> String {
    let mut agent_id = sanitize_role(role);
    if agent_id.len() > MAX_AGENT_ID_LENGTH_MEM0 {
        let mut cut = MAX_AGENT_ID_LENGTH_MEM0;
        while !agent_id.is_char_boundary(cut) {
            cut -= 1;
        }
        agent_id.truncate(cut);
    }
    agent_id
}

/// Text after `Final Answer:`, or the whole text.
fn get_assistant_message(text: &str) -> &str {
    let marker = "Final Answer:";
    match text.find(marker) {
        Some(pos) => text[pos + marker.len()..].trim(),
        None => text.trim(),
    }
}

/// The line after `User message:` when the text carries one.
fn get_user_message(text: &str) -> Option<&str> {
    let prefix = "User message:";
    let pos = text.find(prefix)?;
    let rest = text[pos + prefix.len()..].trim_start();
    let line = rest.lines().next().unwrap_or_default().trim();
    (!line.is_empty()).then_some(line)
}

#[async_trait]
impl Storage for Mem0Storage {
    /// The `agent` metadata entry, when present, overrides the configured agent.
    async fn save(&self, value: &str, metadata: &HashMap<String, Value>) -> Result<()> {
        let agent_id = metadata
            .get("agent")
            .and_then(Value::as_str)
            .map(agent_id_for)
            .or_else(|| self.agent_id.clone());
        let options = AddOptions {
            user_id: Some(self.user_id.clone()),
            agent_id,
            run_id: None,
            metadata: metadata.clone(),
            infer: self.infer,
        };
        self.store.add(&Self::messages_for(value), &options).await?;
        Ok(())
    }

    async fn search(&self, query: &str, limit: usize, score_threshold: f64) -> Result<Vec<Value>> {
        let options = SearchOptions {
            user_id: Some(self.user_id.clone()),
            agent_id: None,
            limit,
            threshold: Some(score_threshold),
        };
        let records = self.store.search(query, &options).await?;

        Ok(records
            .into_iter()
            .filter(|r| r.score.map_or(true, |s| s >= score_threshold))
            .take(limit)
            .map(|r| {
                json!({
                    "id": r.id,
                    "content": r.memory,
                    "score": r.score,
                    "metadata": r.metadata.unwrap_or(Value::Null),
                })
            })
            .collect())
    }

    async fn reset(&self) -> Result<()> {
        self.store.delete_all(&self.user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llms::base_llm::MessageRole;
    use crate::memory::client::MemoryRecord;
    use crate::testing::FakeMemoryStore;

    #[test]
    fn test_message_helpers() {
        assert_eq!(get_assistant_message("Thought: x\nFinal Answer: Go to Gion"), "Go to Gion");
        assert_eq!(get_assistant_message("  plain  "), "plain");
        assert_eq!(get_user_message("User message: hi there\nmore"), Some("hi there"));
        assert_eq!(get_user_message("no marker"), None);
        assert_eq!(sanitize_role("Travel Recommendation/Specialist"), "Travel_Recommendation_Specialist");
    }

    #[test]
    fn test_agent_id_truncates_on_char_boundary() {
        let store = Arc::new(FakeMemoryStore::default());
        let role = "é".repeat(200);
        let storage = Mem0Storage::new(store, "u").unwrap().with_agent(&role);

        let agent_id = storage.agent_id.unwrap();
        assert_eq!(agent_id.len(), 254);
        assert!(role.starts_with(&agent_id));
        assert_eq!(agent_id_for(&"a".repeat(300)).len(), MAX_AGENT_ID_LENGTH_MEM0);
    }

    #[tokio::test]
    async fn test_save_takes_agent_from_metadata() {
        let store = Arc::new(FakeMemoryStore::default());
        let storage = Mem0Storage::new(store.clone(), "u").unwrap().with_agent("Fallback");

        let mut metadata = HashMap::new();
        metadata.insert("agent".to_string(), json!("Food Critic/Local"));
        storage.save("Final Answer: ramen", &metadata).await.unwrap();
        storage.save("Final Answer: soba", &HashMap::new()).await.unwrap();

        let adds = store.adds();
        assert_eq!(adds[0].1.agent_id.as_deref(), Some("Food_Critic_Local"));
        assert_eq!(adds[1].1.agent_id.as_deref(), Some("Fallback"));
    }

    #[test]
    fn test_rejects_empty_user() {
        let store = Arc::new(FakeMemoryStore::default());
        assert!(Mem0Storage::new(store, " ").is_err());
    }

    #[tokio::test]
    async fn test_save_sends_assistant_message() {
        let store = Arc::new(FakeMemoryStore::default());
        let storage = Mem0Storage::new(store.clone(), "poc_user_1")
            .unwrap()
            .with_agent("Travel Recommendation Specialist");

        let mut metadata = HashMap::new();
        metadata.insert("task".to_string(), json!("recommend"));
        storage
            .save("Thought: done\nFinal Answer: Stay in a machiya", &metadata)
            .await
            .unwrap();

        let adds = store.adds();
        assert_eq!(adds.len(), 1);
        let (messages, options) = &adds[0];
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, MessageRole::Assistant);
        assert_eq!(messages[0].content, "Stay in a machiya");
        assert_eq!(options.user_id.as_deref(), Some("poc_user_1"));
        assert_eq!(options.agent_id.as_deref(), Some("Travel_Recommendation_Specialist"));
        assert_eq!(options.metadata["task"], "recommend");
    }

    #[tokio::test]
    async fn test_search_filters_by_threshold() {
        let store = Arc::new(FakeMemoryStore::with_records(vec![
            MemoryRecord {
                memory: "Enjoys local cuisine".into(),
                score: Some(0.9),
                ..MemoryRecord::default()
            },
            MemoryRecord {
                memory: "Weak match".into(),
                score: Some(0.2),
                ..MemoryRecord::default()
            },
            MemoryRecord {
                memory: "Unscored".into(),
                ..MemoryRecord::default()
            },
        ]));
        let storage = Mem0Storage::new(store.clone(), "u").unwrap();

        let results = storage.search("food", 5, 0.6).await.unwrap();
        let contents: Vec<&str> = results
            .iter()
            .filter_map(|r| r["content"].as_str())
            .collect();
        assert_eq!(contents, vec!["Enjoys local cuisine", "Unscored"]);

        let searches = store.searches();
        assert_eq!(searches[0].1.limit, 5);
        assert_eq!(searches[0].1.threshold, Some(0.6));
    }

    #[tokio::test]
    async fn test_reset_deletes_user_memories() {
        let store = Arc::new(FakeMemoryStore::default());
        let storage = Mem0Storage::new(store.clone(), "u").unwrap();
        storage.reset().await.unwrap();
        assert_eq!(store.deleted_users(), vec!["u".to_string()]);
    }
}
