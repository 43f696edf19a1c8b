//! External memory backed by a memory provider (Mem0).

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::memory::client::MemoryStore;
use crate::memory::storage::interface::Storage;
use crate::memory::storage::mem0_storage::Mem0Storage;
use crate::utilities::errors::{CrewError, Result};

/// Providers [`ExternalMemory::create_storage`] can build.
pub const SUPPORTED_PROVIDERS: &[&str] = &["mem0"];

/// Memory configuration attached to a crew.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Provider name, e.g. `mem0`.
    pub provider: String,
    /// Memory namespace.
    pub user_id: Option<String>,
    #[serde(default = "default_infer")]
    pub infer: bool,
}

fn default_infer() -> bool {
    true
}

impl MemoryConfig {
    /// Mem0 configuration for one user.
    pub fn mem0(user_id: impl Into<String>) -> Self {
        Self {
            provider: "mem0".to_string(),
            user_id: Some(user_id.into()),
            infer: true,
        }
    }

    pub fn is_supported(&self) -> bool {
        SUPPORTED_PROVIDERS.contains(&self.provider.as_str())
    }
}

/// External memory over a [`Storage`] backend.
#[derive(Debug, Clone)]
pub struct ExternalMemory {
    storage: Arc<dyn Storage>,
}

impl ExternalMemory {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Build the storage backend named by `config` over `store`.
    pub fn create_storage(config: &MemoryConfig, store: Arc<dyn MemoryStore>) -> Result<Arc<dyn Storage>> {
        match config.provider.as_str() {
            "mem0" => {
                let user_id = config.user_id.as_deref().ok_or_else(|| {
                    CrewError::Validation("mem0 memory config requires a user_id".to_string())
                })?;
                let mut storage = Mem0Storage::new(store, user_id)?;
                storage.infer = config.infer;
                Ok(Arc::new(storage))
            }
            other => Err(CrewError::Validation(format!(
                "Provider {} not supported. Supported providers: {}",
                other,
                SUPPORTED_PROVIDERS.join(", ")
            ))),
        }
    }

    /// Build external memory for `config` over `store`.
    pub fn from_config(config: &MemoryConfig, store: Arc<dyn MemoryStore>) -> Result<Self> {
        Ok(Self::new(Self::create_storage(config, store)?))
    }

    /// Save a value, recording the agent role in the metadata.
    ///
    /// The storage attributes the memory to that agent.
    pub async fn save(
        &self,
        value: &str,
        mut metadata: HashMap<String, Value>,
        agent_role: Option<&str>,
    ) -> Result<()> {
        if let Some(agent) = agent_role {
            metadata
                .entry("agent".to_string())
                .or_insert_with(|| Value::String(agent.to_string()));
        }
        self.storage.save(value, &metadata).await
    }

    pub async fn search(&self, query: &str, limit: usize, score_threshold: f64) -> Result<Vec<Value>> {
        self.storage.search(query, limit, score_threshold).await
    }

    pub async fn reset(&self) -> Result<()> {
        self.storage.reset().await
    }
}
