//! Storage interface for the memory system.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::utilities::errors::Result;

/// Backend behind a memory type.
#[async_trait]
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Save a value with associated metadata.
    async fn save(&self, value: &str, metadata: &HashMap<String, Value>) -> Result<()>;

    /// Search for entries matching `query`.
    ///
    /// Each entry is a JSON object with at least `content` and `score`.
    async fn search(&self, query: &str, limit: usize, score_threshold: f64) -> Result<Vec<Value>>;

    /// Remove all entries.
    async fn reset(&self) -> Result<()>;
}
