//! Loading and lookup of prompt text.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;

use crate::translations::EN_JSON;
use crate::utilities::errors::{CrewError, Result};

type PromptTable = HashMap<String, HashMap<String, String>>;

static EMBEDDED_PROMPTS: Lazy<PromptTable> =
    Lazy::new(|| serde_json::from_str(EN_JSON).unwrap_or_default());

/// Prompt text keyed by `kind` then by `key`.
#[derive(Debug, Clone)]
pub struct I18N {
    prompts: PromptTable,
}

impl Default for I18N {
    fn default() -> Self {
        Self {
            prompts: EMBEDDED_PROMPTS.clone(),
        }
    }
}

impl I18N {
    /// Load prompts from a JSON file in the same layout as the embedded one.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let prompts = serde_json::from_str(&content).map_err(|e| {
            CrewError::Config(format!(
                "Error decoding JSON from prompts file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self { prompts })
    }

    /// Retrieve a prompt slice by key.
    pub fn slice(&self, slice: &str) -> Result<String> {
        self.retrieve("slices", slice)
    }

    /// Retrieve an error message by key.
    pub fn errors(&self, error: &str) -> Result<String> {
        self.retrieve("errors", error)
    }

    pub fn retrieve(&self, kind: &str, key: &str) -> Result<String> {
        self.prompts
            .get(kind)
            .and_then(|section| section.get(key))
            .cloned()
            .ok_or_else(|| CrewError::Config(format!("Prompt for '{}':'{}' not found.", kind, key)))
    }
}
