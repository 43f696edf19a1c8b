//! Run configuration.
//!
//! `Settings` carries every value the run reads from its surroundings:
//! service credentials, the memory namespace, the destination, the model and
//! the service endpoints. It is built once at startup and handed to each
//! constructor that needs it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::utilities::errors::Result;

/// Environment variable holding the Mem0 platform key.
pub const MEM0_API_KEY_ENV: &str = "MEM0_API_KEY";
/// Environment variable holding the OpenAI key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Environment variable holding the Serper key.
pub const SERPER_API_KEY_ENV: &str = "SERPER_API_KEY";

/// Memory namespace used when none is configured.
pub const DEFAULT_USER_ID: &str = "poc_user_1";
/// Destination used when none is given.
pub const DEFAULT_DESTINATION: &str = "Kyoto, Japan";
/// Model used by the recommendation agent when none is configured.
pub const DEFAULT_LLM: &str = "gpt-4o-mini";

pub const DEFAULT_MEM0_BASE_URL: &str = "https://api.mem0.ai";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_SERPER_BASE_URL: &str = "https://google.serper.dev";

/// Credentials for the three external services.
///
/// Empty strings are treated the same as missing values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub mem0_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub serper_api_key: Option<String>,
}

impl Credentials {
    /// Read all three keys from the process environment.
    pub fn from_env() -> Self {
        Self {
            mem0_api_key: env_non_empty(MEM0_API_KEY_ENV),
            openai_api_key: env_non_empty(OPENAI_API_KEY_ENV),
            serper_api_key: env_non_empty(SERPER_API_KEY_ENV),
        }
    }

    /// Fill every unset key from `other`.
    pub fn or(self, other: Credentials) -> Self {
        Self {
            mem0_api_key: non_empty(self.mem0_api_key).or(other.mem0_api_key),
            openai_api_key: non_empty(self.openai_api_key).or(other.openai_api_key),
            serper_api_key: non_empty(self.serper_api_key).or(other.serper_api_key),
        }
    }

    pub fn has_mem0_key(&self) -> bool {
        is_set(&self.mem0_api_key)
    }

    pub fn has_openai_key(&self) -> bool {
        is_set(&self.openai_api_key)
    }

    pub fn has_serper_key(&self) -> bool {
        is_set(&self.serper_api_key)
    }

    /// The Mem0 key, if set and non-empty.
    pub fn mem0(&self) -> Option<&str> {
        self.mem0_api_key.as_deref().filter(|k| !k.is_empty())
    }

    /// The OpenAI key, if set and non-empty.
    pub fn openai(&self) -> Option<&str> {
        self.openai_api_key.as_deref().filter(|k| !k.is_empty())
    }

    /// The Serper key, if set and non-empty.
    pub fn serper(&self) -> Option<&str> {
        self.serper_api_key.as_deref().filter(|k| !k.is_empty())
    }
}

/// Settings for one recommendation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Service credentials.
    pub credentials: Credentials,
    /// Memory namespace for the stored preferences.
    pub user_id: String,
    /// Destination the recommendations are for.
    pub destination: String,
    /// Model identifier, e.g. `gpt-4o-mini` or `openai/gpt-4o`.
    pub llm: String,
    pub mem0_base_url: String,
    pub mem0_org_id: Option<String>,
    pub mem0_project_id: Option<String>,
    pub openai_base_url: String,
    pub serper_base_url: String,
    /// Print agent and crew progress.
    pub verbose: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            user_id: DEFAULT_USER_ID.to_string(),
            destination: DEFAULT_DESTINATION.to_string(),
            llm: DEFAULT_LLM.to_string(),
            mem0_base_url: DEFAULT_MEM0_BASE_URL.to_string(),
            mem0_org_id: None,
            mem0_project_id: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            serper_base_url: DEFAULT_SERPER_BASE_URL.to_string(),
            verbose: true,
        }
    }
}

impl Settings {
    /// Defaults with credentials taken from the environment.
    pub fn from_env() -> Self {
        Self {
            credentials: Credentials::from_env(),
            ..Self::default()
        }
    }

    /// Load settings from a YAML file.
    ///
    /// Keys missing from the file keep their defaults; credentials missing
    /// from the file fall back to the environment.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_yaml_str(&content)?;
        Ok(settings.with_env_credentials())
    }

    /// Parse settings from YAML text without touching the environment.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Fill unset credentials from the environment.
    pub fn with_env_credentials(mut self) -> Self {
        self.credentials = self.credentials.or(Credentials::from_env());
        self
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    non_empty(std::env::var(name).ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().map_or(false, |v| !v.is_empty())
}
