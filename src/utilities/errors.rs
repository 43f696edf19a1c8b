//! Error types for the crew runtime.
//!
//! Every fallible operation in the crate returns [`CrewError`] through the
//! [`Result`] alias, so each failure path is visible in the signature.

use thiserror::Error;

/// Errors raised while configuring or running a crew.
#[derive(Debug, Error)]
pub enum CrewError {
    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A credential needed by an external service is not set.
    #[error("Missing credential: {0} is not set")]
    MissingCredential(&'static str),

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// An external service answered with a non-success status.
    #[error("{service} API error ({status}): {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML (de)serialization failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The language model call failed or returned something unusable.
    #[error("LLM error: {0}")]
    Llm(String),

    /// A tool failed to run.
    #[error("Tool error: {0}")]
    Tool(String),

    /// The memory backend rejected or failed an operation.
    #[error("Memory error: {0}")]
    Memory(String),

    /// Crew, agent or task definition is inconsistent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A task could not be executed.
    #[error("Task execution error: {0}")]
    TaskExecution(String),

    /// The agent loop ran out of iterations without a final answer.
    #[error("Maximum iterations exceeded: agent '{role}' gave no final answer after {max_iter} iterations")]
    MaxIterations { role: String, max_iter: u32 },
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CrewError>;

impl CrewError {
    /// Build an [`CrewError::Api`] from a response status and body text.
    pub fn api(service: &'static str, status: reqwest::StatusCode, body: impl Into<String>) -> Self {
        let mut body = body.into();
        if body.len() > 500 {
            let mut cut = 500;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        CrewError::Api {
            service,
            status: status.as_u16(),
            body,
        }
    }
}
