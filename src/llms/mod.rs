//! LLM layer.
//!
//! - [`base_llm`] - the trait every model provider implements
//! - [`providers`] - concrete providers (OpenAI)
//!
//! [`create_llm`] turns a model string from [`Settings`] into a shared
//! provider handle.

pub mod base_llm;
pub mod providers;

use std::sync::Arc;

pub use base_llm::{BaseLLM, BaseLLMState, LLMMessage, MessageRole};
pub use providers::openai::OpenAICompletion;

use crate::config::Settings;
use crate::utilities::errors::{CrewError, Result};

/// Build a provider handle for `model`.
///
/// Accepts bare model names (`gpt-4o-mini`) and provider-prefixed names
/// (`openai/gpt-4o`). Only the OpenAI provider is available.
pub fn create_llm(model: &str, settings: &Settings) -> Result<Arc<dyn BaseLLM>> {
    let model = model.trim();
    if model.is_empty() {
        return Err(CrewError::Config("LLM model name is empty".to_string()));
    }

    let (provider, name) = match model.split_once('/') {
        Some((provider, name)) => (provider.to_lowercase(), name),
        None => ("openai".to_string(), model),
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(CrewError::Config(format!(
            "LLM model name is empty in '{}'",
            model
        )));
    }

    match provider.as_str() {
        "openai" => {
            log::debug!("Creating OpenAI LLM for model {}", name);
            let llm = OpenAICompletion::new(
                name,
                settings.credentials.openai().map(str::to_string),
                Some(settings.openai_base_url.clone()),
            )?;
            Ok(Arc::new(llm))
        }
        other => Err(CrewError::Config(format!(
            "Unsupported LLM provider '{}' in model '{}'",
            other, model
        ))),
    }
}
