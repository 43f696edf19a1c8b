//! # crewai-mem0
//!
//! A travel-recommendation crew whose agent remembers the user through the
//! Mem0 memory platform.
//!
//! The crate carries a small crewAI-style runtime (agents running a ReAct
//! loop over an LLM, tasks, a sequential crew) plus a Mem0-backed external
//! memory. [`recommendation`] wires them together: seed the user's
//! preferences, build the agent and task, and run the crew.

pub mod agent;
pub mod agents;
pub mod config;
pub mod crew;
pub mod crews;
pub mod llms;
pub mod memory;
pub mod process;
pub mod recommendation;
pub mod task;
pub mod tasks;
pub mod tools;
pub mod translations;
pub mod types;
pub mod utilities;

#[cfg(test)]
mod testing;

pub use agent::Agent;
pub use config::{Credentials, Settings};
pub use crew::Crew;
pub use crews::crew_output::CrewOutput;
pub use llms::base_llm::{BaseLLM, LLMMessage};
pub use memory::client::{MemoryClient, MemoryStore};
pub use process::Process;
pub use recommendation::RecommendationPoc;
pub use task::Task;
pub use tasks::task_output::TaskOutput;
pub use utilities::errors::{CrewError, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
