//! Agent module.
//!
//! Contains the [`Agent`] struct, which turns a task prompt into a final
//! answer by running the ReAct executor with its LLM and tools.

pub mod core;

pub use self::core::Agent;
