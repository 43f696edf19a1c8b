//! Memory system.
//!
//! - [`client`] - the [`MemoryStore`] trait and the Mem0 [`MemoryClient`]
//! - [`storage`] - storage backends ([`Mem0Storage`])
//! - [`external`] - [`ExternalMemory`] and its [`MemoryConfig`]
//! - [`contextual`] - prompt context built from stored memories

pub mod client;
pub mod contextual;
pub mod external;
pub mod storage;

pub use client::{AddOptions, MemoryClient, MemoryRecord, MemoryStore, SearchOptions};
pub use contextual::ContextualMemory;
pub use external::{ExternalMemory, MemoryConfig};
pub use storage::{Mem0Storage, Storage};
