//! Storage backends for the memory system.

pub mod interface;
pub mod mem0_storage;

pub use interface::Storage;
pub use mem0_storage::Mem0Storage;
