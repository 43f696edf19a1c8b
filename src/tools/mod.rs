//! Tools agents can call.
//!
//! - [`base_tool`] - the [`BaseTool`] trait and prompt rendering
//! - [`serper_dev_tool`] - web search through Serper

pub mod base_tool;
pub mod serper_dev_tool;

pub use base_tool::BaseTool;
pub use serper_dev_tool::SerperDevTool;
