//! Agent execution machinery.
//!
//! - [`parser`] - parses ReAct-formatted model output
//! - [`crew_agent_executor`] - the loop between the model and the tools

pub mod crew_agent_executor;
pub mod parser;

pub use crew_agent_executor::CrewAgentExecutor;
pub use parser::{AgentAction, AgentFinish, OutputParserError, ParseResult};
