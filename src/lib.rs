//! A streaming Reason-Act agent executor.
//!
//! An [`agent::Agent`] drives a reasoning/acting loop against a
//! [`adapter::ModelAdapter`]: it formats the conversation log into the
//! provider's wire shape with a [`formatter::Formatter`], reassembles
//! streamed tool-call fragments with [`accumulator::ToolCallAccumulator`],
//! and dispatches completed calls through a [`tool::ToolRegistry`]. The
//! whole thing is composed rather than built as a compiled graph of nodes —
//! swap any one piece (a different wire format, a different provider, a
//! different tool set) without touching the others.
//!
//! ```text
//! Agent::reply/stream
//!   -> ReActExecutor::run
//!        -> reasoning phase: Formatter::format -> ModelAdapter::stream
//!                            -> ToolCallAccumulator
//!        -> acting phase:   ToolRegistry + tool::dispatch
//!        -> HookManager around both
//! ```

pub mod accumulator;
pub mod adapter;
pub mod agent;
pub mod error;
pub mod formatter;
pub mod hooks;
pub mod memory;
pub mod message;
pub mod options;
pub mod react;
pub mod tool;

pub use accumulator::ToolCallAccumulator;
pub use adapter::{ChatResponse, ChatResponseStream, ModelAdapter, Usage};
pub use agent::{Agent, MsgStream, ReActAgent, ReActAgentBuilder};
pub use error::AgentError;
pub use formatter::{Capabilities, Formatter, MultiAgentFormatter, SingleChatFormatter};
pub use hooks::{HookManager, PostHook, PreHook};
pub use memory::{Memory, MemorySnapshot, MsgRecord};
pub use message::{ContentBlock, MediaSource, Msg, Role};
pub use options::GenerateOptions;
pub use react::{ReActConfig, ReActExecutor};
pub use tool::{Tool, ToolRegistry, ToolResponse, ToolSchema, ToolUseCall};
