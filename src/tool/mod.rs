//! Tool registry: named callables with a JSON-Schema parameter description
//! (spec.md §4.4).

mod executor;

pub use executor::{dispatch, DispatchOptions};

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};

use crate::message::ContentBlock;

/// `{name, description, parameters}` emitted by the registry and consumed by
/// the model adapter to instruct the LLM (spec.md §3).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// A JSON-Schema object: `{type: "object", properties, required?}` (spec.md §4.4).
    pub parameters: Value,
}

impl ToolSchema {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// `{content, metadata?, is_stream, is_last, is_interrupted, id}` (spec.md §4.4).
#[derive(Clone, Debug, PartialEq)]
pub struct ToolResponse {
    pub content: Vec<ContentBlock>,
    pub metadata: Option<Value>,
    pub is_stream: bool,
    pub is_last: bool,
    pub is_interrupted: bool,
    pub id: String,
}

impl ToolResponse {
    /// A normal, non-streaming response (spec.md §4.4: "Non-stream tools always
    /// produce `is_stream=false, is_last=true`").
    pub fn text(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            metadata: None,
            is_stream: false,
            is_last: true,
            is_interrupted: false,
            id: id.into(),
        }
    }

    /// Error taxonomy entry: single text block prefixed `"Error: "` (spec.md §4.4).
    pub fn error(id: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::text(id, format!("Error: {message}"))
    }

    /// Error taxonomy entry: tool name not found in the registry (spec.md §4.4).
    pub fn not_found(id: impl Into<String>, name: &str) -> Self {
        Self::error(id, format!("Tool not found: {name}"))
    }

    /// Error taxonomy entry: the batch-level timeout elapsed (spec.md §4.4, §5).
    pub fn timed_out(id: impl Into<String>) -> Self {
        Self::error(id, "Tool execution timed out")
    }

    /// Error taxonomy entry: cancellation observed mid-call (spec.md §4.4, §5).
    pub fn interrupted(id: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text("Interrupted")],
            metadata: None,
            is_stream: false,
            is_last: true,
            is_interrupted: true,
            id: id.into(),
        }
    }

    /// Concatenates all text blocks; used to build the tool-role `Msg` content
    /// and the single-chat wire message's content string (spec.md §4.1).
    pub fn as_text(&self) -> String {
        self.content
            .iter()
            .map(|b| b.as_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One canonical, fully-assembled tool invocation ready for dispatch
/// (the accumulator's finalized output, spec.md §4.3).
#[derive(Clone, Debug, PartialEq)]
pub struct ToolUseCall {
    pub id: String,
    pub name: String,
    pub input: Map<String, Value>,
}

/// A named callable the model can invoke (spec.md §4.4).
///
/// `call` returns `Result` purely for host ergonomics; the dispatcher converts
/// an `Err` into `ToolResponse::error("Tool execution failed: <message>")`
/// (spec.md §4.4) — the error never escapes as an `AgentError`.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn schema(&self) -> ToolSchema;
    async fn call(&self, input: Map<String, Value>) -> Result<ToolResponse, String>;
}

/// Maps a unique tool name to a callable plus its schema (spec.md §4.4).
///
/// Duplicate registrations overwrite silently (last-write-wins; callers
/// should treat re-registering a name as a programming error).
#[derive(Default)]
pub struct ToolRegistry {
    tools: DashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: DashMap::new(),
        }
    }

    /// Installs a tool, overwriting any existing registration with the same name.
    pub fn register(&self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn unregister(&self, name: &str) {
        self.tools.remove(name);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All schemas, for handing to the model adapter as tool-use instructions.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|entry| entry.value().schema()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
