//! Model adapter: opens a provider streaming call and parses provider chunks
//! into `ChatResponse`s of `ContentBlock`s (spec.md §4.2).

mod mock;
mod openai;

pub use mock::MockAdapter;
pub use openai::OpenAiAdapter;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use crate::error::AgentError;
use crate::formatter::WireMessage;
use crate::message::ContentBlock;
use crate::options::GenerateOptions;
use crate::tool::ToolSchema;

/// Token usage for one model call (spec.md §3).
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub wall_seconds: f64,
}

/// One chunk in the finite sequence a streaming call produces (spec.md §3).
///
/// Content blocks describe what arrived since the previous chunk, in the
/// order the provider sent the underlying tokens. The final chunk may carry
/// usage totals; a chunk's `usage` replaces the last non-null value seen so
/// far (spec.md §4.2).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChatResponse {
    pub id: String,
    pub content: Vec<ContentBlock>,
    pub usage: Option<Usage>,
}

/// A boxed, pinned stream of `ChatResponse` chunks. Dropping it before
/// exhaustion is how callers cancel an in-flight call (spec.md §4.2, §5).
pub type ChatResponseStream = Pin<Box<dyn Stream<Item = ChatResponse> + Send>>;

/// Opens a provider streaming call with `(wire_messages, tool_schemas, options)`.
#[async_trait]
pub trait ModelAdapter: Send + Sync {
    async fn stream(
        &self,
        messages: &[WireMessage],
        tools: &[ToolSchema],
        options: &GenerateOptions,
    ) -> Result<ChatResponseStream, AgentError>;
}
