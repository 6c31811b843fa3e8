//! `Msg` and `ContentBlock`: the polymorphic content-block model (spec.md §3).
//!
//! A `Msg` is immutable after construction; the only mutation path in the
//! whole crate is `Memory::append`, which moves an already-built `Msg` into
//! the log. Nothing ever edits a `Msg` in place.

use serde_json::{Map, Value};
use uuid::Uuid;

/// Who produced a `Msg`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    /// The label used by the multi-agent formatter's `<history>` lines (spec.md §4.1).
    pub fn history_label(&self) -> &'static str {
        match self {
            Role::System => "System",
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::Tool => "Tool",
        }
    }

    /// The wire-protocol role string (spec.md §6, OpenAI chat-completions convention).
    pub fn wire_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// Where a media block's bytes live.
#[derive(Clone, Debug, PartialEq)]
pub enum MediaSource {
    Url(String),
    Base64 { media_type: String, data: String },
}

/// The closed tagged variant described in spec.md §3.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentBlock {
    /// Plain assistant/user/system text.
    Text { text: String },
    /// Model reasoning commentary; never fed back as a tool argument (spec.md §3).
    Thinking { text: String },
    /// A pending or in-progress tool invocation.
    ToolUse {
        id: String,
        name: String,
        /// Parsed JSON-object form, when complete.
        input: Map<String, Value>,
        /// Still-unparsed argument fragment, when streaming.
        raw: Option<String>,
    },
    /// The result of a tool invocation; `id` must equal the originating `ToolUse`'s id.
    ToolResult {
        id: String,
        name: String,
        output: Box<ContentBlock>,
    },
    Image { source: MediaSource },
    Audio { source: MediaSource },
    Video { source: MediaSource },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn thinking(text: impl Into<String>) -> Self {
        ContentBlock::Thinking { text: text.into() }
    }

    /// Best-effort text projection used by the formatter, snapshotting, and the
    /// final `reply` aggregation. Never fails (spec.md §4.1, "Formatter never fails").
    pub fn as_text(&self) -> String {
        match self {
            ContentBlock::Text { text } => text.clone(),
            ContentBlock::Thinking { text } => text.clone(),
            ContentBlock::ToolUse {
                name, input, raw, ..
            } => {
                if !input.is_empty() {
                    format!(
                        "{name}({})",
                        Value::Object(input.clone())
                    )
                } else {
                    format!("{name}({})", raw.clone().unwrap_or_default())
                }
            }
            ContentBlock::ToolResult { output, .. } => output.as_text(),
            ContentBlock::Image { source } => media_description("image", source),
            ContentBlock::Audio { source } => media_description("audio", source),
            ContentBlock::Video { source } => media_description("video", source),
        }
    }

    /// Tag used in the memory snapshot's `contentType` field (spec.md §6).
    pub fn content_type(&self) -> &'static str {
        match self {
            ContentBlock::Text { .. } => "TEXT",
            ContentBlock::Thinking { .. } => "THINKING",
            ContentBlock::ToolUse { .. } => "TOOL_USE",
            ContentBlock::ToolResult { .. } => "TOOL_RESULT",
            ContentBlock::Image { .. } => "IMAGE",
            ContentBlock::Audio { .. } => "AUDIO",
            ContentBlock::Video { .. } => "VIDEO",
        }
    }
}

fn media_description(kind: &str, source: &MediaSource) -> String {
    match source {
        MediaSource::Url(url) => format!("[{kind}: {url}]"),
        MediaSource::Base64 { media_type, .. } => format!("[{kind}: {media_type}]"),
    }
}

/// An immutable message in the conversation log (spec.md §3).
#[derive(Clone, Debug, PartialEq)]
pub struct Msg {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub content: ContentBlock,
}

impl Msg {
    /// Builds a `Msg` with a freshly generated id.
    pub fn new(name: impl Into<String>, role: Role, content: ContentBlock) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            role,
            content,
        }
    }

    pub fn system(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, Role::System, ContentBlock::text(text))
    }

    pub fn user(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, Role::User, ContentBlock::text(text))
    }

    pub fn assistant(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, Role::Assistant, ContentBlock::text(text))
    }

    /// Builds the tool-role `Msg` for a `ToolResult`, per spec.md §3 invariant (i):
    /// role=tool implies content is `ToolResult` whose id references a prior `ToolUse`.
    pub fn tool_result(
        name: impl Into<String>,
        tool_use_id: impl Into<String>,
        tool_name: impl Into<String>,
        output: ContentBlock,
    ) -> Self {
        Self::new(
            name,
            Role::Tool,
            ContentBlock::ToolResult {
                id: tool_use_id.into(),
                name: tool_name.into(),
                output: Box::new(output),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn msg_ids_are_unique_per_construction() {
        let a = Msg::user("alice", "hi");
        let b = Msg::user("alice", "hi");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn content_block_as_text_for_tool_use_uses_input_when_present() {
        let mut input = Map::new();
        input.insert("zone".to_string(), Value::String("UTC".to_string()));
        let block = ContentBlock::ToolUse {
            id: "call_1".to_string(),
            name: "get_time".to_string(),
            input,
            raw: None,
        };
        assert_eq!(block.as_text(), "get_time({\"zone\":\"UTC\"})");
    }

    #[test]
    fn content_type_tags_match_spec_snapshot_vocabulary() {
        assert_eq!(ContentBlock::text("x").content_type(), "TEXT");
        assert_eq!(ContentBlock::thinking("x").content_type(), "THINKING");
    }
}
