//! Single-chat formatter: each `Msg` maps to exactly one wire message
//! (spec.md §4.1).

use crate::message::{ContentBlock, MediaSource, Msg, Role};

use super::wire::{serialize_tool_arguments, WireContentBlock, WireFunction, WireToolCall};
use super::{normalize_media_source, Capabilities, Formatter, WireContent, WireMessage};

/// The default, one-message-per-`Msg` formatter.
#[derive(Default)]
pub struct SingleChatFormatter;

impl SingleChatFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Formatter for SingleChatFormatter {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            provider_name: "single-chat".to_string(),
            supports_tool_api: true,
            supports_multi_agent: false,
            supports_vision: true,
            supported_block_kinds: vec![
                "text".to_string(),
                "thinking".to_string(),
                "tool_use".to_string(),
                "tool_result".to_string(),
                "image".to_string(),
                "audio".to_string(),
                "video".to_string(),
            ],
        }
    }

    fn format(&self, messages: &[Msg]) -> Vec<WireMessage> {
        messages.iter().map(format_one_message).collect()
    }
}

pub(crate) fn format_one_message(msg: &Msg) -> WireMessage {
    match (&msg.role, &msg.content) {
        (Role::System, content) => WireMessage::text("system", content.as_text()),

        (Role::Tool, ContentBlock::ToolResult { id, output, .. }) => WireMessage {
            role: "tool".to_string(),
            content: WireContent::Text(output.as_text()),
            tool_calls: None,
            tool_call_id: Some(id.clone()),
        },

        (_, ContentBlock::ToolUse { id, name, input, .. }) => WireMessage {
            role: "assistant".to_string(),
            content: WireContent::Blocks(vec![WireContentBlock::text("")]),
            tool_calls: Some(vec![WireToolCall {
                id: id.clone(),
                r#type: "function",
                function: WireFunction {
                    name: name.clone(),
                    arguments: serialize_tool_arguments(input),
                },
            }]),
            tool_call_id: None,
        },

        (role, ContentBlock::Image { source })
        | (role, ContentBlock::Audio { source })
        | (role, ContentBlock::Video { source }) => WireMessage {
            role: role.wire_str().to_string(),
            content: WireContent::Blocks(vec![media_block_for(&msg.content, source)]),
            tool_calls: None,
            tool_call_id: None,
        },

        (role, content) => WireMessage::text_block(role.wire_str(), content.as_text()),
    }
}

pub(crate) fn media_block_for(content: &ContentBlock, source: &MediaSource) -> WireContentBlock {
    let url = normalize_media_source(source);
    match content {
        ContentBlock::Image { .. } => WireContentBlock::image(url),
        ContentBlock::Audio { .. } => WireContentBlock::audio(url),
        ContentBlock::Video { .. } => WireContentBlock::video(url),
        _ => WireContentBlock::text(url),
    }
}
