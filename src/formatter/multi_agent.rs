//! Multi-agent collapsed-history formatter (spec.md §4.1).
//!
//! Messages that are not part of a tool sequence collapse into one synthetic
//! user message wrapped in `<history>` … `</history>`; tool-use and
//! tool-result messages are emitted individually, in their original relative
//! order, after the collapsed history (spec.md §8, property 7; S6 scenario).

use crate::message::{ContentBlock, Msg, Role};

use super::single_chat::format_one_message;
use super::wire::WireContentBlock;
use super::{Capabilities, Formatter, WireContent, WireMessage};

const HISTORY_OPEN: &str = "<history>\n";
const HISTORY_CLOSE: &str = "</history>";

/// Collapses plain conversational turns into one `<history>`-wrapped message;
/// emits tool-use/tool-result messages individually, after it.
#[derive(Default)]
pub struct MultiAgentFormatter;

impl MultiAgentFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Formatter for MultiAgentFormatter {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            provider_name: "multi-agent".to_string(),
            supports_tool_api: true,
            supports_multi_agent: true,
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
        let mut collapsible = Vec::new();
        let mut tool_sequence = Vec::new();

        for msg in messages {
            if is_tool_sequence(&msg.content) {
                tool_sequence.push(msg);
            } else {
                collapsible.push(msg);
            }
        }

        let mut out = Vec::new();
        if let Some(history) = build_history(&collapsible) {
            out.push(history);
        }
        out.extend(tool_sequence.into_iter().map(format_one_message));
        out
    }
}

fn is_tool_sequence(content: &ContentBlock) -> bool {
    matches!(
        content,
        ContentBlock::ToolUse { .. } | ContentBlock::ToolResult { .. }
    )
}

/// Builds the collapsed `<history>` wire message, flushing accumulated text
/// around any media block it encounters (spec.md §4.1).
fn build_history(messages: &[&Msg]) -> Option<WireMessage> {
    if messages.is_empty() {
        return None;
    }

    let mut segments: Vec<WireContentBlock> = Vec::new();
    let mut buffer = String::from(HISTORY_OPEN);

    for msg in messages {
        match &msg.content {
            ContentBlock::Image { source } | ContentBlock::Audio { source } | ContentBlock::Video { source } => {
                segments.push(WireContentBlock::text(std::mem::take(&mut buffer)));
                segments.push(super::single_chat::media_block_for(&msg.content, source));
            }
            other => {
                buffer.push_str(&history_line(msg.role, &msg.name, &other.as_text()));
                buffer.push('\n');
            }
        }
    }

    buffer.push_str(HISTORY_CLOSE);
    segments.push(WireContentBlock::text(buffer));

    Some(WireMessage {
        role: "user".to_string(),
        content: WireContent::Blocks(segments),
        tool_calls: None,
        tool_call_id: None,
    })
}

/// `"<Role> <name>: <text>"` per spec.md §8, property 7.
fn history_line(role: Role, name: &str, text: &str) -> String {
    format!("{} {}: {}", role.history_label(), name, text)
}

#[cfg(test)]
mod tests {
    use regex::Regex;

    use super::*;

    #[test]
    fn collapses_plain_turns_into_one_wrapped_history_message() {
        let messages = vec![
            Msg::user("Alice", "Hi"),
            Msg::assistant("Bot", "Hello"),
            Msg::user("Alice", "Bye"),
        ];
        let formatter = MultiAgentFormatter::new();
        let wire = formatter.format(&messages);
        assert_eq!(wire.len(), 1);
        assert_eq!(wire[0].role, "user");
        let text = match &wire[0].content {
            WireContent::Blocks(blocks) => blocks[0].text.clone().unwrap(),
            WireContent::Text(t) => t.clone(),
        };
        assert_eq!(
            text,
            "<history>\nUser Alice: Hi\nAssistant Bot: Hello\nUser Alice: Bye\n</history>"
        );
    }

    #[test]
    fn history_lines_match_the_role_name_text_regex() {
        let re = Regex::new(r"^(User|Assistant|System|Tool) \S+: .*$").unwrap();
        assert!(re.is_match("User Alice: Hi"));
        assert!(re.is_match("Assistant Bot: Hello"));
        assert!(!re.is_match("Alice: Hi"));
    }

    #[test]
    fn tool_sequence_messages_are_emitted_individually_after_history() {
        let messages = vec![
            Msg::user("Alice", "What time is it?"),
            Msg::new(
                "assistant",
                Role::Assistant,
                ContentBlock::ToolUse {
                    id: "call_1".to_string(),
                    name: "get_time".to_string(),
                    input: serde_json::Map::new(),
                    raw: None,
                },
            ),
            Msg::tool_result("system", "call_1", "get_time", ContentBlock::text("12:00:00")),
            Msg::assistant("assistant", "It is 12:00:00."),
        ];
        let formatter = MultiAgentFormatter::new();
        let wire = formatter.format(&messages);
        // One collapsed history message (user question + final answer) followed
        // by the tool-use and tool-result messages, in original relative order.
        assert_eq!(wire.len(), 3);
        assert_eq!(wire[0].role, "user");
        assert!(wire[1].tool_calls.is_some());
        assert_eq!(wire[2].role, "tool");
        assert_eq!(wire[2].tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn empty_collapsible_set_emits_no_history_message() {
        let messages = vec![Msg::new(
            "assistant",
            Role::Assistant,
            ContentBlock::ToolUse {
                id: "call_1".to_string(),
                name: "noop".to_string(),
                input: serde_json::Map::new(),
                raw: None,
            },
        )];
        let formatter = MultiAgentFormatter::new();
        let wire = formatter.format(&messages);
        assert_eq!(wire.len(), 1);
        assert!(wire[0].tool_calls.is_some());
    }
}
