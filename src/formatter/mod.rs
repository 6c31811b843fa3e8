//! Message formatter: deterministic conversion of a memory-shaped `Msg` list
//! into the provider's wire-message list (spec.md §4.1).

mod multi_agent;
mod single_chat;
mod wire;

pub use multi_agent::MultiAgentFormatter;
pub use single_chat::SingleChatFormatter;
pub use wire::{
    serialize_tool_arguments, WireContent, WireContentBlock, WireFunction, WireMessage,
    WireToolCall,
};

use std::path::Path;
use std::sync::Arc;

use crate::message::{MediaSource, Msg};

/// `{provider_name, supports_tool_api, supports_multi_agent, supports_vision,
/// supported_block_kinds}` (spec.md §4.1). Documentation for the host; the
/// core never branches through it.
#[derive(Clone, Debug, PartialEq)]
pub struct Capabilities {
    pub provider_name: String,
    pub supports_tool_api: bool,
    pub supports_multi_agent: bool,
    pub supports_vision: bool,
    pub supported_block_kinds: Vec<String>,
}

/// Converts a `Msg` list into the provider's wire-message list.
///
/// Implementations never fail: malformed inputs produce best-effort strings;
/// unknown block types degrade to their text representation (spec.md §4.1).
pub trait Formatter: Send + Sync {
    fn capabilities(&self) -> Capabilities;
    fn format(&self, messages: &[Msg]) -> Vec<WireMessage>;
}

/// Post-pass (spec.md §4.1): for each wire message whose `content` is a list
/// in which every entry has only a `text` field, replace the list with the
/// concatenation of those texts joined by `"\n"`. Mixed content lists
/// (>= 1 non-text entry) remain lists (spec.md §8, property 6).
pub fn collapse_all_text_lists(messages: Vec<WireMessage>) -> Vec<WireMessage> {
    messages
        .into_iter()
        .map(|mut message| {
            if let WireContent::Blocks(blocks) = &message.content {
                if !blocks.is_empty() && blocks.iter().all(WireContentBlock::is_text_only) {
                    let joined = blocks
                        .iter()
                        .map(|b| b.text.clone().unwrap_or_default())
                        .collect::<Vec<_>>()
                        .join("\n");
                    message.content = WireContent::Text(joined);
                }
            }
            message
        })
        .collect()
}

/// Rewrites a bare filesystem path that exists on disk to `file://<absolute>`;
/// everything else (http(s) URLs, already-`file://` URLs, data URIs) passes
/// through unchanged (spec.md §4.1).
pub fn normalize_url(raw: &str) -> String {
    let has_scheme = raw.contains("://") || raw.starts_with("data:");
    if has_scheme {
        return raw.to_string();
    }
    let path = Path::new(raw);
    if path.exists() {
        let absolute = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf());
        format!("file://{}", absolute.display())
    } else {
        raw.to_string()
    }
}

/// Projects a `MediaSource` to the wire string spec.md §4.1 calls `normalized_url`.
pub fn normalize_media_source(source: &MediaSource) -> String {
    match source {
        MediaSource::Url(url) => normalize_url(url),
        MediaSource::Base64 { media_type, data } => format!("data:{media_type};base64,{data}"),
    }
}

/// Counts tokens in a string. Implementations are pluggable so hosts can wire
/// in a provider-accurate tokenizer; `WhitespaceTokenCounter` is a deterministic
/// stand-in used by tests and as a sane default.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// A simple, deterministic counter: one token per whitespace-separated word.
pub struct WhitespaceTokenCounter;

impl TokenCounter for WhitespaceTokenCounter {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

/// Configuration for the optional token-driven truncation pass (spec.md §4.1).
#[derive(Clone)]
pub struct TruncationConfig {
    pub counter: Arc<dyn TokenCounter>,
    pub max_tokens: usize,
    /// Fixed overhead counted per wire message, alongside its content and
    /// tool-call argument strings (spec.md §4.1).
    pub per_message_overhead: usize,
}

fn count_wire_tokens(messages: &[WireMessage], config: &TruncationConfig) -> usize {
    messages
        .iter()
        .map(|message| {
            let mut total = config.per_message_overhead;
            match &message.content {
                WireContent::Text(text) => total += config.counter.count(text),
                WireContent::Blocks(blocks) => {
                    for block in blocks {
                        if let Some(text) = &block.text {
                            total += config.counter.count(text);
                        }
                    }
                }
            }
            if let Some(tool_calls) = &message.tool_calls {
                for call in tool_calls {
                    total += config.counter.count(&call.function.arguments);
                }
            }
            total
        })
        .sum()
}

/// Formats `messages`, then — if `truncation` is configured — repeatedly
/// removes the oldest non-system message and reformats until the counted
/// tokens are within the cap or only system messages remain (spec.md §4.1).
pub fn format_with_truncation(
    formatter: &dyn Formatter,
    messages: &[Msg],
    truncation: Option<&TruncationConfig>) -> Vec<WireMessage> {
    let Some(config) = truncation else {
        return collapse_all_text_lists(formatter.format(messages));
    };

    let mut working: Vec<Msg> = messages.to_vec();
    loop {
        let wire = collapse_all_text_lists(formatter.format(&working));
        if count_wire_tokens(&wire, config) <= config.max_tokens {
            return wire;
        }
        let oldest_non_system = working
            .iter()
            .position(|m| m.role != crate::message::Role::System);
        match oldest_non_system {
            Some(index) => {
                working.remove(index);
            }
            None => return wire,
        }
    }
}
