//! Tool-call accumulator: reassembles streamed `ToolUse` fragments into one
//! canonical call (spec.md §4.3).
//!
//! One instance per reasoning stream; destroyed at stream completion
//! (spec.md §3, "Lifecycles"). Reconciles two provider conventions: fragments
//! that arrive pre-parsed (partial maps) and fragments that stream raw
//! tokens (a growing string).

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Map, Value};

use crate::message::ContentBlock;

/// Placeholder name used by non-first fragments (spec.md §4.2, §4.3).
pub const FRAGMENT_PLACEHOLDER: &str = "__fragment__";

static CALL_COUNTER: AtomicU64 = AtomicU64::new(0);

fn synthesize_id() -> String {
    format!("tool_call_{}", CALL_COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Accumulates `ToolUse` fragments for exactly one tool invocation.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    tool_id: Option<String>,
    name: Option<String>,
    args: Map<String, Value>,
    raw: String,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one fragment. Merge rules (spec.md §4.3):
    /// - non-empty id -> set `tool_id` (first write wins).
    /// - non-empty name other than the placeholder -> set `name`.
    /// - an `input` map, when present -> shallow-merge keys into `args`.
    /// - `raw` is always appended to the running buffer.
    pub fn feed(&mut self, fragment: &ContentBlock) {
        let ContentBlock::ToolUse {
            id, name, input, raw, ..
        } = fragment
        else {
            return;
        };

        if !id.is_empty() && self.tool_id.is_none() {
            self.tool_id = Some(id.clone());
        }
        if !name.is_empty() && name != FRAGMENT_PLACEHOLDER {
            self.name = Some(name.clone());
        }
        if !input.is_empty() {
            for (key, value) in input {
                self.args.insert(key.clone(), value.clone());
            }
        }
        if let Some(raw) = raw {
            self.raw.push_str(raw);
        }
    }

    /// Finalizes the accumulated fragments into one `ToolUse`, or `None` if no
    /// fragment ever carried a name (there was no tool call, spec.md §4.3).
    pub fn finish(self) -> Option<ContentBlock> {
        let name = self.name?;
        let id = self.tool_id.unwrap_or_else(synthesize_id);
        let input = if !self.args.is_empty() {
            self.args
        } else {
            match serde_json::from_str::<Value>(&self.raw) {
                Ok(Value::Object(map)) => map,
                _ => Map::new(),
            }
        };
        Some(ContentBlock::ToolUse {
            id,
            name,
            input,
            raw: None,
        })
    }
}
