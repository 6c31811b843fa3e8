//! Ordered, append-only conversation log (spec.md §3, §4.5 invariant (iii)).
//!
//! Reads and writes must never observe a torn state: a `snapshot` taken
//! concurrently with an `append` reflects either the pre- or post-append
//! state (spec.md §5). `tokio::sync::RwLock` gives us that for free — a
//! writer holds the lock for the whole append, a reader for the whole copy.

use tokio::sync::RwLock;

use crate::message::{ContentBlock, Msg, Role};

/// One entry in a memory snapshot (spec.md §6).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MsgRecord {
    pub id: String,
    pub name: String,
    pub role: String,
    pub content: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
}

/// A whole memory snapshot (spec.md §6).
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MemorySnapshot {
    pub messages: Vec<MsgRecord>,
}

/// Ordered, append-only conversation log.
///
/// Supported operations: `append`, `snapshot`, `restore`, `clear` — no
/// deletion or reorder (spec.md §3).
#[derive(Default)]
pub struct Memory {
    messages: RwLock<Vec<Msg>>,
}

impl Memory {
    pub fn new() -> Self {
        Self {
            messages: RwLock::new(Vec::new()),
        }
    }

    /// Appends one message. Memory length is monotonically non-decreasing
    /// except through `clear` (spec.md §8, property 9).
    pub async fn append(&self, msg: Msg) {
        self.messages.write().await.push(msg);
    }

    /// Appends several messages in order, under a single write lock, so the
    /// acting-phase batch (spec.md §4.5) lands as one atomic extension.
    pub async fn append_all(&self, msgs: impl IntoIterator<Item = Msg>) {
        let mut guard = self.messages.write().await;
        guard.extend(msgs);
    }

    /// Returns a copy of the full log in order.
    pub async fn messages(&self) -> Vec<Msg> {
        self.messages.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }

    /// Text-canonical snapshot (spec.md §6): non-text content types are
    /// preserved in `contentType` but only their text projection survives.
    pub async fn snapshot(&self) -> MemorySnapshot {
        let guard = self.messages.read().await;
        let records = guard
            .iter()
            .map(|m| MsgRecord {
                id: m.id.clone(),
                name: m.name.clone(),
                role: role_tag(m.role).to_string(),
                content: m.content.as_text(),
                content_type: m.content.content_type().to_string(),
            })
            .collect();
        MemorySnapshot { messages: records }
    }

    /// Rebuilds the log from a snapshot. Non-text content types are not
    /// recreated losslessly; text is canonical in the snapshot (spec.md §6).
    pub async fn restore(&self, snapshot: MemorySnapshot) {
        let mut guard = self.messages.write().await;
        guard.clear();
        for record in snapshot.messages {
            let role = parse_role_tag(&record.role);
            guard.push(Msg {
                id: record.id,
                name: record.name,
                role,
                content: ContentBlock::Text {
                    text: record.content,
                },
            });
        }
    }

    pub async fn clear(&self) {
        self.messages.write().await.clear();
    }
}

fn role_tag(role: Role) -> &'static str {
    match role {
        Role::System => "SYSTEM",
        Role::User => "USER",
        Role::Assistant => "ASSISTANT",
        Role::Tool => "TOOL",
    }
}

fn parse_role_tag(tag: &str) -> Role {
    match tag {
        "SYSTEM" => Role::System,
        "ASSISTANT" => Role::Assistant,
        "TOOL" => Role::Tool,
        _ => Role::User,
    }
}
