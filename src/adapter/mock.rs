//! A deterministic, scriptable `ModelAdapter` for tests. Each call to
//! `stream` pops the next scripted chunk sequence off the queue; the last
//! script is replayed forever when `repeat_last` is set, so a fixed-size
//! scenario can still drive an unbounded number of reasoning phases.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::AgentError;
use crate::formatter::WireMessage;
use crate::options::GenerateOptions;
use crate::tool::ToolSchema;

use super::{ChatResponse, ChatResponseStream, ModelAdapter};

pub struct MockAdapter {
    scripts: Mutex<Vec<Vec<ChatResponse>>>,
    repeat_last: bool,
}

impl MockAdapter {
    /// One script per expected call, consumed front-to-back.
    pub fn with_script(scripts: Vec<Vec<ChatResponse>>) -> Self {
        Self {
            scripts: Mutex::new(scripts),
            repeat_last: false,
        }
    }

    /// The same chunk sequence on every call, however many times it's made.
    pub fn repeating(script: Vec<ChatResponse>) -> Self {
        Self {
            scripts: Mutex::new(vec![script]),
            repeat_last: true,
        }
    }
}

#[async_trait]
impl ModelAdapter for MockAdapter {
    async fn stream(
        &self,
        _messages: &[WireMessage],
        _tools: &[ToolSchema],
        _options: &GenerateOptions,
    ) -> Result<ChatResponseStream, AgentError> {
        let chunks = {
            let mut scripts = self.scripts.lock().expect("mock adapter lock poisoned");
            if self.repeat_last {
                scripts.last().cloned().unwrap_or_default()
            } else if scripts.is_empty() {
                Vec::new()
            } else {
                scripts.remove(0)
            }
        };

        let (tx, rx) = tokio::sync::mpsc::channel(chunks.len().max(1));
        for chunk in chunks {
            tx.send(chunk)
                .await
                .map_err(|_| AgentError::Transport("mock adapter channel closed".to_string()))?;
        }
        drop(tx);
        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;

    use crate::message::ContentBlock;

    use super::*;

    #[tokio::test]
    async fn replays_scripts_in_order_then_exhausts() {
        let adapter = MockAdapter::with_script(vec![
            vec![ChatResponse {
                id: "r1".to_string(),
                content: vec![ContentBlock::text("first")],
                usage: None,
            }],
            vec![ChatResponse {
                id: "r2".to_string(),
                content: vec![ContentBlock::text("second")],
                usage: None,
            }],
        ]);
        let options = GenerateOptions::new();

        let mut first = adapter.stream(&[], &[], &options).await.unwrap();
        let chunk = first.next().await.unwrap();
        assert_eq!(chunk.id, "r1");
        assert!(first.next().await.is_none());

        let mut second = adapter.stream(&[], &[], &options).await.unwrap();
        let chunk = second.next().await.unwrap();
        assert_eq!(chunk.id, "r2");

        let mut third = adapter.stream(&[], &[], &options).await.unwrap();
        assert!(third.next().await.is_none());
    }

    #[tokio::test]
    async fn repeating_adapter_replays_the_same_script_forever() {
        let adapter = MockAdapter::repeating(vec![ChatResponse {
            id: "r".to_string(),
            content: vec![ContentBlock::text("again")],
            usage: None,
        }]);
        let options = GenerateOptions::new();

        for _ in 0..5 {
            let mut stream = adapter.stream(&[], &[], &options).await.unwrap();
            let chunk = stream.next().await.unwrap();
            assert_eq!(chunk.id, "r");
        }
    }
}
