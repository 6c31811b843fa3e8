//! The Reason-Act control loop: open a model stream, reassemble tool-call
//! fragments, dispatch completed calls, and repeat until the model stops
//! asking for tools or the iteration cap is reached.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::accumulator::ToolCallAccumulator;
use crate::adapter::ModelAdapter;
use crate::error::AgentError;
use crate::formatter::{format_with_truncation, Formatter, TruncationConfig};
use crate::hooks::HookManager;
use crate::memory::Memory;
use crate::message::{ContentBlock, Msg, Role};
use crate::options::GenerateOptions;
use crate::tool::{dispatch, DispatchOptions, ToolRegistry, ToolUseCall};

/// `true` once the caller has dropped the receiving end of `sender` (spec.md
/// §4.2/§5: dropping the returned stream must release the underlying call).
fn sender_closed(sender: &Option<mpsc::Sender<Msg>>) -> bool {
    sender.as_ref().is_some_and(|tx| tx.is_closed())
}

/// Everything about a run that isn't one of the composed components.
#[derive(Clone)]
pub struct ReActConfig {
    /// Hard cap on the number of reasoning phases in one run. Reaching it
    /// ends the run silently; the returned `Msg` may have empty text.
    pub max_iters: usize,
    /// Whether a reasoning phase's tool-use batch dispatches concurrently.
    pub parallel_tools: bool,
    pub tool_timeout: Option<Duration>,
    pub generate_options: GenerateOptions,
    pub truncation: Option<TruncationConfig>,
}

impl Default for ReActConfig {
    fn default() -> Self {
        Self {
            max_iters: 10,
            parallel_tools: false,
            tool_timeout: None,
            generate_options: GenerateOptions::default(),
            truncation: None,
        }
    }
}

/// Composed Reason-Act executor: a `Formatter`, a `ModelAdapter`, a
/// `ToolRegistry`, a `Memory`, and a `HookManager`, run as a loop instead of
/// as a compiled graph of nodes.
pub struct ReActExecutor {
    formatter: Arc<dyn Formatter>,
    adapter: Arc<dyn ModelAdapter>,
    registry: Arc<ToolRegistry>,
    memory: Arc<Memory>,
    hooks: Arc<HookManager>,
    system_prompt: Msg,
    config: ReActConfig,
}

impl ReActExecutor {
    pub fn new(
        formatter: Arc<dyn Formatter>,
        adapter: Arc<dyn ModelAdapter>,
        registry: Arc<ToolRegistry>,
        memory: Arc<Memory>,
        hooks: Arc<HookManager>,
        system_prompt: Msg,
        config: ReActConfig,
    ) -> Self {
        Self {
            formatter,
            adapter,
            registry,
            memory,
            hooks,
            system_prompt,
            config,
        }
    }

    pub fn memory(&self) -> &Arc<Memory> {
        &self.memory
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn hooks(&self) -> &Arc<HookManager> {
        &self.hooks
    }

    /// Runs one full reply: appends `input` to memory, drives reasoning/acting
    /// phases up to `max_iters` times, and returns the aggregated assistant
    /// reply. When `sender` is set, every intermediate text/thinking/tool-use
    /// `Msg` is forwarded to it as it's produced (used by `stream`).
    pub async fn run(
        &self,
        input: Vec<Msg>,
        sender: Option<mpsc::Sender<Msg>>,
    ) -> Result<Msg, AgentError> {
        let args = self.hooks.run_pre(input).await;
        self.memory.append_all(args).await;

        let mut emitted: Vec<Msg> = Vec::new();
        let cancellation = CancellationToken::new();

        for _ in 0..self.config.max_iters {
            if sender_closed(&sender) {
                cancellation.cancel();
                break;
            }

            let new_messages = self
                .reasoning_phase(&mut emitted, &sender, &cancellation)
                .await?;
            let last = new_messages.last().expect("reasoning phase always appends at least one message");

            if !self.is_registered_tool_use(last) || cancellation.is_cancelled() {
                break;
            }

            self.acting_phase(&new_messages, &cancellation).await;
        }

        Ok(aggregate_reply(&emitted))
    }

    fn is_registered_tool_use(&self, msg: &Msg) -> bool {
        matches!(&msg.content, ContentBlock::ToolUse { name, .. } if self.registry.contains(name))
    }

    /// Opens one model stream, feeding `ToolUse` fragments into per-call
    /// accumulators (a fresh accumulator starts whenever a fragment carries a
    /// new non-empty id) and forwarding `Text`/`Thinking` fragments downstream
    /// as they arrive. On stream completion, appends either the finished
    /// tool-use message(s) or one aggregated text message to memory.
    async fn reasoning_phase(
        &self,
        emitted: &mut Vec<Msg>,
        sender: &Option<mpsc::Sender<Msg>>,
        cancellation: &CancellationToken,
    ) -> Result<Vec<Msg>, AgentError> {
        let mut history = vec![self.system_prompt.clone()];
        history.extend(self.memory.messages().await);
        let wire = format_with_truncation(&*self.formatter, &history, self.config.truncation.as_ref());
        let schemas = self.registry.schemas();

        let mut stream = self
            .adapter
            .stream(&wire, &schemas, &self.config.generate_options)
            .await?;

        let mut current: Option<ToolCallAccumulator> = None;
        let mut finished_calls: Vec<ContentBlock> = Vec::new();
        let mut text_buf = String::new();

        'chunks: while let Some(chunk) = stream.next().await {
            for block in chunk.content {
                match &block {
                    ContentBlock::ToolUse { id, .. } => {
                        if !id.is_empty() {
                            if let Some(acc) = current.take() {
                                if let Some(call) = acc.finish() {
                                    finished_calls.push(call);
                                }
                            }
                            let mut acc = ToolCallAccumulator::new();
                            acc.feed(&block);
                            current = Some(acc);
                        } else {
                            current.get_or_insert_with(ToolCallAccumulator::new).feed(&block);
                        }
                    }
                    ContentBlock::Text { text } => {
                        text_buf.push_str(text);
                        if !self
                            .emit(emitted, sender, Msg::assistant("assistant", text.clone()))
                            .await
                        {
                            cancellation.cancel();
                            break 'chunks;
                        }
                    }
                    ContentBlock::Thinking { text } => {
                        if !self
                            .emit(
                                emitted,
                                sender,
                                Msg::new("assistant", Role::Assistant, ContentBlock::thinking(text.clone())),
                            )
                            .await
                        {
                            cancellation.cancel();
                            break 'chunks;
                        }
                    }
                    _ => {}
                }
            }

            if sender_closed(sender) {
                cancellation.cancel();
                break;
            }
        }
        // Dropping `stream` here (scope end) releases the adapter's underlying
        // network/worker resources whether the loop ran to completion or broke
        // early on cancellation (spec.md §4.2, §5).
        drop(stream);

        if let Some(acc) = current.take() {
            if let Some(call) = acc.finish() {
                finished_calls.push(call);
            }
        }

        if finished_calls.is_empty() {
            let msg = Msg::assistant("assistant", text_buf);
            self.memory.append(msg.clone()).await;
            Ok(vec![msg])
        } else {
            let msgs: Vec<Msg> = finished_calls
                .into_iter()
                .map(|content| Msg::new("assistant", Role::Assistant, content))
                .collect();
            for msg in &msgs {
                if !self.emit(emitted, sender, msg.clone()).await {
                    cancellation.cancel();
                }
            }
            self.memory.append_all(msgs.clone()).await;
            Ok(msgs)
        }
    }

    /// Forwards one emitted `Msg` to the streaming caller, if any. Returns
    /// `false` once the caller has dropped its receiver, so the reasoning
    /// phase can stop pulling from the model stream instead of running to
    /// completion against a dropped consumer (spec.md §4.2, §5).
    async fn emit(&self, emitted: &mut Vec<Msg>, sender: &Option<mpsc::Sender<Msg>>, msg: Msg) -> bool {
        let msg = self.hooks.run_post(msg).await;
        let still_connected = match sender {
            Some(tx) => tx.send(msg.clone()).await.is_ok(),
            None => true,
        };
        emitted.push(msg);
        still_connected
    }

    /// Dispatches every `ToolUse` message produced this reasoning phase as one
    /// batch and appends the resulting tool-result messages to memory.
    /// `cancellation` is threaded into the dispatcher so an in-flight tool call
    /// observes the same cancellation signal that stopped the reasoning phase
    /// (spec.md §5).
    async fn acting_phase(&self, tool_use_messages: &[Msg], cancellation: &CancellationToken) {
        let calls: Vec<ToolUseCall> = tool_use_messages
            .iter()
            .filter_map(|msg| match &msg.content {
                ContentBlock::ToolUse { id, name, input, .. } => Some(ToolUseCall {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                }),
                _ => None,
            })
            .collect();

        let responses = dispatch(
            &self.registry,
            &calls,
            DispatchOptions {
                parallel: self.config.parallel_tools,
                timeout: self.config.tool_timeout,
                cancellation: Some(cancellation.clone()),
            },
        )
        .await;

        let results: Vec<Msg> = calls
            .iter()
            .zip(responses.iter())
            .map(|(call, response)| {
                Msg::tool_result(
                    "tool",
                    call.id.clone(),
                    call.name.clone(),
                    ContentBlock::text(response.as_text()),
                )
            })
            .collect();

        self.memory.append_all(results).await;
    }
}

/// Final reply aggregation: starting just after the last `ToolUse` message in
/// the emitted stream (or from the start, if there was none), concatenate the
/// text of every `Text` block. `Thinking` blocks never contribute — a model's
/// scratch reasoning is not part of the answer it hands back to the caller.
fn aggregate_reply(emitted: &[Msg]) -> Msg {
    let start = emitted
        .iter()
        .rposition(|msg| matches!(msg.content, ContentBlock::ToolUse { .. }))
        .map(|index| index + 1)
        .unwrap_or(0);

    let text = emitted[start..]
        .iter()
        .filter_map(|msg| match &msg.content {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<String>();

    Msg::assistant("assistant", text)
}
