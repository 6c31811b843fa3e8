//! Public agent surface: `reply`, `stream`, `register_tool`, composed from a
//! `ReActExecutor`.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::Stream;
use tokio_stream::wrappers::ReceiverStream;

use crate::adapter::ModelAdapter;
use crate::error::AgentError;
use crate::formatter::{Formatter, SingleChatFormatter, TruncationConfig};
use crate::hooks::{HookManager, PostHook, PreHook};
use crate::memory::Memory;
use crate::message::Msg;
use crate::options::GenerateOptions;
use crate::react::{ReActConfig, ReActExecutor};
use crate::tool::{Tool, ToolRegistry};

pub type MsgStream = Pin<Box<dyn Stream<Item = Msg> + Send>>;

/// The call surface a host interacts with. One built-in implementation,
/// `ReActAgent`, drives the Reason-Act loop; the trait exists so a host can
/// swap in an alternative control strategy without changing call sites.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn reply(&self, input: Vec<Msg>) -> Result<Msg, AgentError>;
    fn stream(&self, input: Vec<Msg>) -> MsgStream;
    fn register_tool(&self, tool: Arc<dyn Tool>);
}

/// Builds a `ReActAgent` with the composed pieces it needs; every field past
/// `formatter`/`adapter` has a sane default.
pub struct ReActAgentBuilder {
    formatter: Arc<dyn Formatter>,
    adapter: Arc<dyn ModelAdapter>,
    registry: Arc<ToolRegistry>,
    memory: Arc<Memory>,
    hooks: Arc<HookManager>,
    system_prompt: Msg,
    config: ReActConfig,
}

impl ReActAgentBuilder {
    pub fn new(adapter: Arc<dyn ModelAdapter>) -> Self {
        Self {
            formatter: Arc::new(SingleChatFormatter::new()),
            adapter,
            registry: Arc::new(ToolRegistry::new()),
            memory: Arc::new(Memory::new()),
            hooks: Arc::new(HookManager::new()),
            system_prompt: Msg::system("system", ""),
            config: ReActConfig::default(),
        }
    }

    pub fn formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn memory(mut self, memory: Arc<Memory>) -> Self {
        self.memory = memory;
        self
    }

    pub fn system_prompt(mut self, text: impl Into<String>) -> Self {
        self.system_prompt = Msg::system("system", text);
        self
    }

    pub fn max_iters(mut self, max_iters: usize) -> Self {
        self.config.max_iters = max_iters;
        self
    }

    pub fn parallel_tools(mut self, parallel: bool) -> Self {
        self.config.parallel_tools = parallel;
        self
    }

    pub fn tool_timeout(mut self, timeout: Duration) -> Self {
        self.config.tool_timeout = Some(timeout);
        self
    }

    pub fn generate_options(mut self, options: GenerateOptions) -> Self {
        self.config.generate_options = options;
        self
    }

    pub fn truncation(mut self, truncation: TruncationConfig) -> Self {
        self.config.truncation = Some(truncation);
        self
    }

    pub async fn pre_hook(self, hook: Arc<dyn PreHook>) -> Self {
        self.hooks.add_pre(hook).await;
        self
    }

    pub async fn post_hook(self, hook: Arc<dyn PostHook>) -> Self {
        self.hooks.add_post(hook).await;
        self
    }

    pub fn build(self) -> ReActAgent {
        ReActAgent {
            executor: Arc::new(ReActExecutor::new(
                self.formatter,
                self.adapter,
                self.registry,
                self.memory,
                self.hooks,
                self.system_prompt,
                self.config,
            )),
        }
    }
}

/// The built-in `Agent`: a thin, cheaply-cloneable handle around one
/// `ReActExecutor`.
#[derive(Clone)]
pub struct ReActAgent {
    executor: Arc<ReActExecutor>,
}

impl ReActAgent {
    pub fn builder(adapter: Arc<dyn ModelAdapter>) -> ReActAgentBuilder {
        ReActAgentBuilder::new(adapter)
    }

    pub fn memory(&self) -> &Arc<Memory> {
        self.executor.memory()
    }
}

#[async_trait]
impl Agent for ReActAgent {
    async fn reply(&self, input: Vec<Msg>) -> Result<Msg, AgentError> {
        self.executor.run(input, None).await
    }

    fn stream(&self, input: Vec<Msg>) -> MsgStream {
        let (tx, rx) = tokio::sync::mpsc::channel(32);
        let executor = self.executor.clone();
        tokio::spawn(async move {
            let _ = executor.run(input, Some(tx)).await;
        });
        Box::pin(ReceiverStream::new(rx))
    }

    fn register_tool(&self, tool: Arc<dyn Tool>) {
        self.executor.registry().register(tool);
    }
}
