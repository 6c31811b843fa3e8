//! Pre/post hook pipeline. Hooks are ordered, registered per agent instance,
//! and failure-isolated: a hook that returns `Err` is logged and skipped —
//! later hooks, and the core loop, see the value as it stood before that
//! hook ran.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::message::Msg;

/// Runs before the reasoning loop starts, given the caller-supplied input
/// messages. Returns the (possibly rewritten) messages to feed the loop.
#[async_trait]
pub trait PreHook: Send + Sync {
    async fn run(&self, args: Vec<Msg>) -> Result<Vec<Msg>, String>;
}

/// Runs once per `Msg` the loop emits (text, thinking, or tool-use). Returning
/// `Ok(None)` passes the message through unchanged.
#[async_trait]
pub trait PostHook: Send + Sync {
    async fn run(&self, output: Msg) -> Result<Option<Msg>, String>;
}

/// An ordered, mutable set of pre/post hooks, owned by one agent instance.
#[derive(Default)]
pub struct HookManager {
    pre: RwLock<Vec<Arc<dyn PreHook>>>,
    post: RwLock<Vec<Arc<dyn PostHook>>>,
}

impl HookManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_pre(&self, hook: Arc<dyn PreHook>) {
        self.pre.write().await.push(hook);
    }

    pub async fn add_post(&self, hook: Arc<dyn PostHook>) {
        self.post.write().await.push(hook);
    }

    pub async fn clear(&self) {
        self.pre.write().await.clear();
        self.post.write().await.clear();
    }

    /// Applies every pre-hook in registration order. A hook that errors is
    /// logged and its input passes through to the next hook unchanged.
    pub async fn run_pre(&self, args: Vec<Msg>) -> Vec<Msg> {
        let hooks = self.pre.read().await.clone();
        let mut current = args;
        for hook in hooks {
            match hook.run(current.clone()).await {
                Ok(rewritten) => current = rewritten,
                Err(reason) => {
                    tracing::warn!(error = %reason, "pre-hook failed, passing input through unchanged");
                }
            }
        }
        current
    }

    /// Applies every post-hook in registration order to one emitted `Msg`.
    pub async fn run_post(&self, output: Msg) -> Msg {
        let hooks = self.post.read().await.clone();
        let mut current = output;
        for hook in hooks {
            match hook.run(current.clone()).await {
                Ok(Some(replacement)) => current = replacement,
                Ok(None) => {}
                Err(reason) => {
                    tracing::warn!(error = %reason, "post-hook failed, passing output through unchanged");
                }
            }
        }
        current
    }
}
