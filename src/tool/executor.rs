//! Parallel/sequential tool dispatcher with cancellation, timeout, and
//! per-call error isolation (spec.md §4.4, §5).

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{ToolRegistry, ToolResponse, ToolUseCall};

/// Options controlling one `dispatch` batch.
#[derive(Clone, Default)]
pub struct DispatchOptions {
    /// When `true`, invocations run concurrently; when `false`, one after another
    /// (spec.md §4.4, §5).
    pub parallel: bool,
    /// Per-batch timeout: on expiry every pending response becomes
    /// `error("Tool execution timed out")` (spec.md §4.4).
    pub timeout: Option<Duration>,
    /// Cancellation observed by in-flight calls; produces `interrupted()`
    /// responses for calls that notice it (spec.md §5).
    pub cancellation: Option<CancellationToken>,
}

/// Runs a batch of tool calls, returning responses in the same order as the
/// input `calls` regardless of `parallel` or per-call latency (spec.md §4.4,
/// property 3 in spec.md §8).
pub async fn dispatch(
    registry: &ToolRegistry,
    calls: &[ToolUseCall],
    options: DispatchOptions,
) -> Vec<ToolResponse> {
    let run = async {
        if options.parallel {
            dispatch_parallel(registry, calls, options.cancellation.clone()).await
        } else {
            dispatch_sequential(registry, calls, options.cancellation.clone()).await
        }
    };

    match options.timeout {
        Some(duration) => match tokio::time::timeout(duration, run).await {
            Ok(responses) => responses,
            Err(_) => calls
                .iter()
                .map(|call| ToolResponse::timed_out(call.id.clone()))
                .collect(),
        },
        None => run.await,
    }
}

async fn dispatch_sequential(
    registry: &ToolRegistry,
    calls: &[ToolUseCall],
    cancellation: Option<CancellationToken>,
) -> Vec<ToolResponse> {
    let mut responses = Vec::with_capacity(calls.len());
    for call in calls {
        responses.push(invoke_one(registry, call, cancellation.clone()).await);
    }
    responses
}

async fn dispatch_parallel(
    registry: &ToolRegistry,
    calls: &[ToolUseCall],
    cancellation: Option<CancellationToken>,
) -> Vec<ToolResponse> {
    let handles: Vec<_> = calls
        .iter()
        .cloned()
        .map(|call| {
            let registry_tool = registry.get(&call.name);
            let cancellation = cancellation.clone();
            tokio::spawn(async move { invoke_resolved(registry_tool, call, cancellation).await })
        })
        .collect();

    let mut responses = Vec::with_capacity(handles.len());
    for (handle, call) in handles.into_iter().zip(calls.iter()) {
        match handle.await {
            Ok(response) => responses.push(response),
            Err(_) => responses.push(ToolResponse::error(
                call.id.clone(),
                "Tool execution failed: task panicked",
            )),
        }
    }
    responses
}

async fn invoke_one(
    registry: &ToolRegistry,
    call: &ToolUseCall,
    cancellation: Option<CancellationToken>,
) -> ToolResponse {
    let tool = registry.get(&call.name);
    invoke_resolved(tool, call.clone(), cancellation).await
}

async fn invoke_resolved(
    tool: Option<std::sync::Arc<dyn super::Tool>>,
    call: ToolUseCall,
    cancellation: Option<CancellationToken>,
) -> ToolResponse {
    let Some(tool) = tool else {
        return ToolResponse::not_found(call.id, &call.name);
    };

    let invocation = tool.call(call.input.clone());

    let outcome = match cancellation {
        Some(token) => {
            tokio::select! {
                result = invocation => Ok(result),
                _ = token.cancelled() => Err(()),
            }
        }
        None => Ok(invocation.await),
    };

    match outcome {
        Ok(Ok(mut response)) => {
            response.id = call.id;
            response
        }
        Ok(Err(message)) => ToolResponse::error(call.id, format!("Tool execution failed: {message}")),
        Err(()) => ToolResponse::interrupted(call.id),
    }
}
