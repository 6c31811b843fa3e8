//! Real OpenAI Chat Completions adapter (spec.md §4.2).
//!
//! Streams `wire_messages` through `async-openai`'s `create_stream`, converting
//! each provider delta into zero or more `ContentBlock`s and forwarding them as
//! `ChatResponse` chunks. Tool-call deltas follow the adapter-side fragment
//! convention spec.md §4.2 requires: the first delta seen for a given index
//! carries the real `id`/`name`; every later delta for that index carries the
//! `__fragment__` placeholder name and an empty id, with only `raw` growing.

use std::collections::HashSet;
use std::pin::Pin;

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionMessageToolCall, ChatCompletionMessageToolCalls,
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestToolMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionTool, ChatCompletionToolChoiceOption,
    ChatCompletionTools, CreateChatCompletionRequestArgs, FunctionCall, FunctionObject,
    ToolChoiceOptions,
};
use async_openai::Client;
use async_trait::async_trait;
use futures_util::StreamExt;
use serde_json::Map;

use crate::accumulator::FRAGMENT_PLACEHOLDER;
use crate::error::AgentError;
use crate::formatter::{WireContent, WireMessage};
use crate::message::ContentBlock;
use crate::options::GenerateOptions;
use crate::tool::ToolSchema;

use super::{ChatResponse, ChatResponseStream, ModelAdapter, Usage};

/// `ModelAdapter` backed by the real OpenAI (or an OpenAI-compatible) endpoint.
pub struct OpenAiAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiAdapter {
    /// Builds a client with default config (`OPENAI_API_KEY` from the environment).
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
        }
    }

    /// Builds a client with explicit config (custom API key or base URL).
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            model: model.into(),
        }
    }
}

fn wire_content_to_string(content: &WireContent) -> String {
    match content {
        WireContent::Text(text) => text.clone(),
        WireContent::Blocks(blocks) => blocks
            .iter()
            .filter_map(|b| b.text.clone())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Converts one formatted `WireMessage` into the matching `async-openai` request
/// message variant (spec.md §6, OpenAI chat-completions convention).
fn wire_message_to_request(message: &WireMessage) -> Result<ChatCompletionRequestMessage, AgentError> {
    let build_err = |e: async_openai::error::OpenAIError| {
        AgentError::Transport(format!("failed to build OpenAI request message: {e}"))
    };

    match message.role.as_str() {
        "system" => Ok(ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(wire_content_to_string(&message.content))
                .build()
                .map_err(build_err)?,
        )),
        "tool" => {
            let tool_call_id = message.tool_call_id.clone().unwrap_or_default();
            Ok(ChatCompletionRequestMessage::Tool(
                ChatCompletionRequestToolMessageArgs::default()
                    .content(wire_content_to_string(&message.content))
                    .tool_call_id(tool_call_id)
                    .build()
                    .map_err(build_err)?,
            ))
        }
        "assistant" => {
            let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
            builder.content(wire_content_to_string(&message.content));
            if let Some(tool_calls) = &message.tool_calls {
                let calls: Vec<ChatCompletionMessageToolCalls> = tool_calls
                    .iter()
                    .map(|call| {
                        ChatCompletionMessageToolCalls::Function(ChatCompletionMessageToolCall {
                            id: call.id.clone(),
                            function: FunctionCall {
                                name: call.function.name.clone(),
                                arguments: call.function.arguments.clone(),
                            },
                        })
                    })
                    .collect();
                builder.tool_calls(calls);
            }
            Ok(ChatCompletionRequestMessage::Assistant(
                builder.build().map_err(build_err)?,
            ))
        }
        _ => Ok(ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(wire_content_to_string(&message.content))
                .build()
                .map_err(build_err)?,
        )),
    }
}

fn schema_to_tool(schema: &ToolSchema) -> ChatCompletionTools {
    ChatCompletionTools::Function(ChatCompletionTool {
        function: FunctionObject {
            name: schema.name.clone(),
            description: Some(schema.description.clone()),
            parameters: Some(schema.parameters.clone()),
            ..Default::default()
        },
    })
}

#[async_trait]
impl ModelAdapter for OpenAiAdapter {
    async fn stream(
        &self,
        messages: &[WireMessage],
        tools: &[ToolSchema],
        options: &GenerateOptions,
    ) -> Result<ChatResponseStream, AgentError> {
        let request_messages = messages
            .iter()
            .map(wire_message_to_request)
            .collect::<Result<Vec<_>, _>>()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(request_messages);
        args.stream(true);

        if !tools.is_empty() {
            let chat_tools: Vec<ChatCompletionTools> = tools.iter().map(schema_to_tool).collect();
            args.tools(chat_tools);
            args.tool_choice(ChatCompletionToolChoiceOption::Mode(ToolChoiceOptions::Auto));
        }
        if let Some(temperature) = options.temperature {
            args.temperature(temperature);
        }
        if let Some(top_p) = options.top_p {
            args.top_p(top_p);
        }
        if let Some(max_tokens) = options.max_tokens {
            args.max_completion_tokens(max_tokens);
        }
        if let Some(frequency_penalty) = options.frequency_penalty {
            args.frequency_penalty(frequency_penalty);
        }
        if let Some(presence_penalty) = options.presence_penalty {
            args.presence_penalty(presence_penalty);
        }

        let request = args
            .build()
            .map_err(|e| AgentError::Transport(format!("failed to build OpenAI request: {e}")))?;

        let mut upstream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(|e| AgentError::Transport(format!("OpenAI stream error: {e}")))?;

        let (tx, rx) = tokio::sync::mpsc::channel(16);
        tokio::spawn(async move {
            // Indices for which we've already emitted the fragment carrying the
            // real id/name; every later delta at that index becomes a placeholder
            // fragment (spec.md §4.2).
            let mut seen_indices: HashSet<u32> = HashSet::new();

            while let Some(result) = upstream.next().await {
                let response = match result {
                    Ok(response) => response,
                    Err(_) => break,
                };

                let mut content = Vec::new();
                for choice in &response.choices {
                    if let Some(text) = &choice.delta.content {
                        if !text.is_empty() {
                            content.push(ContentBlock::text(text.clone()));
                        }
                    }
                    if let Some(tool_calls) = &choice.delta.tool_calls {
                        for delta in tool_calls {
                            let index = delta.index;
                            let is_first = seen_indices.insert(index);
                            let id = if is_first {
                                delta.id.clone().unwrap_or_default()
                            } else {
                                String::new()
                            };
                            let name = if is_first {
                                delta
                                    .function
                                    .as_ref()
                                    .and_then(|f| f.name.clone())
                                    .unwrap_or_default()
                            } else {
                                FRAGMENT_PLACEHOLDER.to_string()
                            };
                            let raw = delta
                                .function
                                .as_ref()
                                .and_then(|f| f.arguments.clone())
                                .unwrap_or_default();
                            content.push(ContentBlock::ToolUse {
                                id,
                                name,
                                input: Map::new(),
                                raw: Some(raw),
                            });
                        }
                    }
                }

                let usage = response.usage.as_ref().map(|u| Usage {
                    input_tokens: u.prompt_tokens,
                    output_tokens: u.completion_tokens,
                    wall_seconds: 0.0,
                });

                let chunk = ChatResponse {
                    id: response.id.clone(),
                    content,
                    usage,
                };
                if tx.send(chunk).await.is_err() {
                    break;
                }
            }
        });

        let stream: ChatResponseStream =
            Box::pin(tokio_stream::wrappers::ReceiverStream::new(rx))
                as Pin<Box<dyn futures_util::Stream<Item = ChatResponse> + Send>>;
        Ok(stream)
    }
}
