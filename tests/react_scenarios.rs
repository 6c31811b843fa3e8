//! End-to-end scenarios from spec.md §8 (S1-S6), driven through the public
//! `Agent` surface against a scripted `MockAdapter` — no network access.

mod init_logging;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use skein::accumulator::FRAGMENT_PLACEHOLDER;
use skein::adapter::MockAdapter;
use skein::formatter::MultiAgentFormatter;
use skein::{
    Agent, ChatResponse, ContentBlock, Formatter, Msg, ReActAgent, ReActAgentBuilder, Role, Tool,
    ToolResponse, ToolSchema,
};

struct GetTime;

#[async_trait]
impl Tool for GetTime {
    fn name(&self) -> &str {
        "get_time"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "get_time",
            "returns the current time for a timezone",
            serde_json::json!({
                "type": "object",
                "properties": {"zone": {"type": "string"}},
                "required": ["zone"]
            }),
        )
    }

    async fn call(&self, input: Map<String, Value>) -> Result<ToolResponse, String> {
        let zone = input.get("zone").and_then(Value::as_str).unwrap_or("?");
        assert_eq!(zone, "UTC");
        Ok(ToolResponse::text("unused", "12:00:00"))
    }
}

struct Echo;

#[async_trait]
impl Tool for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "echo",
            "echoes the text argument back",
            serde_json::json!({
                "type": "object",
                "properties": {"text": {"type": "string"}},
                "required": ["text"]
            }),
        )
    }

    async fn call(&self, input: Map<String, Value>) -> Result<ToolResponse, String> {
        let text = input.get("text").and_then(Value::as_str).unwrap_or("");
        Ok(ToolResponse::text("unused", text))
    }
}

struct LoopTool;

#[async_trait]
impl Tool for LoopTool {
    fn name(&self) -> &str {
        "loop"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            "loop",
            "always succeeds",
            serde_json::json!({"type": "object", "properties": {}}),
        )
    }

    async fn call(&self, _input: Map<String, Value>) -> Result<ToolResponse, String> {
        Ok(ToolResponse::text("unused", "ok"))
    }
}

fn text_chunk(text: &str) -> ChatResponse {
    ChatResponse {
        id: "r".to_string(),
        content: vec![ContentBlock::text(text)],
        usage: None,
    }
}

fn tool_use_fragment(id: &str, name: &str, raw: &str) -> ContentBlock {
    ContentBlock::ToolUse {
        id: id.to_string(),
        name: name.to_string(),
        input: Map::new(),
        raw: Some(raw.to_string()),
    }
}

fn builder_with(adapter: MockAdapter) -> ReActAgentBuilder {
    ReActAgent::builder(Arc::new(adapter))
}

/// S1 - One-shot text. Model emits one chunk of plain text; no tool call.
#[tokio::test]
async fn s1_one_shot_text() {
    let adapter = MockAdapter::with_script(vec![vec![text_chunk("Hi!")]]);
    let agent = builder_with(adapter).build();

    let reply = agent.reply(vec![Msg::user("user", "Hello")]).await.unwrap();

    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.content.as_text(), "Hi!");

    let memory = agent.memory().messages().await;
    assert_eq!(memory.len(), 2);
    assert_eq!(memory[0].content.as_text(), "Hello");
    assert_eq!(memory[1].content.as_text(), "Hi!");
}

/// S2 - Single tool call reassembled from two fragments, then a final answer.
#[tokio::test]
async fn s2_single_tool_call_across_fragments() {
    let adapter = MockAdapter::with_script(vec![
        vec![ChatResponse {
            id: "r1".to_string(),
            content: vec![
                tool_use_fragment("call_1", "get_time", "{\"zone\":"),
                tool_use_fragment("", FRAGMENT_PLACEHOLDER, "\"UTC\"}"),
            ],
            usage: None,
        }],
        vec![text_chunk("It is 12:00:00 UTC.")],
    ]);
    let agent = builder_with(adapter).build();
    agent.register_tool(Arc::new(GetTime));

    let reply = agent
        .reply(vec![Msg::user("user", "What time is it?")])
        .await
        .unwrap();

    assert_eq!(reply.content.as_text(), "It is 12:00:00 UTC.");

    let memory = agent.memory().messages().await;
    assert_eq!(memory.len(), 4);
    match &memory[1].content {
        ContentBlock::ToolUse { id, name, input, .. } => {
            assert_eq!(id, "call_1");
            assert_eq!(name, "get_time");
            assert_eq!(input.get("zone").and_then(Value::as_str), Some("UTC"));
        }
        other => panic!("expected ToolUse, got {other:?}"),
    }
    match &memory[2].content {
        ContentBlock::ToolResult { id, output, .. } => {
            assert_eq!(id, "call_1");
            assert_eq!(output.as_text(), "12:00:00");
        }
        other => panic!("expected ToolResult, got {other:?}"),
    }
    assert_eq!(memory[3].content.as_text(), "It is 12:00:00 UTC.");
}

/// S3 - Parallel tool batch. Two complete ToolUses in one turn; response order
/// in memory follows input order regardless of completion order.
#[tokio::test]
async fn s3_parallel_tool_batch_preserves_input_order() {
    let adapter = MockAdapter::with_script(vec![
        vec![ChatResponse {
            id: "r1".to_string(),
            content: vec![
                ContentBlock::ToolUse {
                    id: "a".to_string(),
                    name: "echo".to_string(),
                    input: {
                        let mut m = Map::new();
                        m.insert("text".to_string(), Value::String("A".to_string()));
                        m
                    },
                    raw: None,
                },
                ContentBlock::ToolUse {
                    id: "b".to_string(),
                    name: "echo".to_string(),
                    input: {
                        let mut m = Map::new();
                        m.insert("text".to_string(), Value::String("B".to_string()));
                        m
                    },
                    raw: None,
                },
            ],
            usage: None,
        }],
        vec![text_chunk("done")],
    ]);
    let agent = builder_with(adapter).parallel_tools(true).build();
    agent.register_tool(Arc::new(Echo));

    agent
        .reply(vec![Msg::user("user", "echo A and B")])
        .await
        .unwrap();

    let memory = agent.memory().messages().await;
    let result_order: Vec<String> = memory
        .iter()
        .filter_map(|m| match &m.content {
            ContentBlock::ToolResult { id, output, .. } => Some(format!("{id}:{}", output.as_text())),
            _ => None,
        })
        .collect();
    assert_eq!(result_order, vec!["a:A".to_string(), "b:B".to_string()]);
}

/// S4 - Unregistered tool is the ReAct "finish function": the loop terminates
/// after the reasoning phase without acting, and the final reply is empty.
#[tokio::test]
async fn s4_unregistered_tool_terminates_without_acting() {
    let adapter = MockAdapter::with_script(vec![vec![ChatResponse {
        id: "r1".to_string(),
        content: vec![ContentBlock::ToolUse {
            id: "call_1".to_string(),
            name: "generate_response".to_string(),
            input: Map::new(),
            raw: None,
        }],
        usage: None,
    }]]);
    let agent = builder_with(adapter).build();

    let reply = agent.reply(vec![Msg::user("user", "go")]).await.unwrap();
    assert_eq!(reply.content.as_text(), "");

    let memory = agent.memory().messages().await;
    // user + the unregistered tool-use message; no tool-result follows.
    assert_eq!(memory.len(), 2);
    assert!(!memory.iter().any(|m| matches!(m.content, ContentBlock::ToolResult { .. })));
}

/// S5 - Iteration cap: a tool that always succeeds still stops the loop at
/// max_iters, and reply resolves instead of running forever.
#[tokio::test]
async fn s5_iteration_cap_bounds_the_loop() {
    let adapter = MockAdapter::repeating(vec![ChatResponse {
        id: "r".to_string(),
        content: vec![ContentBlock::ToolUse {
            id: "call_1".to_string(),
            name: "loop".to_string(),
            input: Map::new(),
            raw: None,
        }],
        usage: None,
    }]);
    let agent = builder_with(adapter).max_iters(3).build();
    agent.register_tool(Arc::new(LoopTool));

    let reply = tokio::time::timeout(
        Duration::from_secs(5),
        agent.reply(vec![Msg::user("user", "loop forever")]),
    )
    .await
    .expect("reply must resolve within the iteration cap")
    .unwrap();
    assert_eq!(reply.content.as_text(), "");

    let memory = agent.memory().messages().await;
    let tool_result_count = memory
        .iter()
        .filter(|m| matches!(m.content, ContentBlock::ToolResult { .. }))
        .count();
    assert_eq!(tool_result_count, 3);
}

/// S6 - Multi-agent collapse: plain conversational turns fold into one
/// `<history>`-wrapped wire message.
#[test]
fn s6_multi_agent_formatter_collapses_plain_history() {
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
        skein::formatter::WireContent::Blocks(blocks) => blocks[0].text.clone().unwrap(),
        skein::formatter::WireContent::Text(t) => t.clone(),
    };
    assert!(text.starts_with("<history>\n"));
    assert!(text.ends_with("</history>"));
    assert_eq!(
        text,
        "<history>\nUser Alice: Hi\nAssistant Bot: Hello\nUser Alice: Bye\n</history>"
    );
}
