//! Provider wire-message shapes (spec.md §6, OpenAI chat-completions convention).

use serde::Serialize;
use serde_json::{Map, Value};

/// One entry of a wire message's content list (spec.md §4.1).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WireContentBlock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
}

impl WireContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image: None,
            audio: None,
            video: None,
        }
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self {
            text: None,
            image: Some(url.into()),
            audio: None,
            video: None,
        }
    }

    pub fn audio(url: impl Into<String>) -> Self {
        Self {
            text: None,
            image: None,
            audio: Some(url.into()),
            video: None,
        }
    }

    pub fn video(url: impl Into<String>) -> Self {
        Self {
            text: None,
            image: None,
            audio: None,
            video: Some(url.into()),
        }
    }

    /// `true` when this entry carries only a text field (spec.md §4.1, post-pass).
    pub fn is_text_only(&self) -> bool {
        self.text.is_some() && self.image.is_none() && self.audio.is_none() && self.video.is_none()
    }
}

/// A message's content, either a plain string or a list of content blocks
/// (spec.md §4.1).
#[derive(Clone, Debug, PartialEq)]
pub enum WireContent {
    Text(String),
    Blocks(Vec<WireContentBlock>),
}

impl Serialize for WireContent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            WireContent::Text(s) => serializer.serialize_str(s),
            WireContent::Blocks(blocks) => blocks.serialize(serializer),
        }
    }
}

/// `{id, type:"function", function:{name, arguments}}` (spec.md §4.1).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WireToolCall {
    pub id: String,
    pub r#type: &'static str,
    pub function: WireFunction,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WireFunction {
    pub name: String,
    pub arguments: String,
}

/// One message in the list sent to the model (spec.md §6).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WireMessage {
    pub role: String,
    pub content: WireContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl WireMessage {
    pub fn text(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: WireContent::Text(text.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Plain-text content wrapped in a one-entry list, per spec.md §4.1's
    /// `{role, content:[{text:…}]}` shape for user/assistant text.
    pub fn text_block(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: WireContent::Blocks(vec![WireContentBlock::text(text)]),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

/// JSON-serializes a tool call's `input` in iteration order, per spec.md §4.1's
/// "Tool argument serialization": keys in insertion order, proper JSON escaping,
/// numbers/booleans unquoted, `null` as `null`, nested objects recursively, and
/// an empty/missing map serializing to `"{}"`.
pub fn serialize_tool_arguments(input: &Map<String, Value>) -> String {
    if input.is_empty() {
        return "{}".to_string();
    }
    serde_json::to_string(&Value::Object(input.clone())).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_serializes_to_empty_object() {
        assert_eq!(serialize_tool_arguments(&Map::new()), "{}");
    }

    #[test]
    fn keys_serialize_in_insertion_order() {
        let mut map = Map::new();
        map.insert("zone".to_string(), Value::String("UTC".to_string()));
        map.insert("format".to_string(), Value::String("24h".to_string()));
        assert_eq!(
            serialize_tool_arguments(&map),
            "{\"zone\":\"UTC\",\"format\":\"24h\"}"
        );
    }

    #[test]
    fn nested_objects_and_mixed_types_serialize_correctly() {
        let mut inner = Map::new();
        inner.insert("enabled".to_string(), Value::Bool(true));
        inner.insert("count".to_string(), Value::from(3));
        inner.insert("label".to_string(), Value::Null);
        let mut outer = Map::new();
        outer.insert("opts".to_string(), Value::Object(inner));
        outer.insert("note".to_string(), Value::String("say \"hi\"".to_string()));
        assert_eq!(
            serialize_tool_arguments(&outer),
            "{\"opts\":{\"enabled\":true,\"count\":3,\"label\":null},\"note\":\"say \\\"hi\\\"\"}"
        );
    }
}
