//! Payload shapes carried in a `tools/call` result.

use serde::Serialize;

/// A single `{ "type": "text", "text": ... }` content item.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

impl TextContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self { kind: "text", text: text.into() }
    }
}

/// What a tool call yields on the wire. A tool failure is still a normal
/// JSON-RPC result; only the payload differs.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum CallPayload {
    Content { content: Vec<TextContent> },
    Failure { error: String },
}
