use serde_json::Value as J;

use crate::core::content::{CallPayload, TextContent};

/// Read-only view over the `arguments` of a `tools/call`.
///
/// Accessors fall back to the caller's default when the key is missing or has
/// the wrong type, so handlers decide what "absent" means.
#[derive(Debug, Clone, Copy)]
pub struct ToolArgs<'a> {
    json: Option<&'a J>,
}

impl<'a> ToolArgs<'a> {
    pub fn new(json: Option<&'a J>) -> Self {
        Self { json }
    }

    pub fn raw(&self) -> Option<&'a J> {
        self.json
    }

    fn get(&self, key: &str) -> Option<&'a J> {
        self.json?.get(key)
    }

    pub fn get_string(&self, key: &str, default: &'a str) -> &'a str {
        self.get(key).and_then(J::as_str).unwrap_or(default)
    }

    /// Integers are truncated from whatever number was sent.
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        self.get(key)
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
            .unwrap_or(default)
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(J::as_bool).unwrap_or(default)
    }

    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.get(key).and_then(J::as_f64).unwrap_or(default)
    }
}

/// Outcome of a tool invocation. Exactly one of content / error message is
/// meaningful, selected by `success`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    success: bool,
    content: Option<String>,
    error_message: Option<String>,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        Self { success: true, content: Some(content.into()), error_message: None }
    }

    /// Success with nothing to say; rendered as empty text.
    pub fn empty() -> Self {
        Self { success: true, content: None, error_message: None }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { success: false, content: None, error_message: Some(message.into()) }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn into_payload(self) -> CallPayload {
        if self.success {
            CallPayload::Content {
                content: vec![TextContent::new(self.content.unwrap_or_default())],
            }
        } else {
            CallPayload::Failure {
                error: self.error_message.unwrap_or_else(|| "Unknown error".into()),
            }
        }
    }
}

/// The extension point: a synchronous action invoked by `tools/call`.
pub trait ToolHandler: Send + Sync {
    fn call(&self, args: &ToolArgs<'_>) -> ToolResult;
}

impl<F> ToolHandler for F
where
    F: Fn(&ToolArgs<'_>) -> ToolResult + Send + Sync,
{
    fn call(&self, args: &ToolArgs<'_>) -> ToolResult {
        self(args)
    }
}
