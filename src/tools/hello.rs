use crate::core::tool::{ToolArgs, ToolResult};
use crate::tools::registry::ToolDefinition;

pub const NAME: &str = "hello_world";

pub fn hello_world(_args: &ToolArgs<'_>) -> ToolResult {
    tracing::info!(tool = NAME, "hello world tool called");
    ToolResult::success("Hello from ESP32 MCP Server!")
}

pub fn definition() -> ToolDefinition {
    ToolDefinition::new(NAME, hello_world).describe("Returns a friendly greeting from the ESP32")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_greets_without_arguments() {
        let out = hello_world(&ToolArgs::new(None));
        assert!(out.is_success());
        assert_eq!(out.content(), Some("Hello from ESP32 MCP Server!"));
    }

    #[test]
    fn definition_has_no_parameters() {
        let def = definition();
        assert_eq!(def.name, "hello_world");
        assert!(def.parameters.is_empty());
    }
}
