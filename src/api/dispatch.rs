use std::time::Instant;

use serde_json::{json, Value as J};

use crate::core::error::ProtocolError;
use crate::core::mcp::{
    self, InitializeResult, Request, ServerInfo, DEFAULT_PROTOCOL_VERSION, INTERNAL_ERROR,
    INVALID_PARAMS, METHOD_NOT_FOUND, PARSE_ERROR,
};
use crate::core::schema::describe_parameters;
use crate::infra::logging::log_metric;
use crate::infra::transport::ResponseSink;
use crate::tools::registry::ToolRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
}

/// Handshake results of the current peer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub state: SessionState,
    pub protocol_version: Option<String>,
    pub client_name: Option<String>,
}

/// Routes parsed requests to the registry and owns the session state.
pub struct Dispatcher {
    registry: ToolRegistry,
    session: Session,
    server_info: ServerInfo,
}

impl Dispatcher {
    pub fn new(registry: ToolRegistry, server_info: ServerInfo) -> Self {
        Self {
            registry,
            session: Session::default(),
            server_info,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ToolRegistry {
        &mut self.registry
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// One dispatch cycle: parse `raw`, act on it and answer through `sink`
    /// exactly once.
    pub fn handle(&mut self, raw: &[u8], sink: &dyn ResponseSink) {
        let text = match self.reply_to(raw) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode response");
                match mcp::build_error(0, INTERNAL_ERROR, "Internal error") {
                    Ok(text) => text,
                    Err(_) => return,
                }
            }
        };
        if let Err(e) = sink.send_response(&text) {
            tracing::error!(error = %e, "failed to send response");
        }
    }

    /// Produces the wire text for one inbound message.
    pub fn reply_to(&mut self, raw: &[u8]) -> Result<String, ProtocolError> {
        let req = match mcp::parse(raw) {
            Ok(req) => req,
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse request");
                return mcp::build_error(0, PARSE_ERROR, "Parse error");
            }
        };
        tracing::debug!(method = %req.method, id = ?req.id, "handling request");

        let id = req.reply_id();
        match req.method.as_str() {
            "initialize" => self.initialize(&req),
            "notifications/initialized" => {
                self.session.state = SessionState::Ready;
                tracing::info!("client initialized");
                Ok("{}".to_string())
            }
            "tools/list" => mcp::build_response(id, Some(self.tools_list())),
            "tools/call" => self.tools_call(&req),
            other => {
                tracing::warn!(method = %other, "unknown method");
                mcp::build_error(id, METHOD_NOT_FOUND, "Method not found")
            }
        }
    }

    fn initialize(&mut self, req: &Request) -> Result<String, ProtocolError> {
        let version = req
            .param("protocolVersion")
            .and_then(J::as_str)
            .unwrap_or(DEFAULT_PROTOCOL_VERSION)
            .to_string();
        let client = req
            .param("clientInfo")
            .and_then(|c| c.get("name"))
            .and_then(J::as_str)
            .map(str::to_string);
        tracing::info!(protocol_version = %version, client = ?client, "initialize");

        self.session.protocol_version = Some(version.clone());
        if client.is_some() {
            self.session.client_name = client;
        }
        self.session.state = SessionState::Initializing;

        let result = InitializeResult {
            capabilities: json!({ "tools": {} }),
            server_info: self.server_info.clone(),
            protocol_version: version,
        };
        let value = serde_json::to_value(result).map_err(ProtocolError::Serialize)?;
        mcp::build_response(req.reply_id(), Some(value))
    }

    fn tools_list(&self) -> J {
        let tools: Vec<J> = self
            .registry
            .list()
            .iter()
            .map(|t| {
                let mut entry = serde_json::Map::new();
                entry.insert("name".into(), J::from(t.name()));
                if let Some(d) = t.description() {
                    entry.insert("description".into(), J::from(d));
                }
                entry.insert("inputSchema".into(), describe_parameters(t.parameters()));
                J::Object(entry)
            })
            .collect();
        json!({ "tools": tools })
    }

    fn tools_call(&self, req: &Request) -> Result<String, ProtocolError> {
        let id = req.reply_id();
        let Some(name) = req.param("name").and_then(J::as_str) else {
            return mcp::build_error(id, INVALID_PARAMS, "Missing 'name' parameter");
        };
        let Some(tool) = self.registry.find(name) else {
            tracing::warn!(tool = %name, "tool not found");
            return mcp::build_error(id, INVALID_PARAMS, "Tool not found");
        };
        if self.session.state != SessionState::Ready {
            tracing::debug!(tool = %name, state = ?self.session.state, "tools/call before handshake completed");
        }

        let start = Instant::now();
        let result = tool.invoke(req.param("arguments"));
        log_metric(name, "call_latency_ms", start.elapsed().as_secs_f64() * 1000.0);
        if !result.is_success() {
            log_metric(name, "call_error_total", 1.0);
            tracing::info!(tool = %name, error = ?result.error_message(), "tool reported failure");
        }
        let payload = serde_json::to_value(result.into_payload()).map_err(ProtocolError::Serialize)?;
        mcp::build_response(id, Some(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::ParamSchema;
    use crate::core::tool::{ToolArgs, ToolResult};
    use crate::infra::transport::PendingResponse;
    use crate::tools::registry::ToolDefinition;
    use crate::tools::thermostat::{self, Thermostat};

    fn ping(_: &ToolArgs<'_>) -> ToolResult {
        ToolResult::success("pong")
    }

    fn dispatcher_with(defs: Vec<ToolDefinition>) -> Dispatcher {
        let mut reg = ToolRegistry::new();
        for d in defs {
            reg.register(d).unwrap();
        }
        Dispatcher::new(reg, ServerInfo::default())
    }

    fn reply(d: &mut Dispatcher, body: &str) -> J {
        let text = d.reply_to(body.as_bytes()).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn unknown_tool_echoes_id_with_invalid_params() {
        let mut d = dispatcher_with(vec![]);
        let v = reply(
            &mut d,
            r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"missing_tool","arguments":{}}}"#,
        );
        assert_eq!(v["id"], 7);
        assert_eq!(v["error"]["code"], -32602);
        assert_eq!(v["error"]["message"], "Tool not found");
    }

    #[test]
    fn missing_tool_name_is_invalid_params() {
        let mut d = dispatcher_with(vec![]);
        let v = reply(&mut d, r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{}}"#);
        assert_eq!(v["id"], 3);
        assert_eq!(v["error"]["code"], -32602);
        assert_eq!(v["error"]["message"], "Missing 'name' parameter");
    }

    #[test]
    fn initialized_notification_sends_empty_object() {
        let mut d = dispatcher_with(vec![]);
        let sink = PendingResponse::default();
        d.handle(br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#, &sink);
        assert_eq!(sink.take().as_deref(), Some("{}"));
        assert_eq!(d.session().state, SessionState::Ready);
    }

    #[test]
    fn initialize_records_session_and_advertises_tools() {
        let mut d = dispatcher_with(vec![]);
        let v = reply(
            &mut d,
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26","clientInfo":{"name":"probe"}}}"#,
        );
        assert_eq!(v["result"]["protocolVersion"], "2025-03-26");
        assert_eq!(v["result"]["capabilities"], json!({"tools":{}}));
        assert_eq!(v["result"]["serverInfo"]["name"], "ESP32 MCP Server");
        assert_eq!(d.session().state, SessionState::Initializing);
        assert_eq!(d.session().client_name.as_deref(), Some("probe"));
    }

    #[test]
    fn reinitialize_without_client_info_keeps_the_name() {
        let mut d = dispatcher_with(vec![]);
        reply(
            &mut d,
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"clientInfo":{"name":"first"}}}"#,
        );
        reply(&mut d, r#"{"jsonrpc":"2.0","id":2,"method":"initialize","params":{"protocolVersion":"2025-03-26"}}"#);
        assert_eq!(d.session().client_name.as_deref(), Some("first"));
        assert_eq!(d.session().protocol_version.as_deref(), Some("2025-03-26"));
    }

    #[test]
    fn initialize_defaults_protocol_version() {
        let mut d = dispatcher_with(vec![]);
        let v = reply(&mut d, r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#);
        assert_eq!(v["result"]["protocolVersion"], DEFAULT_PROTOCOL_VERSION);
        assert_eq!(d.session().protocol_version.as_deref(), Some(DEFAULT_PROTOCOL_VERSION));
        assert!(d.session().client_name.is_none());
    }

    #[test]
    fn empty_registry_lists_no_tools() {
        let mut d = dispatcher_with(vec![]);
        let v = reply(&mut d, r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#);
        assert_eq!(v["result"], json!({"tools": []}));
    }

    #[test]
    fn tools_are_listed_in_registration_order() {
        let mut d = dispatcher_with(vec![
            ToolDefinition::new("b_tool", ping).describe("second letter"),
            ToolDefinition::new("a_tool", ping)
                .param(ParamSchema::integer("n", "count", 1, 5).required()),
        ]);
        let v = reply(&mut d, r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#);
        let tools = v["result"]["tools"].as_array().unwrap();
        assert_eq!(tools[0]["name"], "b_tool");
        assert_eq!(tools[0]["description"], "second letter");
        assert_eq!(
            tools[0]["inputSchema"],
            json!({"type":"object","properties":{},"required":[]})
        );
        assert_eq!(tools[1]["name"], "a_tool");
        assert!(tools[1].get("description").is_none());
        assert_eq!(tools[1]["inputSchema"]["properties"]["n"]["maximum"], 5);
        assert_eq!(tools[1]["inputSchema"]["required"], json!(["n"]));
    }

    #[test]
    fn tool_failure_is_a_successful_response() {
        let mut d = dispatcher_with(thermostat::definitions(&Thermostat::default()));
        let v = reply(
            &mut d,
            r#"{"jsonrpc":"2.0","id":9,"method":"tools/call","params":{"name":"set_thermostat","arguments":{"temperature":35}}}"#,
        );
        assert!(v.get("error").is_none());
        assert_eq!(
            v["result"]["error"],
            "Invalid temperature value (must be between 40 and 90 degrees)"
        );

        let v = reply(
            &mut d,
            r#"{"jsonrpc":"2.0","id":10,"method":"tools/call","params":{"name":"set_thermostat","arguments":{"temperature":72}}}"#,
        );
        assert_eq!(v["id"], 10);
        assert_eq!(v["result"]["content"][0]["type"], "text");
        let text: J = serde_json::from_str(v["result"]["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(text["status"], "success");
    }

    #[test]
    fn tools_call_is_accepted_before_handshake() {
        let mut d = dispatcher_with(vec![ToolDefinition::new("ping", ping)]);
        let v = reply(&mut d, r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"ping"}}"#);
        assert_eq!(v["result"]["content"][0]["text"], "pong");
        assert_eq!(d.session().state, SessionState::Uninitialized);
    }

    #[test]
    fn unknown_method_is_method_not_found() {
        let mut d = dispatcher_with(vec![]);
        let v = reply(&mut d, r#"{"jsonrpc":"2.0","id":5,"method":"resources/list"}"#);
        assert_eq!(v["id"], 5);
        assert_eq!(v["error"]["code"], -32601);
        assert_eq!(v["error"]["message"], "Method not found");
    }

    #[test]
    fn malformed_json_is_parse_error_with_id_zero() {
        let mut d = dispatcher_with(vec![]);
        let sink = PendingResponse::default();
        d.handle(b"{not json", &sink);
        assert_eq!(
            sink.take().as_deref(),
            Some(r#"{"jsonrpc":"2.0","id":0,"error":{"code":-32700,"message":"Parse error"}}"#)
        );
    }
}
