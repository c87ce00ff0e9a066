//! JSON-RPC 2.0 envelope codec (lightweight, no framework coupling).
//!
//! Parsing is tolerant in the same places the wire is: `id` is optional and
//! only honoured when numeric, `params` may be any JSON value. Everything
//! produced here is compact JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value as J;

use crate::core::error::ProtocolError;

pub const JSONRPC_VERSION: &str = "2.0";
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i32 = -32700;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

// --- Inbound ---

/// A parsed JSON-RPC message. `params` is owned, so it outlives the raw buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// The `jsonrpc` member as sent by the peer, if it was a string.
    pub protocol_version: Option<String>,
    pub id: Option<i64>,
    pub method: String,
    pub params: Option<J>,
    pub is_notification: bool,
}

impl Request {
    /// Looks up a member of `params` when it is an object.
    pub fn param(&self, key: &str) -> Option<&J> {
        self.params.as_ref()?.get(key)
    }

    /// Id to echo in the reply. Notifications have none, so they reply as `0`.
    pub fn reply_id(&self) -> i64 {
        self.id.unwrap_or(0)
    }
}

pub fn parse(raw: &[u8]) -> Result<Request, ProtocolError> {
    let root: J = serde_json::from_slice(raw).map_err(ProtocolError::InvalidJson)?;
    let J::Object(mut obj) = root else {
        return Err(ProtocolError::MissingMethod);
    };

    let method = match obj.remove("method") {
        Some(J::String(m)) => m,
        _ => return Err(ProtocolError::MissingMethod),
    };
    let protocol_version = match obj.remove("jsonrpc") {
        Some(J::String(v)) => Some(v),
        _ => None,
    };
    let id = obj.get("id").and_then(numeric_id);
    let params = obj.remove("params");

    Ok(Request {
        protocol_version,
        is_notification: id.is_none(),
        id,
        method,
        params,
    })
}

fn numeric_id(v: &J) -> Option<i64> {
    // Fractional ids are truncated, matching how integer ids are read elsewhere.
    v.as_i64().or_else(|| v.as_f64().map(|f| f as i64))
}

// --- Outbound ---

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RpcResp {
    pub jsonrpc: &'static str,
    pub id: i64,
    #[serde(flatten)]
    pub body: RpcBody,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RpcBody {
    Result(J),
    Error(RpcErr),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcErr {
    pub code: i32,
    pub message: String,
}

impl RpcResp {
    pub fn is_error(&self) -> bool {
        matches!(self.body, RpcBody::Error(_))
    }

    pub fn to_wire(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Serialize)
    }
}

pub fn ok(id: i64, result: J) -> RpcResp {
    RpcResp { jsonrpc: JSONRPC_VERSION, id, body: RpcBody::Result(result) }
}

pub fn err(id: i64, code: i32, msg: impl Into<String>) -> RpcResp {
    RpcResp {
        jsonrpc: JSONRPC_VERSION,
        id,
        body: RpcBody::Error(RpcErr { code, message: msg.into() }),
    }
}

/// `{"jsonrpc":"2.0","id":..,"result":..}`; a missing result is sent as `null`.
pub fn build_response(id: i64, result: Option<J>) -> Result<String, ProtocolError> {
    ok(id, result.unwrap_or(J::Null)).to_wire()
}

/// `{"jsonrpc":"2.0","id":..,"error":{"code":..,"message":..}}`.
pub fn build_error(id: i64, code: i32, message: &str) -> Result<String, ProtocolError> {
    err(id, code, message).to_wire()
}

// --- initialize ---

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub capabilities: J,
    pub server_info: ServerInfo,
    pub protocol_version: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self { name: "ESP32 MCP Server".into(), version: "1.0.0".into() }
    }
}
