use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

use reqwest::Client;
use serde_json::{json, Value as J};
use thiserror::Error;

use crate::core::mcp::{RpcErr, DEFAULT_PROTOCOL_VERSION};
use crate::infra::http::headers::{add_standard_headers, generate_request_id};
use crate::infra::logging::log_metric;
use crate::infra::runtime::limits::{make_http_client, retry_async, RetryPolicy};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream status {0}")]
    Status(reqwest::StatusCode),
    #[error("rpc error {}: {}", .0.code, .0.message)]
    Rpc(RpcErr),
    #[error("malformed reply: {0}")]
    Malformed(String),
}

/// Minimal JSON-RPC caller for a running gateway's `POST /` endpoint.
#[derive(Debug)]
pub struct RpcClient {
    url: String,
    http: Client,
    retry: RetryPolicy,
    next_id: AtomicI64,
}

impl RpcClient {
    pub fn new(url: impl Into<String>) -> Result<Self, ClientError> {
        Ok(Self {
            url: url.into(),
            http: make_http_client()?,
            retry: RetryPolicy::default(),
            next_id: AtomicI64::new(1),
        })
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retry = RetryPolicy::with_retries(retries);
        self
    }

    /// Sends one request and returns its `result` member.
    pub async fn request(&self, method: &str, params: Option<J>) -> Result<J, ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut body = json!({ "jsonrpc": "2.0", "id": id, "method": method });
        if let Some(p) = params {
            body["params"] = p;
        }
        let reply = self.post(&body, self.retry_for(method)).await?;
        match (reply.get("error"), reply.get("result")) {
            (Some(e), _) => {
                let e: RpcErr = serde_json::from_value(e.clone())
                    .map_err(|e| ClientError::Malformed(e.to_string()))?;
                Err(ClientError::Rpc(e))
            }
            (None, Some(r)) => Ok(r.clone()),
            (None, None) => Err(ClientError::Malformed("neither result nor error".into())),
        }
    }

    /// Sends a notification; the gateway answers with `{}`.
    pub async fn notify(&self, method: &str) -> Result<(), ClientError> {
        self.post(&json!({ "jsonrpc": "2.0", "method": method }), RetryPolicy::with_retries(0))
            .await?;
        Ok(())
    }

    pub async fn initialize(&self, client_name: &str) -> Result<J, ClientError> {
        let result = self
            .request(
                "initialize",
                Some(json!({
                    "protocolVersion": DEFAULT_PROTOCOL_VERSION,
                    "clientInfo": { "name": client_name },
                })),
            )
            .await?;
        self.notify("notifications/initialized").await?;
        Ok(result)
    }

    pub async fn list_tools(&self) -> Result<Vec<J>, ClientError> {
        let result = self.request("tools/list", None).await?;
        match result.get("tools") {
            Some(J::Array(tools)) => Ok(tools.clone()),
            _ => Err(ClientError::Malformed("tools/list without a tools array".into())),
        }
    }

    /// Returns the `tools/call` payload: `{content:[..]}` or `{error:..}`.
    pub async fn call_tool(&self, name: &str, arguments: J) -> Result<J, ClientError> {
        self.request("tools/call", Some(json!({ "name": name, "arguments": arguments })))
            .await
    }

    /// Tool calls may change device state and the server has no timeout, so a
    /// 5xx or a client timeout does not mean the tool did not run.
    fn retry_for(&self, method: &str) -> RetryPolicy {
        match method {
            "tools/call" => RetryPolicy::with_retries(0),
            _ => self.retry,
        }
    }

    async fn post(&self, body: &J, retry: RetryPolicy) -> Result<J, ClientError> {
        let start = Instant::now();
        let req_id = generate_request_id();
        let method = body.get("method").and_then(J::as_str).unwrap_or("?").to_string();
        tracing::debug!(url = %self.url, method = %method, "rpc request");

        let res: Result<J, ClientError> = retry_async(retry, |_| {
            let (builder, _rid) = add_standard_headers(self.http.post(&self.url), Some(req_id.clone()));
            async move {
                let resp = builder.json(body).send().await?;
                if !resp.status().is_success() {
                    return Err(ClientError::Status(resp.status()));
                }
                Ok(resp.json::<J>().await?)
            }
        })
        .await;

        if res.is_err() {
            log_metric(&method, "client_error_total", 1.0);
        }
        log_metric(&method, "client_latency_ms", start.elapsed().as_millis() as f64);
        res
    }
}
