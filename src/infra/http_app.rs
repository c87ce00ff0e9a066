//! HTTP binding of the transport contract.
//!
//! - `POST /` carries one JSON-RPC message per request, body < 4096 bytes
//! - `OPTIONS /` answers CORS preflight with 204
//!
//! Each POST is one dispatch cycle. Cycles are serialized behind a lock so the
//! single pending-response slot is never shared by two requests.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::core::error::TransportError;
use crate::infra::http::json as http_json;
use crate::infra::transport::{PendingResponse, RequestHandler, ResponseSink, Transport};

/// Request bodies must be strictly smaller than this.
pub const MAX_REQUEST_SIZE: usize = 4096;

#[derive(Default)]
struct HttpShared {
    handler: RwLock<Option<RequestHandler>>,
    pending: PendingResponse,
    cycle: Mutex<()>,
}

impl HttpShared {
    fn handler(&self) -> Option<RequestHandler> {
        self.handler.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

pub struct HttpTransport {
    shared: Arc<HttpShared>,
    bind_ip: IpAddr,
    port: Option<u16>,
    local_addr: Option<SocketAddr>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }
}

impl HttpTransport {
    pub fn new(bind_ip: IpAddr) -> Self {
        tracing::info!("HTTP transport created");
        Self {
            shared: Arc::new(HttpShared::default()),
            bind_ip,
            port: None,
            local_addr: None,
            shutdown: None,
            task: None,
        }
    }

    /// The axum app served by this transport, usable without binding a socket.
    pub fn router(&self) -> Router {
        build_router(self.shared.clone())
    }
}

fn build_router(shared: Arc<HttpShared>) -> Router {
    Router::new()
        .route("/", post(post_rpc).options(preflight))
        .with_state(shared)
}

async fn post_rpc(State(shared): State<Arc<HttpShared>>, headers: HeaderMap, body: Body) -> Response {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len >= MAX_REQUEST_SIZE) {
        tracing::warn!(content_length = ?declared, "request too large");
        return http_json::internal_error("Request too large");
    }

    let bytes = match to_bytes(body, MAX_REQUEST_SIZE - 1).await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(error = %e, "failed to receive request body");
            return http_json::internal_error("Failed to receive request body");
        }
    };
    tracing::debug!(content_length = bytes.len(), body = %String::from_utf8_lossy(&bytes), "incoming HTTP request");

    let Some(handler) = shared.handler() else {
        tracing::warn!("no request handler installed");
        return http_json::internal_error("No request handler");
    };

    let _cycle = shared.cycle.lock().await;
    shared.pending.clear();
    handler(&bytes[..], &shared.pending);

    match shared.pending.take() {
        Some(text) => {
            tracing::debug!(body = %text, "outgoing HTTP response");
            http_json::rpc_body(text)
        }
        None => {
            tracing::warn!("no response generated");
            http_json::internal_error("No response generated")
        }
    }
}

async fn preflight() -> Response {
    http_json::no_content_preflight()
}

impl ResponseSink for HttpTransport {
    fn send_response(&self, response: &str) -> Result<(), TransportError> {
        self.shared.pending.send_response(response)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn kind(&self) -> &'static str {
        "http"
    }

    fn set_request_handler(&mut self, handler: RequestHandler) {
        *self.shared.handler.write().unwrap_or_else(|e| e.into_inner()) = Some(handler);
    }

    async fn init(&mut self, port: u16) -> Result<(), TransportError> {
        if self.task.is_some() {
            return Err(TransportError::AlreadyStarted);
        }
        self.port = Some(port);
        self.shared.pending.clear();
        tracing::debug!(port, "HTTP transport initialized");
        Ok(())
    }

    async fn start(&mut self) -> Result<(), TransportError> {
        let port = self.port.ok_or(TransportError::NotInitialized)?;
        if self.task.is_some() {
            return Err(TransportError::AlreadyStarted);
        }

        let listener = tokio::net::TcpListener::bind((self.bind_ip, port))
            .await
            .map_err(|source| TransportError::Bind { port, source })?;
        let addr = listener.local_addr()?;
        let app = build_router(self.shared.clone());
        let (tx, rx) = oneshot::channel::<()>();

        self.task = Some(tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = rx.await;
                })
                .await;
            if let Err(e) = served {
                tracing::error!(error = %e, "HTTP server terminated");
            }
        }));
        self.shutdown = Some(tx);
        self.local_addr = Some(addr);
        tracing::info!(%addr, "HTTP server started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), TransportError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.await.map_err(|e| TransportError::Io(std::io::Error::other(e)))?;
            tracing::info!("HTTP server stopped");
        }
        self.local_addr = None;
        Ok(())
    }

    fn destroy(&mut self) {
        self.shutdown.take();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.local_addr = None;
        self.shared.pending.clear();
        self.shared.handler.write().unwrap_or_else(|e| e.into_inner()).take();
        tracing::info!("HTTP transport destroyed");
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}
