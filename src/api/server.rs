//! Server lifecycle: tool setup, then start/stop of one transport.
//!
//! Tools may only be registered while the server is stopped; the registry is
//! read-only while a transport is feeding requests into the dispatcher.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::api::dispatch::{Dispatcher, Session};
use crate::core::error::ServerError;
use crate::core::mcp::ServerInfo;
use crate::core::tool::ToolHandler;
use crate::infra::config::Config;
use crate::infra::http_app::HttpTransport;
use crate::infra::stdio::StdioTransport;
use crate::infra::transport::{ResponseSink, Transport};
use crate::tools::registry::{ToolDefinition, ToolRegistry};

pub struct McpServer {
    transport: Box<dyn Transport>,
    dispatcher: Arc<Mutex<Dispatcher>>,
    running: bool,
    destroyed: bool,
}

impl McpServer {
    pub fn new(mut transport: Box<dyn Transport>, info: ServerInfo, capacity: usize) -> Self {
        let dispatcher = Arc::new(Mutex::new(Dispatcher::new(
            ToolRegistry::with_capacity(capacity),
            info,
        )));
        let shared = dispatcher.clone();
        transport.set_request_handler(Arc::new(move |raw: &[u8], sink: &dyn ResponseSink| {
            shared.lock().unwrap_or_else(|e| e.into_inner()).handle(raw, sink);
        }));
        tracing::info!(transport = transport.kind(), capacity, "MCP server created");
        Self {
            transport,
            dispatcher,
            running: false,
            destroyed: false,
        }
    }

    pub fn http(cfg: &Config) -> Self {
        Self::new(Box::new(HttpTransport::default()), cfg.server_info(), cfg.max_tools)
    }

    pub fn stdio(cfg: &Config) -> Self {
        Self::new(Box::new(StdioTransport::default()), cfg.server_info(), cfg.max_tools)
    }

    /// Picks the transport named by `cfg.mode`.
    pub fn from_config(cfg: &Config) -> Self {
        if cfg.is_stdio() {
            Self::stdio(cfg)
        } else {
            Self::http(cfg)
        }
    }

    fn dispatcher(&self) -> MutexGuard<'_, Dispatcher> {
        self.dispatcher.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn ensure_stopped(&self) -> Result<(), ServerError> {
        if self.running {
            tracing::error!("cannot register tools while the server is running");
            return Err(ServerError::AlreadyRunning);
        }
        Ok(())
    }

    /// Registers a tool that takes no declared parameters.
    pub fn add_tool(
        &mut self,
        name: &str,
        description: Option<&str>,
        handler: impl ToolHandler + 'static,
    ) -> Result<(), ServerError> {
        self.ensure_stopped()?;
        self.dispatcher()
            .registry_mut()
            .add(name, description.map(str::to_string), handler, Vec::new())?;
        Ok(())
    }

    pub fn register_tool(&mut self, def: ToolDefinition) -> Result<(), ServerError> {
        self.ensure_stopped()?;
        self.dispatcher().registry_mut().register(def)?;
        Ok(())
    }

    /// Registers in order and stops at the first failure; earlier tools stay registered.
    pub fn register_tools(
        &mut self,
        defs: impl IntoIterator<Item = ToolDefinition>,
    ) -> Result<(), ServerError> {
        for def in defs {
            self.register_tool(def)?;
        }
        Ok(())
    }

    pub async fn start(&mut self, port: u16) -> Result<(), ServerError> {
        if self.running {
            tracing::warn!("MCP server already running");
            return Err(ServerError::AlreadyRunning);
        }
        self.transport.init(port).await?;
        self.transport.start().await?;
        self.running = true;
        tracing::info!(
            transport = self.transport.kind(),
            port,
            tools = self.tool_count(),
            "MCP server started"
        );
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), ServerError> {
        if !self.running {
            tracing::warn!("MCP server not running");
            return Ok(());
        }
        self.transport.stop().await?;
        self.running = false;
        tracing::info!("MCP server stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn tool_count(&self) -> usize {
        self.dispatcher().registry().len()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.dispatcher().registry().contains(name)
    }

    /// Snapshot of the handshake state.
    pub fn session(&self) -> Session {
        self.dispatcher().session().clone()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.transport.local_addr()
    }

    /// Resolves when the transport's peer is gone (stdin EOF for stdio).
    pub async fn closed(&self) {
        self.transport.closed().await
    }

    /// Tears down the transport. Dropping the server does the same.
    ///
    /// A running transport is aborted, not drained; call [`McpServer::stop`]
    /// first for a graceful shutdown.
    pub fn destroy(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.destroyed {
            return;
        }
        if self.running {
            tracing::warn!("destroying a running MCP server; in-flight requests are dropped");
            self.running = false;
        }
        self.transport.destroy();
        self.destroyed = true;
        tracing::info!("MCP server destroyed");
    }
}

impl Drop for McpServer {
    fn drop(&mut self) {
        self.teardown();
    }
}
