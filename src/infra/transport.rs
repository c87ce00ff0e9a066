//! Transport contract between a byte channel and the dispatcher.
//!
//! A transport hands every inbound message to its [`RequestHandler`] together
//! with a [`ResponseSink`]; the handler answers through the sink exactly once.
//! The sink is a single pending-response slot, not a queue: each cycle clears
//! it first and the last `send_response` wins. Transports that accept
//! concurrent peers must serialize whole cycles around that slot.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::core::error::TransportError;

pub trait ResponseSink: Send + Sync {
    fn send_response(&self, response: &str) -> Result<(), TransportError>;
}

/// Invoked once per inbound message with the raw bytes.
pub type RequestHandler = Arc<dyn Fn(&[u8], &dyn ResponseSink) + Send + Sync>;

#[async_trait]
pub trait Transport: ResponseSink {
    fn kind(&self) -> &'static str;

    fn set_request_handler(&mut self, handler: RequestHandler);

    async fn init(&mut self, port: u16) -> Result<(), TransportError>;

    async fn start(&mut self) -> Result<(), TransportError>;

    async fn stop(&mut self) -> Result<(), TransportError>;

    /// Releases everything; the transport is unusable afterwards.
    fn destroy(&mut self);

    /// Bound address, for transports that listen on a socket.
    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }

    /// Resolves when the peer side has gone away for good.
    async fn closed(&self) {
        std::future::pending::<()>().await
    }
}

/// One-message response slot shared by a transport and its handler.
#[derive(Debug, Default)]
pub struct PendingResponse(Mutex<Option<String>>);

impl PendingResponse {
    pub fn clear(&self) {
        self.slot().take();
    }

    pub fn take(&self) -> Option<String> {
        self.slot().take()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ResponseSink for PendingResponse {
    fn send_response(&self, response: &str) -> Result<(), TransportError> {
        *self.slot() = Some(response.to_owned());
        Ok(())
    }
}
