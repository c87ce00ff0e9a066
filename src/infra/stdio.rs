//! Newline-delimited JSON-RPC over a byte stream (stdin/stdout by default).
//!
//! One line in, one line out. Blank lines are skipped. Logging must go to
//! stderr while this transport owns stdout.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::core::error::TransportError;
use crate::infra::transport::{PendingResponse, RequestHandler, ResponseSink, Transport};

type Reader = Box<dyn AsyncBufRead + Unpin + Send>;
type Writer = Box<dyn AsyncWrite + Unpin + Send>;

pub struct StdioTransport {
    io: Mutex<Option<(Reader, Writer)>>,
    handler: Option<RequestHandler>,
    pending: Arc<PendingResponse>,
    initialized: bool,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    closed: watch::Receiver<bool>,
    closed_tx: Arc<watch::Sender<bool>>,
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::with_io(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl StdioTransport {
    pub fn with_io(
        reader: impl AsyncBufRead + Unpin + Send + 'static,
        writer: impl AsyncWrite + Unpin + Send + 'static,
    ) -> Self {
        let (closed_tx, closed) = watch::channel(false);
        Self {
            io: Mutex::new(Some((Box::new(reader), Box::new(writer)))),
            handler: None,
            pending: Arc::new(PendingResponse::default()),
            initialized: false,
            shutdown: None,
            task: None,
            closed,
            closed_tx: Arc::new(closed_tx),
        }
    }
}

async fn serve_lines(
    mut reader: Reader,
    mut writer: Writer,
    handler: RequestHandler,
    pending: Arc<PendingResponse>,
    mut shutdown: oneshot::Receiver<()>,
) -> std::io::Result<()> {
    let mut line = String::new();
    loop {
        line.clear();
        let read = tokio::select! {
            _ = &mut shutdown => return Ok(()),
            read = reader.read_line(&mut line) => read?,
        };
        if read == 0 {
            tracing::info!("stdin closed");
            return Ok(());
        }
        let message = line.trim_end_matches(['\r', '\n']);
        if message.trim().is_empty() {
            continue;
        }

        pending.clear();
        handler(message.as_bytes(), pending.as_ref());
        match pending.take() {
            Some(text) => {
                writer.write_all(text.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            None => tracing::warn!("no response generated"),
        }
    }
}

impl ResponseSink for StdioTransport {
    fn send_response(&self, response: &str) -> Result<(), TransportError> {
        self.pending.send_response(response)
    }
}

#[async_trait]
impl Transport for StdioTransport {
    fn kind(&self) -> &'static str {
        "stdio"
    }

    fn set_request_handler(&mut self, handler: RequestHandler) {
        self.handler = Some(handler);
    }

    async fn init(&mut self, port: u16) -> Result<(), TransportError> {
        tracing::debug!(port, "stdio transport ignores the port");
        self.initialized = true;
        self.pending.clear();
        Ok(())
    }

    async fn start(&mut self) -> Result<(), TransportError> {
        if !self.initialized {
            return Err(TransportError::NotInitialized);
        }
        if self.task.is_some() {
            return Err(TransportError::AlreadyStarted);
        }
        let handler = self.handler.clone().ok_or(TransportError::NoHandler)?;
        // The stream can only be consumed once.
        let (reader, writer) = self
            .io
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .ok_or(TransportError::AlreadyStarted)?;
        let (tx, rx) = oneshot::channel();
        let pending = self.pending.clone();
        let closed_tx = self.closed_tx.clone();

        self.task = Some(tokio::spawn(async move {
            if let Err(e) = serve_lines(reader, writer, handler, pending, rx).await {
                tracing::error!(error = %e, "stdio transport failed");
            }
            let _ = closed_tx.send(true);
        }));
        self.shutdown = Some(tx);
        tracing::info!("stdio transport started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), TransportError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.await.map_err(|e| TransportError::Io(std::io::Error::other(e)))?;
            tracing::info!("stdio transport stopped");
        }
        Ok(())
    }

    fn destroy(&mut self) {
        self.shutdown.take();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.io.get_mut().unwrap_or_else(|e| e.into_inner()).take();
        self.handler = None;
        self.pending.clear();
        tracing::info!("stdio transport destroyed");
    }

    async fn closed(&self) {
        let mut rx = self.closed.clone();
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt};

    fn upper_handler() -> RequestHandler {
        Arc::new(|raw: &[u8], sink: &dyn ResponseSink| {
            let _ = sink.send_response(&String::from_utf8_lossy(raw).to_uppercase());
        })
    }

    #[tokio::test]
    async fn answers_each_line_and_closes_on_eof() {
        let input: &[u8] = b"one\n\ntwo\r\n";
        let (out_write, mut out_read) = duplex(1024);
        let mut t = StdioTransport::with_io(BufReader::new(input), out_write);
        t.set_request_handler(upper_handler());
        t.init(0).await.unwrap();
        t.start().await.unwrap();
        t.closed().await;
        t.stop().await.unwrap();
        drop(t);

        let mut out = String::new();
        out_read.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "ONE\nTWO\n");
    }

    #[tokio::test]
    async fn start_without_handler_fails() {
        let (w, _r) = duplex(64);
        let mut t = StdioTransport::with_io(BufReader::new(&b""[..]), w);
        t.init(0).await.unwrap();
        assert!(matches!(t.start().await, Err(TransportError::NoHandler)));
    }

    #[tokio::test]
    async fn start_requires_init() {
        let (w, _r) = duplex(64);
        let mut t = StdioTransport::with_io(BufReader::new(&b""[..]), w);
        t.set_request_handler(upper_handler());
        assert!(matches!(t.start().await, Err(TransportError::NotInitialized)));
    }
}
