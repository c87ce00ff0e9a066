use thiserror::Error;

/// Failures while decoding or encoding a JSON-RPC envelope.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("missing or non-string 'method'")]
    MissingMethod,
    #[error("failed to serialize envelope: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Setup-time failures when registering tools.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool '{0}' already registered")]
    DuplicateName(String),
    #[error("maximum number of tools ({0}) reached")]
    CapacityExceeded(usize),
    #[error("invalid tool registration: {0}")]
    InvalidArgument(&'static str),
}

/// Byte-channel failures. These never produce a JSON-RPC envelope.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
    #[error("transport not initialized")]
    NotInitialized,
    #[error("transport already started")]
    AlreadyStarted,
    #[error("no request handler installed")]
    NoHandler,
    #[error("transport I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// Server lifecycle errors surfaced to the embedding application.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("server already running")]
    AlreadyRunning,
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_displays_registry_errors() {
        let e = RegistryError::DuplicateName("hello_world".into());
        assert_eq!(e.to_string(), "tool 'hello_world' already registered");
        let e = RegistryError::CapacityExceeded(32);
        assert!(e.to_string().contains("32"));
    }

    #[test]
    fn it_wraps_registry_error_in_server_error() {
        let e: ServerError = RegistryError::CapacityExceeded(1).into();
        assert!(matches!(e, ServerError::Registry(RegistryError::CapacityExceeded(1))));
    }

    #[test]
    fn bind_error_names_the_port() {
        let e = TransportError::Bind {
            port: 3000,
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        assert!(e.to_string().contains("3000"));
    }
}
