use thiserror::Error;

/// Failure modes surfaced by the HTTP model: the registry, response
/// assembly, and request dispatch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HttpError {
    #[error("no server is registered for port {0}")]
    NoServerForPort(u16),
    #[error("a server is already registered for port {0}")]
    PortInUse(u16),
    #[error("content-length mismatch: header says {declared}, body is {actual} bytes")]
    ContentLengthMismatch { declared: usize, actual: usize },
    #[error("handler for {0} timed out after 30s")]
    Timeout(String),
    #[error("handler threw: {0}")]
    HandlerError(String),
}

pub type HttpResult<T> = Result<T, HttpError>;
