use thiserror::Error;

/// Failure modes surfaced while dispatching a virtual request from the
/// worker to its registered server. These map onto the §7 "SW transport
/// errors" taxonomy: no server → 503, handler throw → 500, transport
/// timeout is the worker's own concern and never reaches this crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SwBridgeError {
    #[error("no server is registered for port {0}")]
    NoServerForPort(u16),
    #[error("handler for port {0} threw: {1}")]
    HandlerError(u16, String),
}

pub type SwBridgeResult<T> = Result<T, SwBridgeError>;
