use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DevServerError {
    #[error("no page or route matched {0}")]
    NotFound(String),
    #[error("route handler for {0} does not export the {1} method")]
    MethodNotAllowed(String, String),
    #[error("handler for {0} timed out")]
    HandlerTimeout(String),
    #[error("transform failed for {path}: {message}")]
    Transform { path: String, message: String },
    #[error("handler evaluation failed: {0}")]
    Evaluation(String),
    #[error(transparent)]
    Vfs(#[from] playground_vfs::VfsError),
}

pub type DevServerResult<T> = Result<T, DevServerError>;
