//! Error taxonomy for module resolution, loading, and execution.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("cannot find module '{0}'")]
    NotFound(String),

    #[error("invalid package.json at '{0}': {1}")]
    InvalidManifest(String, String),

    #[error("no matching export for subpath '{1}' in package '{0}'")]
    ExportsMismatch(String, String),

    #[error("module '{0}' is not readable as UTF-8")]
    InvalidEncoding(String),

    #[error("circular require detected while loading '{0}'")]
    CircularRequire(String),

    #[error("error while evaluating module '{0}': {1}")]
    Evaluation(String, String),

    #[error("host primitive '{0}' has no shim registered")]
    UnshimmedHostPrimitive(String),

    #[error(transparent)]
    Vfs(#[from] playground_vfs::VfsError),
}

pub type ModuleResult<T> = Result<T, ModuleError>;
