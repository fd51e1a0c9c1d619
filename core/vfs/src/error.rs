use thiserror::Error;

/// Failure modes surfaced by [`crate::Vfs`] operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VfsError {
    #[error("ENOENT: no such file or directory, '{0}'")]
    NotFound(String),
    #[error("ENOTDIR: not a directory, '{0}'")]
    NotDirectory(String),
    #[error("EISDIR: illegal operation on a directory, '{0}'")]
    IsDirectory(String),
    #[error("ENOTEMPTY: directory not empty, '{0}'")]
    NotEmpty(String),
    #[error("EEXIST: file already exists, '{0}'")]
    AlreadyExists(String),
    #[error("invalid encoding for '{0}'")]
    InvalidEncoding(String),
}

pub type VfsResult<T> = Result<T, VfsError>;
