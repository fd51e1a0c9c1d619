use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("transform layer was not initialized before use")]
    NotInitialized,
    #[error("no alias configured for specifier '{0}'")]
    UnresolvedAlias(String),
    #[error("unsupported source extension: '{0}'")]
    UnsupportedExtension(String),
}

pub type TransformResult<T> = Result<T, TransformError>;
