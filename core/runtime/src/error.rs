use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Vfs(#[from] playground_vfs::VfsError),
    #[error(transparent)]
    Module(#[from] playground_module::ModuleError),
    #[error(transparent)]
    Http(#[from] playground_http::HttpError),
    #[error(transparent)]
    DevServer(#[from] playground_devserver::DevServerError),
    #[error(transparent)]
    SwBridge(#[from] playground_sw_bridge::SwBridgeError),
    #[error("no dev server is registered on port {0}")]
    NoServerForPort(u16),
    #[error("port {0} is already bound")]
    PortInUse(u16),
    #[error("engine error: {0}")]
    Engine(String),
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

impl From<boa_engine::JsError> for RuntimeError {
    fn from(err: boa_engine::JsError) -> Self {
        Self::Engine(err.to_string())
    }
}
