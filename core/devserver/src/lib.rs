//! In-page dev servers: the framework-style server (Pages/App-Router
//! resolution, HTML generation, API/route-handler execution) and the
//! simpler Vite-style server, sharing the same [`playground_transform`]
//! pipeline and [`playground_vfs`] filesystem.

mod config;
mod error;
mod framework;
mod html;
mod route;
mod shims;
mod vite;

pub use config::{DevServerConfig, PUBLIC_ENV_PREFIX};
pub use error::{DevServerError, DevServerResult};
pub use framework::{
    split_query, strip_asset_and_base_path, strip_virtual_prefix, FrameworkServer, IncomingRequest,
    FRAMEWORK_CHANNEL_TAG,
};
pub use html::{render_document, DocumentOptions};
pub use route::RouteResolution;
pub use vite::{ViteServer, VITE_CHANNEL_TAG};
