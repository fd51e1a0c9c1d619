//! The facade (SPEC_FULL.md §2's "these must compose"): a single
//! [`Playground`] owning one [`playground_vfs::Vfs`], one
//! `boa_engine::Context`, one [`playground_module::ModuleRuntime`], the
//! [`playground_http::ServerRegistry`], the transform layer, and one
//! [`playground_hmr::HmrChannel`] per dev-server style -- wiring them
//! exactly along the flow SPEC_FULL.md §2 describes: a fetch is
//! intercepted by the service-worker bridge, dispatched to a registered
//! server, which consults the VFS and the transform layer for a response;
//! a VFS mutation is observed by an HMR channel and, once flushed, handed
//! to the host page to forward to the iframe.

mod config;
mod error;
mod server;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use boa_engine::{Context, JsValue};
use rustc_hash::FxHashMap;

use playground_devserver::{FrameworkServer, IncomingRequest, ViteServer, FRAMEWORK_CHANNEL_TAG, VITE_CHANNEL_TAG};
use playground_hmr::{HmrChannel, HmrMessage};
use playground_http::{ResponseRecord, ServerRegistry};
use playground_module::ModuleRuntime;
use playground_shims::ShimState;
use playground_sw_bridge::{LifecycleMessage, SwRequestEnvelope, SwResponseData};
use playground_transform::{CdnConfig, TransformLayer};
use playground_vfs::{Clock, Vfs, WatchHandle};

pub use config::{PlaygroundConfig, DEFAULT_HMR_WINDOW_MS, DEFAULT_TRANSFORM_CACHE_CAPACITY};
pub use error::{RuntimeError, RuntimeResult};

use server::{DevServerKind, RuntimeState};

/// One browser-page-resident instance of the whole system. Not `Clone` --
/// a page has exactly one of these, matching §5's single-threaded
/// cooperative model; there is no second instance to share it with.
pub struct Playground {
    vfs: Vfs,
    clock: Rc<dyn Clock>,
    context: Context,
    module_runtime: Rc<ModuleRuntime>,
    registry: Rc<ServerRegistry>,
    state: Rc<RuntimeState>,
    config: PlaygroundConfig,
    hmr_channels: RefCell<FxHashMap<String, Rc<HmrChannel>>>,
    watch_handles: RefCell<Vec<WatchHandle>>,
}

impl Playground {
    /// Builds a fresh instance: a VFS backed by `clock`, the host primitive
    /// shims, the module runtime, and the one-shot transform-layer
    /// initialization -- in that order, since the module runtime's
    /// `require('fs')` etc. must already resolve by the time any module
    /// body runs.
    pub fn new(clock: Rc<dyn Clock>, config: PlaygroundConfig) -> RuntimeResult<Self> {
        let vfs = Vfs::new(clock.clone());
        let mut context = Context::default();

        let env: BTreeMap<String, String> = config
            .dev_server
            .env
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let shim_state = ShimState::new(vfs.clone(), env);
        let shims = playground_shims::install(&mut context, shim_state)?;

        let module_runtime = ModuleRuntime::new(vfs.clone(), shims);
        module_runtime.install(&mut context)?;

        let registry = ServerRegistry::new();

        let transform_layer = TransformLayer::new();
        let transform_state = transform_layer.ensure_initialized(
            config.alias_config.clone(),
            CdnConfig { base_url: config.cdn_base_url.clone() },
            config.transform_cache_capacity,
        );

        let state = Rc::new(RuntimeState {
            servers: RefCell::new(FxHashMap::default()),
            module_runtime: module_runtime.clone(),
            transform_state,
            dev_config: config.dev_server.clone(),
        });
        server::install(&mut context, state.clone())?;

        Ok(Self {
            vfs,
            clock,
            context,
            module_runtime,
            registry,
            state,
            config,
            hmr_channels: RefCell::new(FxHashMap::default()),
            watch_handles: RefCell::new(Vec::new()),
        })
    }

    pub fn vfs(&self) -> &Vfs {
        &self.vfs
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Binds a framework-style (Pages/App-Router) server to `port`,
    /// registering its `handleRequest` callable into the server registry
    /// and starting its HMR channel watching `pagesDir`/`appDir`.
    pub fn register_framework_server(&mut self, port: u16) -> RuntimeResult<()> {
        if self.registry.is_registered(port) {
            return Err(RuntimeError::PortInUse(port));
        }
        let server = FrameworkServer::new(self.vfs.clone(), self.config.dev_server.clone(), self.config.cdn_base_url.clone());
        self.state.servers.borrow_mut().insert(port, DevServerKind::Framework(Rc::new(server)));

        let handler = server::build_handler(&mut self.context, port)?;
        self.registry.register(port, handler)?;

        let channel = self.ensure_hmr_channel(FRAMEWORK_CHANNEL_TAG);
        let mut handles = self.watch_handles.borrow_mut();
        handles.push(channel.watch(&self.vfs, &self.config.dev_server.pages_dir, true));
        handles.push(channel.watch(&self.vfs, &self.config.dev_server.app_dir, true));
        Ok(())
    }

    /// Binds a Vite-style static server to `port`, rooted at `root`.
    pub fn register_vite_server(&mut self, port: u16, root: impl Into<String>) -> RuntimeResult<()> {
        if self.registry.is_registered(port) {
            return Err(RuntimeError::PortInUse(port));
        }
        let root = root.into();
        let server = ViteServer::new(self.vfs.clone(), root.clone(), self.config.cdn_base_url.clone());
        self.state.servers.borrow_mut().insert(port, DevServerKind::Vite(Rc::new(server)));

        let handler = server::build_handler(&mut self.context, port)?;
        self.registry.register(port, handler)?;

        let channel = self.ensure_hmr_channel(VITE_CHANNEL_TAG);
        self.watch_handles.borrow_mut().push(channel.watch(&self.vfs, &root, true));
        Ok(())
    }

    pub fn unregister_server(&mut self, port: u16) -> RuntimeResult<()> {
        self.state.servers.borrow_mut().remove(&port);
        self.registry.unregister(port)?;
        Ok(())
    }

    fn ensure_hmr_channel(&self, channel_tag: &str) -> Rc<HmrChannel> {
        if let Some(existing) = self.hmr_channels.borrow().get(channel_tag) {
            return existing.clone();
        }
        let channel = HmrChannel::new(channel_tag.to_string(), self.clock.clone());
        self.hmr_channels.borrow_mut().insert(channel_tag.to_string(), channel.clone());
        channel
    }

    /// Drains `channel_tag`'s batched changes older than the configured
    /// HMR window. The host page calls this periodically (a real
    /// `setInterval`, since this engine has no timer of its own) and
    /// forwards each message by `postMessage` to the owning iframe.
    pub fn flush_hmr(&self, channel_tag: &str) -> Vec<HmrMessage> {
        match self.hmr_channels.borrow().get(channel_tag) {
            Some(channel) => channel.flush(self.config.hmr_window_ms),
            None => Vec::new(),
        }
    }

    /// Dispatches a request directly against a registered port, bypassing
    /// the service-worker bridge -- the path a same-origin embedding (no
    /// iframe sandbox, no worker) would use.
    pub fn handle_fetch(&mut self, port: u16, request: &IncomingRequest) -> RuntimeResult<ResponseRecord> {
        self.state.dispatch(&mut self.context, port, request)
    }

    /// Answers one service-worker request envelope -- the path a
    /// sandboxed iframe's `fetch` takes after the worker intercepts it.
    pub fn dispatch_sw_request(&mut self, request: &SwRequestEnvelope) -> RuntimeResult<SwResponseData> {
        Ok(playground_sw_bridge::dispatch_virtual_request(&mut self.context, &self.registry, request)?)
    }

    /// Subscribes to server register/unregister notifications, converted
    /// to the worker's lifecycle message shape -- the bridge's page-side
    /// half forwards these over the message port.
    pub fn subscribe_lifecycle(&self, forward: impl Fn(LifecycleMessage) + 'static) {
        playground_sw_bridge::subscribe_lifecycle(&self.registry, forward);
    }

    pub fn run_file(&mut self, path: &str) -> RuntimeResult<JsValue> {
        Ok(self.module_runtime.run_file(&mut self.context, path)?)
    }

    pub fn require(&mut self, from_dir: &str, specifier: &str) -> RuntimeResult<JsValue> {
        Ok(self.module_runtime.require(&mut self.context, from_dir, specifier)?)
    }

    pub fn clear_cache(&self) {
        self.module_runtime.clear_cache();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playground_vfs::LogicalClock;
    use rustc_hash::FxHashMap as Map;

    fn playground() -> Playground {
        Playground::new(Rc::new(LogicalClock::new()), PlaygroundConfig::default()).unwrap()
    }

    #[test]
    fn registering_a_framework_server_and_fetching_the_home_page_round_trips() {
        let mut pg = playground();
        pg.vfs()
            .write("/pages/index.jsx", "export default function Home() { return null; }\n")
            .unwrap();
        pg.register_framework_server(3001).unwrap();

        let request = IncomingRequest {
            method: "GET".to_string(),
            url: "/__virtual__/3001/".to_string(),
            headers: Map::default(),
            body: None,
        };
        let record = pg.handle_fetch(3001, &request).unwrap();
        assert_eq!(record.status_code, 200);
        assert_eq!(record.headers.get("content-type").unwrap(), "text/html; charset=utf-8");
    }

    #[test]
    fn registering_the_same_port_twice_fails() {
        let mut pg = playground();
        pg.register_framework_server(3002).unwrap();
        assert!(matches!(pg.register_framework_server(3002), Err(RuntimeError::PortInUse(3002))));
    }

    #[test]
    fn fetch_against_an_unregistered_port_fails() {
        let mut pg = playground();
        let request = IncomingRequest {
            method: "GET".to_string(),
            url: "/__virtual__/9999/".to_string(),
            headers: Map::default(),
            body: None,
        };
        assert!(matches!(pg.handle_fetch(9999, &request), Err(RuntimeError::NoServerForPort(9999))));
    }

    #[test]
    fn sw_bridge_dispatch_reaches_the_same_registered_server() {
        let mut pg = playground();
        pg.vfs().write("/pages/api/hello.js", "module.exports = (req, res) => res.status(200).json({ ok: true });\n").unwrap();
        pg.register_framework_server(3003).unwrap();

        let request = SwRequestEnvelope {
            id: 1,
            port: 3003,
            method: "GET".to_string(),
            url: "/__virtual__/3003/api/hello".to_string(),
            headers: Map::default(),
            body: None,
        };
        let data = pg.dispatch_sw_request(&request).unwrap();
        assert_eq!(data.status_code, 200);
    }

    #[test]
    fn hmr_flush_returns_a_message_once_its_window_elapses() {
        let mut config = PlaygroundConfig::default();
        config.hmr_window_ms = 0;
        let mut pg = Playground::new(Rc::new(LogicalClock::new()), config).unwrap();
        pg.vfs().write("/pages/index.jsx", "x").unwrap();
        pg.register_framework_server(3004).unwrap();

        pg.vfs().write("/pages/index.jsx", "y").unwrap();
        let messages = pg.flush_hmr(FRAMEWORK_CHANNEL_TAG);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].path, "/pages/index.jsx");
    }

    #[test]
    fn hmr_flush_is_empty_for_an_unknown_channel_tag() {
        let pg = playground();
        assert!(pg.flush_hmr("nonexistent-channel").is_empty());
    }

    #[test]
    fn unregistering_a_server_then_fetching_fails() {
        let mut pg = playground();
        pg.register_framework_server(3005).unwrap();
        pg.unregister_server(3005).unwrap();
        let request = IncomingRequest {
            method: "GET".to_string(),
            url: "/__virtual__/3005/".to_string(),
            headers: Map::default(),
            body: None,
        };
        assert!(matches!(pg.handle_fetch(3005, &request), Err(RuntimeError::NoServerForPort(3005))));
    }
}
