//! Browser bindings over [`playground_runtime::Playground`]. This crate is
//! the one place in the workspace allowed to touch a real wall clock and a
//! real `window` -- everything it calls into still takes its clock and its
//! config as plain arguments, the way the rest of the workspace is built to
//! be hosted.

mod clock;

use std::rc::Rc;

use boa_engine::JsValue as EngineValue;
use js_sys::{Function, Object, Reflect};
use rustc_hash::FxHashMap;
use wasm_bindgen::prelude::*;

use playground_devserver::IncomingRequest;
use playground_runtime::{Playground, PlaygroundConfig, RuntimeError};
use playground_sw_bridge::SwRequestEnvelope;
use playground_vfs::Clock;

use clock::PerformanceClock;

fn runtime_err(err: RuntimeError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn js_err(message: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&message.to_string())
}

/// Installs the panic hook and routes the `log` facade to the console --
/// call once, before constructing a [`WasmPlayground`]. Mirrors how the
/// native CLI wires `simple_logger::init` before doing anything else.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}

/// The text of the service worker script a host page must register at its
/// origin root for the cross-origin bridge to intercept `fetch` at all.
#[wasm_bindgen(js_name = workerScript)]
pub fn worker_script() -> String {
    playground_sw_bridge::render_worker_script(playground_sw_bridge::VIRTUAL_PREFIX)
}

#[wasm_bindgen]
pub struct WasmPlayground {
    inner: Playground,
}

#[wasm_bindgen]
impl WasmPlayground {
    /// Builds a `Playground` backed by `performance.now()`. Fails only if
    /// there is no `window` (e.g. called from a worker context), in which
    /// case the host should construct its own `Clock` impl instead -- this
    /// binding only covers the common main-thread case.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WasmPlayground, JsValue> {
        let clock = PerformanceClock::new().ok_or_else(|| js_err("no `window.performance` available"))?;
        let clock: Rc<dyn Clock> = Rc::new(clock);
        let inner = Playground::new(clock, PlaygroundConfig::default()).map_err(runtime_err)?;
        Ok(Self { inner })
    }

    #[wasm_bindgen(js_name = vfsWrite)]
    pub fn vfs_write(&self, path: &str, contents: &str) -> Result<(), JsValue> {
        self.inner.vfs().write(path, contents).map_err(js_err)
    }

    #[wasm_bindgen(js_name = vfsReadToString)]
    pub fn vfs_read_to_string(&self, path: &str) -> Result<String, JsValue> {
        self.inner.vfs().read_to_string(path).map_err(js_err)
    }

    #[wasm_bindgen(js_name = vfsExists)]
    pub fn vfs_exists(&self, path: &str) -> bool {
        self.inner.vfs().exists(path)
    }

    #[wasm_bindgen(js_name = registerFrameworkServer)]
    pub fn register_framework_server(&mut self, port: u16) -> Result<(), JsValue> {
        self.inner.register_framework_server(port).map_err(runtime_err)
    }

    #[wasm_bindgen(js_name = registerViteServer)]
    pub fn register_vite_server(&mut self, port: u16, root: String) -> Result<(), JsValue> {
        self.inner.register_vite_server(port, root).map_err(runtime_err)
    }

    #[wasm_bindgen(js_name = unregisterServer)]
    pub fn unregister_server(&mut self, port: u16) -> Result<(), JsValue> {
        self.inner.unregister_server(port).map_err(runtime_err)
    }

    /// Dispatches directly against a registered port, bypassing the
    /// service-worker bridge, and returns a `{status, headers, body}`
    /// object -- the path a same-origin embedding without a worker uses.
    #[wasm_bindgen(js_name = handleFetch)]
    pub fn handle_fetch(
        &mut self,
        port: u16,
        method: String,
        url: String,
        headers_json: Option<String>,
        body: Option<String>,
    ) -> Result<JsValue, JsValue> {
        let headers: FxHashMap<String, String> = match headers_json {
            Some(json) => serde_json::from_str(&json).map_err(js_err)?,
            None => FxHashMap::default(),
        };
        let request = IncomingRequest { method, url, headers, body: body.map(String::into_bytes) };
        let record = self.inner.handle_fetch(port, &request).map_err(runtime_err)?;
        record_to_object(&record)
    }

    /// Answers one service-worker request envelope (JSON-encoded, matching
    /// the worker's own `postMessage` shape) and returns the JSON-encoded
    /// response payload, ready to post straight back over the worker's
    /// message port.
    #[wasm_bindgen(js_name = dispatchSwRequest)]
    pub fn dispatch_sw_request(&mut self, envelope_json: &str) -> Result<String, JsValue> {
        let envelope: SwRequestEnvelope = serde_json::from_str(envelope_json).map_err(js_err)?;
        let data = self.inner.dispatch_sw_request(&envelope).map_err(runtime_err)?;
        serde_json::to_string(&data).map_err(js_err)
    }

    /// Subscribes `callback` to server register/unregister lifecycle
    /// events, each forwarded as a JSON-encoded string argument -- the
    /// host page's half of the bridge's `init`/lifecycle plumbing.
    #[wasm_bindgen(js_name = subscribeLifecycle)]
    pub fn subscribe_lifecycle(&self, callback: Function) {
        self.inner.subscribe_lifecycle(move |message| {
            if let Ok(json) = serde_json::to_string(&message) {
                let _ = callback.call1(&JsValue::NULL, &JsValue::from_str(&json));
            }
        });
    }

    /// Drains `channel_tag`'s batched HMR messages, JSON-encoded -- the
    /// host page calls this from a `setInterval` and forwards each message
    /// to the owning iframe by `postMessage`.
    #[wasm_bindgen(js_name = flushHmr)]
    pub fn flush_hmr(&self, channel_tag: &str) -> Result<String, JsValue> {
        let messages = self.inner.flush_hmr(channel_tag);
        serde_json::to_string(&messages).map_err(js_err)
    }

    #[wasm_bindgen(js_name = runFile)]
    pub fn run_file(&mut self, path: &str) -> Result<String, JsValue> {
        let value = self.inner.run_file(path).map_err(runtime_err)?;
        display_value(self.inner.context_mut(), &value)
    }

    pub fn require(&mut self, from_dir: &str, specifier: &str) -> Result<String, JsValue> {
        let value = self.inner.require(from_dir, specifier).map_err(runtime_err)?;
        display_value(self.inner.context_mut(), &value)
    }

    #[wasm_bindgen(js_name = clearCache)]
    pub fn clear_cache(&self) {
        self.inner.clear_cache();
    }
}

fn display_value(context: &mut boa_engine::Context, value: &EngineValue) -> Result<String, JsValue> {
    value
        .to_string(context)
        .map(|s| s.to_std_string_escaped())
        .map_err(|err| js_err(err.to_string()))
}

fn record_to_object(record: &playground_http::ResponseRecord) -> Result<JsValue, JsValue> {
    let obj = Object::new();
    Reflect::set(&obj, &JsValue::from_str("status"), &JsValue::from_f64(record.status_code as f64)).map_err(js_err)?;

    let headers_obj = Object::new();
    for (name, value) in &record.headers {
        Reflect::set(&headers_obj, &JsValue::from_str(name), &JsValue::from_str(value)).map_err(js_err)?;
    }
    Reflect::set(&obj, &JsValue::from_str("headers"), &headers_obj).map_err(js_err)?;

    let body = String::from_utf8_lossy(&record.body).into_owned();
    Reflect::set(&obj, &JsValue::from_str("body"), &JsValue::from_str(&body)).map_err(js_err)?;

    Ok(obj.into())
}

#[cfg(all(any(target_arch = "wasm32", target_arch = "wasm64"), target_os = "unknown"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn constructing_a_playground_and_writing_a_file_round_trips() {
        let pg = WasmPlayground::new().unwrap();
        pg.vfs_write("/pages/index.jsx", "export default function Home() {}\n").unwrap();
        assert!(pg.vfs_exists("/pages/index.jsx"));
    }
}
