//! Ties a registered port to one of the two dev-server styles, and
//! installs the native entry point `VirtualServer.handler`'s thin JS
//! wrapper calls into -- the same "embed a JSON constant into a `(function
//! (...) {...})(...)` template" idiom [`playground_module::ModuleRuntime`]
//! uses for `createRequire`.

use std::cell::RefCell;
use std::rc::Rc;

use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::{js_string, Context, JsError, JsNativeError, JsResult, JsString, JsValue, NativeFunction, Source};
use boa_interop::{ContextData, IntoJsFunctionCopied};
use rustc_hash::FxHashMap;

use playground_devserver::{split_query, strip_asset_and_base_path, strip_virtual_prefix, DevServerConfig, FrameworkServer, IncomingRequest, ViteServer};
use playground_http::ResponseRecord;
use playground_module::ModuleRuntime;
use playground_transform::TransformState;

use crate::error::{RuntimeError, RuntimeResult};

#[derive(Clone)]
pub(crate) enum DevServerKind {
    Framework(Rc<FrameworkServer>),
    Vite(Rc<ViteServer>),
}

/// The single piece of shared state every registered port's handler
/// closes over, reached through `boa_engine`'s `ContextData` extractor --
/// one slot per `Context`, matching how [`playground_module::ModuleRuntime`]
/// and [`playground_shims::ShimState`] are threaded through.
pub(crate) struct RuntimeState {
    pub(crate) servers: RefCell<FxHashMap<u16, DevServerKind>>,
    pub(crate) module_runtime: Rc<ModuleRuntime>,
    pub(crate) transform_state: Rc<RefCell<TransformState>>,
    pub(crate) dev_config: DevServerConfig,
}

impl RuntimeState {
    pub(crate) fn dispatch(
        &self,
        context: &mut Context,
        port: u16,
        request: &IncomingRequest,
    ) -> RuntimeResult<ResponseRecord> {
        let kind = self
            .servers
            .borrow()
            .get(&port)
            .cloned()
            .ok_or(RuntimeError::NoServerForPort(port))?;

        match kind {
            DevServerKind::Framework(server) => {
                let transform_state = self.transform_state.borrow();
                Ok(server.handle_request(context, &self.module_runtime, &transform_state, port, request)?)
            }
            DevServerKind::Vite(server) => {
                let (raw_path, _query) = split_query(&request.url);
                let stripped = strip_virtual_prefix(&raw_path, port);
                let pathname = strip_asset_and_base_path(&stripped, &self.dev_config);
                let transform_state = self.transform_state.borrow();
                Ok(server.handle_request(&transform_state, &pathname, &request.headers)?)
            }
        }
    }
}

/// Registers `__playground_dispatch_native` once per `Context`. Every
/// subsequently registered server's JS handler is a tiny closure embedding
/// its own port number, calling straight back into this one entry point --
/// so the per-port distinction lives entirely in `RuntimeState::servers`,
/// not in a new native function per port.
pub(crate) fn install(context: &mut Context, state: Rc<RuntimeState>) -> JsResult<()> {
    context.insert_data(state);
    let dispatch_fn = dispatch_native.into_js_function_copied(context).to_js_function(context.realm());
    context.register_global_property(js_string!("__playground_dispatch_native"), dispatch_fn, Attribute::all())?;
    Ok(())
}

/// Builds the `handleRequest(method, url, headers, body)` callable a port
/// registers into [`playground_http::ServerRegistry`] -- a thin JS
/// forwarder to `__playground_dispatch_native`, parallel to how
/// `ModuleRuntime::create_require` builds a bound `require` from a JSON-
/// embedded `fromDir` constant.
pub(crate) fn build_handler(context: &mut Context, port: u16) -> JsResult<JsValue> {
    let source = format!(
        "(function (method, url, headers, body) {{\n\
             const payload = JSON.stringify({{\n\
                 method: method,\n\
                 url: url,\n\
                 headers: headers || {{}},\n\
                 body: body === undefined || body === null ? \"\" : String(body),\n\
             }});\n\
             return __playground_dispatch_native({port}, payload);\n\
         }})"
    );
    context.eval(Source::from_bytes(source.as_bytes()))
}

#[derive(serde::Deserialize)]
struct DispatchPayload {
    method: String,
    url: String,
    #[serde(default)]
    headers: FxHashMap<String, String>,
    #[serde(default)]
    body: String,
}

fn dispatch_native(
    ContextData(state): ContextData<Rc<RuntimeState>>,
    port: u16,
    payload: JsString,
    context: &mut Context,
) -> JsResult<JsValue> {
    let payload: DispatchPayload = serde_json::from_str(&payload.to_std_string_escaped())
        .map_err(|err| JsError::from(JsNativeError::error().with_message(err.to_string())))?;
    let body = if payload.body.is_empty() { None } else { Some(payload.body.into_bytes()) };

    let request = IncomingRequest { method: payload.method, url: payload.url, headers: payload.headers, body };
    let record = state
        .dispatch(context, port, &request)
        .map_err(|err| JsError::from(JsNativeError::error().with_message(err.to_string())))?;
    response_record_to_js(context, &record)
}

/// Converts a finished [`ResponseRecord`] into the `{status, headers,
/// text()}` shape [`playground_http::response_from_returned_value`]
/// accepts -- the same Response-shaped object a Web-API route handler
/// would return, so a dispatched fetch survives the round trip back
/// through the service-worker bridge untouched.
pub(crate) fn response_record_to_js(context: &mut Context, record: &ResponseRecord) -> JsResult<JsValue> {
    let attribute = Attribute::default();
    let mut headers_init = ObjectInitializer::new(context);
    for (name, value) in &record.headers {
        headers_init = headers_init.property(js_string!(name.clone()), js_string!(value.clone()), attribute);
    }
    let headers_obj = headers_init.build();

    let body_text = String::from_utf8_lossy(&record.body).into_owned();
    let text_fn = unsafe {
        NativeFunction::from_closure(move |_this, _args, _context| Ok(JsValue::from(js_string!(body_text.clone()))))
    };

    let obj = ObjectInitializer::new(context)
        .property(js_string!("status"), JsValue::from(record.status_code as i32), attribute)
        .property(js_string!("headers"), JsValue::from(headers_obj), attribute)
        .function(text_fn, js_string!("text"), 0)
        .build();
    Ok(JsValue::from(obj))
}
