//! Page-side dispatch: answers one [`SwRequestEnvelope`] by calling the
//! registered server's `handleRequest(method, url, headers, body)` directly
//! -- the generic contract from §5, distinct from the Node-style/Web-style
//! calling conventions [`playground_devserver::FrameworkServer`] uses for
//! framework handlers.

use std::rc::Rc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::{js_string, Context, JsValue};
use playground_http::{response_from_returned_value, RegistryEvent, ServerRegistry};

use crate::envelope::{LifecycleMessage, SwRequestEnvelope, SwResponseData};
use crate::error::{SwBridgeError, SwBridgeResult};

/// Builds the call arguments for `handleRequest(method, url, headers,
/// body)`. `body`, when present, is decoded lossily the same way
/// [`playground_http::MockRequest::to_js`] decodes a mock request body --
/// handlers read it as text, not as a typed-array view.
fn call_args(context: &mut Context, request: &SwRequestEnvelope) -> [JsValue; 4] {
    let method = JsValue::from(js_string!(request.method.clone()));
    let url = JsValue::from(js_string!(request.url.clone()));

    let attribute = Attribute::default();
    let mut init = ObjectInitializer::new(context);
    for (name, value) in &request.headers {
        init = init.property(js_string!(name.clone()), js_string!(value.clone()), attribute);
    }
    let headers = JsValue::from(init.build());

    let body = match &request.body {
        Some(bytes) => JsValue::from(js_string!(String::from_utf8_lossy(bytes).into_owned())),
        None => JsValue::undefined(),
    };

    [method, url, headers, body]
}

/// Looks up the server for `request.port` and invokes its handler, turning
/// the result (or a thrown/rejected value) into a [`SwResponseData`] ready
/// for the `{id, data}` wire message. `registry` lookups failing is the
/// bridge's one genuinely-503 case; everything a handler throws bottoms out
/// as [`SwBridgeError::HandlerError`], which callers map to the `{id,
/// error}` wire shape instead.
pub fn dispatch_virtual_request(
    context: &mut Context,
    registry: &Rc<ServerRegistry>,
    request: &SwRequestEnvelope,
) -> SwBridgeResult<SwResponseData> {
    let server = registry.get(request.port).ok_or(SwBridgeError::NoServerForPort(request.port))?;
    let Some(handler) = server.handler.as_callable() else {
        return Err(SwBridgeError::HandlerError(request.port, "handleRequest is not callable".to_string()));
    };

    let args = call_args(context, request);
    let result = handler
        .call(&JsValue::undefined(), &args, context)
        .map_err(|err| SwBridgeError::HandlerError(request.port, err.to_string()))?;

    let record = response_from_returned_value(context, &result)
        .map_err(|err| SwBridgeError::HandlerError(request.port, err.to_string()))?;

    Ok(SwResponseData {
        status_code: record.status_code,
        status_message: record.status_message,
        headers: record.headers,
        body_base64: BASE64.encode(&record.body),
    })
}

/// Wires registry lifecycle events to `server-registered`/`server-
/// unregistered` worker messages. `forward` is the page's actual
/// `port.postMessage` call, injected so this crate never depends on a real
/// `MessagePort`.
pub fn subscribe_lifecycle(registry: &Rc<ServerRegistry>, forward: impl Fn(LifecycleMessage) + 'static) {
    registry.subscribe(move |event: RegistryEvent| forward(event.into()));
}
