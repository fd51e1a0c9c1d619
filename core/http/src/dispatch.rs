//! Invokes a registered server's `handleRequest` with a mock `req`/`res`
//! pair (Node-style) and resolves the resulting [`ResponseRecord`].

use boa_engine::object::JsPromise;
use boa_engine::{Context, JsResult, JsValue};

use crate::error::HttpError;
use crate::registry::VirtualServer;
use crate::request::MockRequest;
use crate::response::{response_from_returned_value, MockResponse, ResponseRecord};

/// Node-style dispatch: `handler(req, res)`. The handler is expected to
/// finalize the response by calling `res.end()`/`res.json()`/`res.send()`;
/// if it returns a promise, that promise is awaited (bounded, per §5, by
/// draining the job queue) before the response is read back out.
pub fn dispatch_node_style(
    context: &mut Context,
    server: &VirtualServer,
    request: &MockRequest,
) -> Result<ResponseRecord, HttpError> {
    let callable = server
        .handler
        .as_callable()
        .ok_or_else(|| HttpError::HandlerError("registered handler is not callable".to_string()))?;

    let req_js = request
        .to_js(context)
        .map_err(|e| HttpError::HandlerError(e.to_string()))?;
    let (res_js, mock_response) =
        MockResponse::build(context).map_err(|e| HttpError::HandlerError(e.to_string()))?;

    let result = callable.call(&JsValue::undefined(), &[req_js, res_js], context);
    await_if_promise(context, result).map_err(|e| HttpError::HandlerError(e.to_string()))?;

    if !mock_response.is_ended() {
        return Err(HttpError::Timeout(request.url.clone()));
    }

    let record = mock_response.into_record();
    record.validate()?;
    Ok(record)
}

/// Web-API style dispatch: the module exports functions named by HTTP
/// verb (`GET`, `POST`, ...); the handler receives `(request, { params })`
/// and returns a `Response`-shaped value or plain object.
pub fn dispatch_web_style(
    context: &mut Context,
    handler: &JsValue,
    request_js: JsValue,
    params_js: JsValue,
) -> Result<ResponseRecord, HttpError> {
    let callable = handler
        .as_callable()
        .ok_or_else(|| HttpError::HandlerError("route handler export is not callable".to_string()))?;

    // Real App-Router handlers destructure `{ params }` as a promise
    // (`await params` or `params.then(...)`), not a plain object.
    let (params_promise, resolvers) = JsPromise::new_pending(context);
    resolvers
        .resolve
        .call(&JsValue::undefined(), &[params_js], context)
        .map_err(|e| HttpError::HandlerError(e.to_string()))?;

    let context_arg = boa_engine::object::ObjectInitializer::new(context)
        .property(
            boa_engine::js_string!("params"),
            JsValue::from(params_promise),
            boa_engine::property::Attribute::all(),
        )
        .build();

    let result = callable
        .call(&JsValue::undefined(), &[request_js, JsValue::from(context_arg)], context)
        .map_err(|e| HttpError::HandlerError(e.to_string()))?;

    response_from_returned_value(context, &result).map_err(|e| HttpError::HandlerError(e.to_string()))
}

/// Drains the job queue if `result` is a promise, per the grounded
/// `as_promise().await_blocking(context)` pattern. This engine has no real
/// timers, so a promise that is still pending once the queue is empty is
/// treated as the finite-runtime equivalent of the spec's 30s deadline.
fn await_if_promise(context: &mut Context, result: JsResult<JsValue>) -> JsResult<JsValue> {
    let value = result?;
    if let Some(promise) = value.as_promise() {
        promise.await_blocking(context)
    } else {
        Ok(value)
    }
}
