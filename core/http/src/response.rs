//! [`ResponseRecord`] and the mutable mock `res` object framework/API
//! handlers write to (`setHeader`/`writeHead`/`write`/`end`/`status`/
//! `json`/`send`).

use std::cell::RefCell;
use std::rc::Rc;

use boa_engine::object::ObjectInitializer;
use boa_engine::{js_string, Context, JsNativeError, JsResult, JsValue, NativeFunction};
use rustc_hash::FxHashMap;

use crate::error::HttpError;

/// A finished HTTP response: status line, lower-cased header map, and raw
/// body bytes. `Content-Length`, when present, must equal `body.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRecord {
    pub status_code: u16,
    pub status_message: String,
    pub headers: FxHashMap<String, String>,
    pub body: Vec<u8>,
}

impl ResponseRecord {
    pub fn validate(&self) -> Result<(), HttpError> {
        if let Some(declared) = self.headers.get("content-length") {
            let declared: usize = declared.parse().unwrap_or(usize::MAX);
            if declared != self.body.len() {
                return Err(HttpError::ContentLengthMismatch {
                    declared,
                    actual: self.body.len(),
                });
            }
        }
        Ok(())
    }

    pub fn json(status_code: u16, body: impl serde::Serialize) -> Self {
        let body = serde_json::to_vec(&body).unwrap_or_else(|_| b"null".to_vec());
        let mut headers = FxHashMap::default();
        headers.insert("content-type".to_string(), "application/json; charset=utf-8".to_string());
        headers.insert("content-length".to_string(), body.len().to_string());
        Self {
            status_code,
            status_message: status_text(status_code).to_string(),
            headers,
            body,
        }
    }

    pub fn html(status_code: u16, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        let mut headers = FxHashMap::default();
        headers.insert("content-type".to_string(), "text/html; charset=utf-8".to_string());
        headers.insert("content-length".to_string(), body.len().to_string());
        Self {
            status_code,
            status_message: status_text(status_code).to_string(),
            headers,
            body,
        }
    }
}

pub fn status_text(code: u16) -> &'static str {
    match code {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Interior-mutable accumulator the mock `res` object writes into. `end()`
/// freezes it into a [`ResponseRecord`]; calling any mutator afterward is a
/// no-op, matching "writes are dropped" after a timeout truncates a handler
/// per the spec's cancellation rule.
#[derive(Default)]
struct MockResponseState {
    status_code: u16,
    headers: FxHashMap<String, String>,
    body: Vec<u8>,
    ended: bool,
}

/// Builds the mock `res` object passed to API/route handlers. Each call
/// produces a fresh object and a fresh `Rc<RefCell<MockResponseState>>`
/// closed over by its methods -- no shared global slot, so concurrent
/// in-flight handlers never collide.
pub struct MockResponse {
    state: Rc<RefCell<MockResponseState>>,
}

impl MockResponse {
    pub fn build(context: &mut Context) -> JsResult<(JsValue, Self)> {
        let state = Rc::new(RefCell::new(MockResponseState {
            status_code: 200,
            ..Default::default()
        }));

        let set_header = {
            let state = state.clone();
            unsafe {
                NativeFunction::from_closure(move |_this, args, context| {
                    let name = args
                        .first()
                        .ok_or_else(|| JsNativeError::typ().with_message("setHeader(name, value)"))?
                        .to_string(context)?
                        .to_std_string_escaped()
                        .to_lowercase();
                    let value = args
                        .get(1)
                        .ok_or_else(|| JsNativeError::typ().with_message("setHeader(name, value)"))?
                        .to_string(context)?
                        .to_std_string_escaped();
                    state.borrow_mut().headers.insert(name, value);
                    Ok(JsValue::undefined())
                })
            }
        };

        let write_head = {
            let state = state.clone();
            unsafe {
                NativeFunction::from_closure(move |_this, args, context| {
                    if let Some(code) = args.first() {
                        state.borrow_mut().status_code = code.to_number(context)? as u16;
                    }
                    // Headers argument, if present, is serialized through JSON rather
                    // than walked key-by-key -- a plain `{name: value}` object survives
                    // that round-trip exactly, and it avoids reaching for an unconfirmed
                    // own-keys-enumeration API.
                    if let Some(headers_value) = args.get(1) {
                        if headers_value.as_object().is_some() {
                            let json = headers_value.to_json(context)?.to_string();
                            if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(&json) {
                                let mut s = state.borrow_mut();
                                for (name, value) in map {
                                    let value = match value {
                                        serde_json::Value::String(s) => s,
                                        other => other.to_string(),
                                    };
                                    s.headers.insert(name.to_lowercase(), value);
                                }
                            }
                        }
                    }
                    Ok(JsValue::undefined())
                })
            }
        };

        let status = {
            let state = state.clone();
            unsafe {
                NativeFunction::from_closure(move |this, args, context| {
                    if let Some(code) = args.first() {
                        state.borrow_mut().status_code = code.to_number(context)? as u16;
                    }
                    Ok(this.clone())
                })
            }
        };

        let write = {
            let state = state.clone();
            unsafe {
                NativeFunction::from_closure(move |_this, args, context| {
                    if let Some(chunk) = args.first() {
                        let text = chunk.to_string(context)?.to_std_string_escaped();
                        state.borrow_mut().body.extend_from_slice(text.as_bytes());
                    }
                    Ok(JsValue::from(true))
                })
            }
        };

        let end = {
            let state = state.clone();
            unsafe {
                NativeFunction::from_closure(move |_this, args, context| {
                    if let Some(chunk) = args.first() {
                        if !chunk.is_undefined() {
                            let text = chunk.to_string(context)?.to_std_string_escaped();
                            state.borrow_mut().body.extend_from_slice(text.as_bytes());
                        }
                    }
                    state.borrow_mut().ended = true;
                    Ok(JsValue::undefined())
                })
            }
        };

        let json = {
            let state = state.clone();
            unsafe {
                NativeFunction::from_closure(move |_this, args, context| {
                    let value = args.first().cloned().unwrap_or(JsValue::undefined());
                    let body = value.to_json(context)?.to_string();
                    {
                        let mut s = state.borrow_mut();
                        s.headers
                            .entry("content-type".to_string())
                            .or_insert_with(|| "application/json; charset=utf-8".to_string());
                        s.body = body.into_bytes();
                        s.ended = true;
                    }
                    Ok(JsValue::undefined())
                })
            }
        };

        let send = {
            let state = state.clone();
            unsafe {
                NativeFunction::from_closure(move |_this, args, context| {
                    if let Some(chunk) = args.first() {
                        let text = chunk.to_string(context)?.to_std_string_escaped();
                        let mut s = state.borrow_mut();
                        s.body = text.into_bytes();
                    }
                    state.borrow_mut().ended = true;
                    Ok(JsValue::undefined())
                })
            }
        };

        let obj = ObjectInitializer::new(context)
            .function(set_header, js_string!("setHeader"), 2)
            .function(write_head, js_string!("writeHead"), 2)
            .function(status, js_string!("status"), 1)
            .function(write, js_string!("write"), 1)
            .function(end, js_string!("end"), 1)
            .function(json, js_string!("json"), 1)
            .function(send, js_string!("send"), 1)
            .build();

        Ok((JsValue::from(obj), Self { state }))
    }

    pub fn is_ended(&self) -> bool {
        self.state.borrow().ended
    }

    pub fn into_record(self) -> ResponseRecord {
        let state = self.state.borrow();
        let status_code = if state.status_code == 0 { 200 } else { state.status_code };
        let mut headers = state.headers.clone();
        headers
            .entry("content-length".to_string())
            .or_insert_with(|| state.body.len().to_string());
        ResponseRecord {
            status_code,
            status_message: status_text(status_code).to_string(),
            headers,
            body: state.body.clone(),
        }
    }
}

/// Resolves a value that may be a Web-API `Response`-shaped object (`{
/// status, headers, ... }` with a `text()`/`arrayBuffer()` method) or a
/// plain object, into a [`ResponseRecord`] -- used for App-Router route
/// handlers, which return a value instead of writing into a mock `res`.
pub fn response_from_returned_value(context: &mut Context, value: &JsValue) -> JsResult<ResponseRecord> {
    let value = if let Some(promise) = value.as_promise() {
        promise.await_blocking(context)?
    } else {
        value.clone()
    };

    if value.is_undefined() || value.is_null() {
        return Ok(ResponseRecord::json(200, serde_json::Value::Null));
    }

    if let Some(obj) = value.as_object() {
        if obj.has_property(js_string!("status"), context)? || obj.has_property(js_string!("text"), context)? {
            let status_code = if obj.has_property(js_string!("status"), context)? {
                obj.get(js_string!("status"), context)?.to_number(context)? as u16
            } else {
                200
            };
            let text_fn = obj.get(js_string!("text"), context)?;
            let body = if let Some(callable) = text_fn.as_callable() {
                let result = callable.call(&value, &[], context)?;
                let result = if let Some(promise) = result.as_promise() {
                    promise.await_blocking(context)?
                } else {
                    result
                };
                result.to_string(context)?.to_std_string_escaped().into_bytes()
            } else {
                Vec::new()
            };
            let mut record = ResponseRecord::html(status_code, body);
            // A handler-supplied `headers` object overrides the forced
            // `text/html` default -- same JSON-round-trip reading
            // `MockResponse::writeHead` uses, since this engine has no
            // confirmed own-keys-enumeration API to walk instead.
            if obj.has_property(js_string!("headers"), context)? {
                let headers_value = obj.get(js_string!("headers"), context)?;
                if headers_value.as_object().is_some() {
                    let json = headers_value.to_json(context)?.to_string();
                    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(&json) {
                        for (name, header_value) in map {
                            let header_value = match header_value {
                                serde_json::Value::String(s) => s,
                                other => other.to_string(),
                            };
                            record.headers.insert(name.to_lowercase(), header_value);
                        }
                    }
                }
            }
            let body_len = record.body.len();
            record.headers.entry("content-length".to_string()).or_insert_with(|| body_len.to_string());
            return Ok(record);
        }
    }

    let text = value.to_string(context)?.to_std_string_escaped();
    Ok(ResponseRecord::html(200, text.into_bytes()))
}
