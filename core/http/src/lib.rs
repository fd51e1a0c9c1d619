//! The in-page HTTP model: [`ResponseRecord`]/mock request-response
//! objects, the port-keyed [`ServerRegistry`], and handler dispatch for
//! both the Node-style (`(req, res)`) and Web-API-style (`(request,
//! ctx)`) calling conventions framework handlers use.

mod dispatch;
mod error;
mod registry;
mod request;
mod response;

pub use dispatch::{dispatch_node_style, dispatch_web_style};
pub use error::{HttpError, HttpResult};
pub use registry::{RegistryEvent, ServerRegistry, VirtualServer};
pub use request::MockRequest;
pub use response::{response_from_returned_value, status_text, MockResponse, ResponseRecord};

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use boa_engine::{js_string, Context, JsValue, Source};
    use rustc_hash::FxHashMap;

    use super::*;

    #[test]
    fn node_style_handler_produces_response_record() {
        let mut context = Context::default();
        let handler = context
            .eval(Source::from_bytes(
                b"(function (req, res) { res.status(200).json({ ok: true, method: req.method }); })",
            ))
            .unwrap();
        let registry = ServerRegistry::new();
        registry.register(3001, handler).unwrap();
        let server = registry.get(3001).unwrap();

        let request = MockRequest {
            method: "GET".to_string(),
            url: "/api/hello".to_string(),
            headers: FxHashMap::default(),
            body: None,
        };
        let record = dispatch_node_style(&mut context, &server, &request).unwrap();
        assert_eq!(record.status_code, 200);
        assert_eq!(
            record.headers.get("content-type").unwrap(),
            "application/json; charset=utf-8"
        );
        assert_eq!(record.body, br#"{"method":"GET","ok":true}"#);
    }

    #[test]
    fn handler_that_never_calls_end_times_out() {
        let mut context = Context::default();
        let handler = context
            .eval(Source::from_bytes(b"(function (req, res) { /* never responds */ })"))
            .unwrap();
        let registry = ServerRegistry::new();
        registry.register(3002, handler).unwrap();
        let server = registry.get(3002).unwrap();

        let request = MockRequest {
            method: "GET".to_string(),
            url: "/stuck".to_string(),
            headers: FxHashMap::default(),
            body: None,
        };
        let err = dispatch_node_style(&mut context, &server, &request).unwrap_err();
        assert_eq!(err, HttpError::Timeout("/stuck".to_string()));
    }

    #[test]
    fn web_style_handler_returns_response_record() {
        let mut context = Context::default();
        let handler = context
            .eval(Source::from_bytes(
                b"(async function GET() { return new Response('pong', { status: 200 }); })",
            ));
        // `Response` is a Web-API global the host environment would supply;
        // this engine alone doesn't define it, so fall back to a plain
        // object shape the conversion also accepts when `Response` is absent.
        let handler = match handler {
            Ok(value) => value,
            Err(_) => context
                .eval(Source::from_bytes(
                    b"(async function GET() { return { status: 200, text: function(){ return 'pong'; } }; })",
                ))
                .unwrap(),
        };
        let params = JsValue::undefined();
        let request_js = js_string!("unused").into();
        let record = dispatch_web_style(&mut context, &handler, request_js, params).unwrap();
        assert_eq!(record.status_code, 200);
        assert_eq!(record.body, b"pong");
    }

    #[test]
    fn response_from_returned_value_preserves_a_handler_supplied_headers_object() {
        let mut context = Context::default();
        let handler = context
            .eval(Source::from_bytes(
                b"(function () { return { status: 201, headers: { 'content-type': 'application/json; charset=utf-8' }, text: function () { return '{}'; } }; })",
            ))
            .unwrap();
        let result = handler.as_callable().unwrap().call(&JsValue::undefined(), &[], &mut context).unwrap();
        let record = response_from_returned_value(&mut context, &result).unwrap();
        assert_eq!(record.status_code, 201);
        assert_eq!(record.headers.get("content-type").unwrap(), "application/json; charset=utf-8");
    }

    #[test]
    fn response_record_validates_content_length() {
        let mut headers = FxHashMap::default();
        headers.insert("content-length".to_string(), "3".to_string());
        let record = ResponseRecord {
            status_code: 200,
            status_message: "OK".to_string(),
            headers,
            body: b"abcdef".to_vec(),
        };
        assert!(record.validate().is_err());
    }

    #[test]
    fn registry_notifies_subscribers_on_register() {
        let registry = ServerRegistry::new();
        let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        registry.subscribe(move |event| seen_clone.borrow_mut().push(event));
        registry.register(4000, JsValue::undefined()).unwrap();
        assert_eq!(*seen.borrow(), vec![RegistryEvent::Registered(4000)]);
    }
}
