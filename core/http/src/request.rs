//! The mock `req` object passed to API/route handlers: a plain data view
//! over method, URL, headers, and an optional body -- nothing here needs
//! to be callable, so it's a plain property object rather than a closure
//! bundle like [`crate::response::MockResponse`].

use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::{js_string, Context, JsResult, JsValue};
use rustc_hash::FxHashMap;

/// One in-flight request as seen by a server's handler.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: String,
    pub url: String,
    pub headers: FxHashMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl MockRequest {
    pub fn to_js(&self, context: &mut Context) -> JsResult<JsValue> {
        let attribute = Attribute::default();
        let headers_obj = {
            let mut init = ObjectInitializer::new(context);
            for (name, value) in &self.headers {
                init = init.property(js_string!(name.clone()), js_string!(value.clone()), attribute);
            }
            init.build()
        };
        let body_value = match &self.body {
            Some(bytes) => JsValue::from(js_string!(String::from_utf8_lossy(bytes).into_owned())),
            None => JsValue::undefined(),
        };
        let obj = ObjectInitializer::new(context)
            .property(js_string!("method"), js_string!(self.method.clone()), attribute)
            .property(js_string!("url"), js_string!(self.url.clone()), attribute)
            .property(js_string!("headers"), headers_obj, attribute)
            .property(js_string!("body"), body_value, attribute)
            .build();
        Ok(JsValue::from(obj))
    }
}
