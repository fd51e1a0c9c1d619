//! Scenario 3: a Pages-Router `pages/api` handler using the Node-style
//! `(req, res)` calling convention.

use std::rc::Rc;

use playground_devserver::IncomingRequest;
use playground_runtime::{Playground, PlaygroundConfig};
use playground_vfs::LogicalClock;
use rustc_hash::FxHashMap;

#[test]
fn api_handler_responds_with_json() {
    let mut playground = Playground::new(Rc::new(LogicalClock::new()), PlaygroundConfig::default()).unwrap();
    playground
        .vfs()
        .write("/pages/api/hello.js", "module.exports = (req, res) => res.status(200).json({ ok: true });\n")
        .unwrap();
    playground.register_framework_server(3001).unwrap();

    let request = IncomingRequest {
        method: "GET".to_string(),
        url: "/__virtual__/3001/api/hello".to_string(),
        headers: FxHashMap::default(),
        body: None,
    };
    let response = playground.handle_fetch(3001, &request).unwrap();

    assert_eq!(response.status_code, 200);
    assert_eq!(response.headers.get("content-type").unwrap(), "application/json; charset=utf-8");
    assert_eq!(response.body, br#"{"ok":true}"#);
}
