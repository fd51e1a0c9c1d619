//! Scenario 2: a dynamic `[id]` route plus its `/_next/route-info` companion.

use std::rc::Rc;

use playground_devserver::IncomingRequest;
use playground_runtime::{Playground, PlaygroundConfig};
use playground_vfs::LogicalClock;
use rustc_hash::FxHashMap;

#[test]
fn dynamic_route_resolves_params_and_route_info_agrees() {
    let mut playground = Playground::new(Rc::new(LogicalClock::new()), PlaygroundConfig::default()).unwrap();
    playground.vfs().write("/pages/users/[id].jsx", "export default function User() { return null; }\n").unwrap();
    playground.register_framework_server(3001).unwrap();

    let page_request = IncomingRequest {
        method: "GET".to_string(),
        url: "/__virtual__/3001/users/7".to_string(),
        headers: FxHashMap::default(),
        body: None,
    };
    let page_response = playground.handle_fetch(3001, &page_request).unwrap();
    assert_eq!(page_response.status_code, 200);
    let body = String::from_utf8(page_response.body).unwrap();
    assert!(body.contains("users/[id].jsx"), "body did not reference the dynamic route module: {body}");

    let route_info_request = IncomingRequest {
        method: "GET".to_string(),
        url: "/__virtual__/3001/_next/route-info?pathname=/users/7".to_string(),
        headers: FxHashMap::default(),
        body: None,
    };
    let route_info = playground.handle_fetch(3001, &route_info_request).unwrap();
    assert_eq!(route_info.status_code, 200);
    let json: serde_json::Value = serde_json::from_slice(&route_info.body).unwrap();
    assert_eq!(json["found"], true);
    assert_eq!(json["params"]["id"], "7");
}
