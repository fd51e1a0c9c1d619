//! Scenario 1: a static home page served through the framework dev server.

use std::rc::Rc;

use playground_devserver::IncomingRequest;
use playground_runtime::{Playground, PlaygroundConfig};
use playground_vfs::LogicalClock;
use rustc_hash::FxHashMap;

#[test]
fn static_home_page_round_trips_through_the_framework_server() {
    let mut playground = Playground::new(Rc::new(LogicalClock::new()), PlaygroundConfig::default()).unwrap();
    playground
        .vfs()
        .write(
            "/pages/index.jsx",
            "export default function Home() { return React.createElement('h1', null, 'hi'); }\n",
        )
        .unwrap();
    playground.register_framework_server(3001).unwrap();

    let request = IncomingRequest {
        method: "GET".to_string(),
        url: "/__virtual__/3001/".to_string(),
        headers: FxHashMap::default(),
        body: None,
    };
    let response = playground.handle_fetch(3001, &request).unwrap();

    assert_eq!(response.status_code, 200);
    assert_eq!(response.headers.get("content-type").unwrap(), "text/html; charset=utf-8");
    let body = String::from_utf8(response.body).unwrap();
    assert!(body.contains("<div id=\"__next\">"), "body did not mount the app root: {body}");
    assert!(body.contains("pages/index.jsx"), "body did not reference the page module: {body}");
}
