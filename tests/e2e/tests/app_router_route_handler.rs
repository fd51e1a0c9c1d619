//! Scenario 4: an App-Router `route.ts` exporting a Web-API-shaped `GET`.

use std::rc::Rc;

use playground_devserver::IncomingRequest;
use playground_runtime::{Playground, PlaygroundConfig};
use playground_vfs::LogicalClock;
use rustc_hash::FxHashMap;

#[test]
fn app_router_route_handler_responds_with_a_web_response() {
    let mut playground = Playground::new(Rc::new(LogicalClock::new()), PlaygroundConfig::default()).unwrap();
    playground
        .vfs()
        .write(
            "/app/api/ping/route.ts",
            "export const GET = async () => ({ status: 200, text: function () { return \"pong\"; } });\n",
        )
        .unwrap();
    playground.register_framework_server(3001).unwrap();

    let request = IncomingRequest {
        method: "GET".to_string(),
        url: "/__virtual__/3001/api/ping".to_string(),
        headers: FxHashMap::default(),
        body: None,
    };
    let response = playground.handle_fetch(3001, &request).unwrap();

    assert_eq!(response.status_code, 200);
    assert_eq!(String::from_utf8(response.body).unwrap(), "pong");
}
