//! Scenario 6: a sandboxed iframe's `fetch` tunneled through the
//! service-worker bridge to a registered server, plus the forced
//! cross-origin isolation headers the generated worker script applies.

use std::rc::Rc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use playground_runtime::{Playground, PlaygroundConfig};
use playground_sw_bridge::{render_worker_script, SwRequestEnvelope, VIRTUAL_PREFIX};
use playground_vfs::LogicalClock;
use rustc_hash::FxHashMap;

#[test]
fn sw_bridge_dispatches_and_base64_encodes_the_body() {
    let mut playground = Playground::new(Rc::new(LogicalClock::new()), PlaygroundConfig::default()).unwrap();
    playground
        .vfs()
        .write("/pages/api/hello.js", "module.exports = (req, res) => res.status(200).json({ ok: true });\n")
        .unwrap();
    playground.register_framework_server(3001).unwrap();

    let envelope = SwRequestEnvelope {
        id: 1,
        port: 3001,
        method: "GET".to_string(),
        url: "/__virtual__/3001/api/hello".to_string(),
        headers: FxHashMap::default(),
        body: None,
    };
    let data = playground.dispatch_sw_request(&envelope).unwrap();

    assert_eq!(data.status_code, 200);
    assert_eq!(data.headers.get("content-type").unwrap(), "application/json; charset=utf-8");
    assert_eq!(BASE64.decode(&data.body_base64).unwrap(), br#"{"ok":true}"#);
}

#[test]
fn worker_script_forces_cross_origin_isolation_headers() {
    let script = render_worker_script(VIRTUAL_PREFIX);

    assert!(script.contains(r#"out.set("Cross-Origin-Embedder-Policy", "credentialless")"#));
    assert!(script.contains(r#"out.set("Cross-Origin-Opener-Policy", "same-origin")"#));
    assert!(script.contains(r#"out.set("Cross-Origin-Resource-Policy", "cross-origin")"#));
    assert!(script.contains(r#"out.delete("X-Frame-Options")"#));
}
