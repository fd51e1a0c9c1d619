//! Scenario 5: editing a watched page pushes one HMR update message.

use std::rc::Rc;

use playground_devserver::FRAMEWORK_CHANNEL_TAG;
use playground_hmr::HmrMessageKind;
use playground_runtime::{Playground, PlaygroundConfig};
use playground_vfs::LogicalClock;

#[test]
fn editing_a_watched_page_flushes_one_update_message() {
    let mut config = PlaygroundConfig::default();
    config.hmr_window_ms = 0;
    let mut playground = Playground::new(Rc::new(LogicalClock::new()), config).unwrap();
    playground.vfs().write("/pages/index.jsx", "export default function Home() { return null; }\n").unwrap();
    playground.register_framework_server(3001).unwrap();

    playground.vfs().write("/pages/index.jsx", "export default function Home() { return 1; }\n").unwrap();

    let messages = playground.flush_hmr(FRAMEWORK_CHANNEL_TAG);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].path, "/pages/index.jsx");
    assert_eq!(messages[0].kind, HmrMessageKind::Update);

    assert!(playground.flush_hmr(FRAMEWORK_CHANNEL_TAG).is_empty());
}
