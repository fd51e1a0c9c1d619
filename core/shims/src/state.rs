//! Shared, per-`Playground`-instance state the native shim functions close
//! over via `ContextData`.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use playground_vfs::Vfs;

/// Backs the `fs`, `process`, and `crypto`/`zlib` shims. One instance is
/// installed into each `boa_engine::Context` via `context.insert_data`.
pub struct ShimState {
    pub vfs: Vfs,
    pub cwd: RefCell<String>,
    pub env: BTreeMap<String, String>,
}

impl ShimState {
    pub fn new(vfs: Vfs, env: BTreeMap<String, String>) -> Rc<Self> {
        Rc::new(Self {
            vfs,
            cwd: RefCell::new("/".to_string()),
            env,
        })
    }
}
