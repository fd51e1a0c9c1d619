use std::cell::RefCell;
use std::rc::Rc;

use crate::path;

/// The kind of mutation a watcher observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    Change,
    Delete,
}

/// An event delivered to a watch callback. `path` is always the absolute
/// VFS path of the node that changed, even for a recursive watcher rooted
/// higher up the tree.
#[derive(Debug, Clone)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    pub path: String,
}

pub type WatchCallback = Rc<dyn Fn(WatchEvent)>;

struct Subscription {
    id: u64,
    root: String,
    recursive: bool,
    callback: WatchCallback,
}

/// A handle returned by [`crate::Vfs::watch`]. Dropping it does not stop
/// the watcher; call [`WatchHandle::close`] explicitly, mirroring the
/// `{close}` handle the emulated `fs.watch` returns.
pub struct WatchHandle {
    id: u64,
    registry: Rc<RefCell<WatchRegistry>>,
}

impl WatchHandle {
    pub fn close(self) {
        self.registry.borrow_mut().remove(self.id);
    }
}

#[derive(Default)]
pub struct WatchRegistry {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        self_rc: &Rc<RefCell<Self>>,
        root: &str,
        recursive: bool,
        callback: WatchCallback,
    ) -> WatchHandle {
        let id = {
            let mut this = self_rc.borrow_mut();
            let id = this.next_id;
            this.next_id += 1;
            this.subscriptions.push(Subscription {
                id,
                root: path::normalize(root),
                recursive,
                callback,
            });
            id
        };
        WatchHandle {
            id,
            registry: self_rc.clone(),
        }
    }

    fn remove(&mut self, id: u64) {
        self.subscriptions.retain(|s| s.id != id);
    }

    /// Notify every subscriber whose root matches `changed_path`.
    ///
    /// Emission iterates a snapshot of the subscriber list so that a
    /// callback which re-enters the VFS (e.g. writes another file) cannot
    /// corrupt the iteration or be notified of its own mutation mid-loop.
    pub fn emit(&self, changed_path: &str, kind: WatchEventKind) {
        let snapshot: Vec<(WatchCallback, bool)> = self
            .subscriptions
            .iter()
            .filter(|s| matches(s, changed_path))
            .map(|s| (s.callback.clone(), true))
            .collect();
        for (callback, _) in snapshot {
            callback(WatchEvent {
                kind,
                path: changed_path.to_string(),
            });
        }
    }
}

fn matches(sub: &Subscription, changed_path: &str) -> bool {
    if sub.root == changed_path {
        return true;
    }
    if sub.recursive {
        return path::starts_with(changed_path, &sub.root);
    }
    // Non-recursive watchers also observe direct children being
    // added/removed/renamed, matching `fs.watch` on a directory.
    path::dirname(changed_path) == sub.root
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell as StdRefCell;

    #[test]
    fn recursive_watcher_sees_descendants() {
        let registry = Rc::new(RefCell::new(WatchRegistry::new()));
        let seen = Rc::new(StdRefCell::new(Vec::new()));
        let seen2 = seen.clone();
        let _handle = WatchRegistry::subscribe(
            &registry,
            "/src",
            true,
            Rc::new(move |ev| seen2.borrow_mut().push(ev.path)),
        );
        registry
            .borrow()
            .emit("/src/components/a.js", WatchEventKind::Change);
        registry.borrow().emit("/other/a.js", WatchEventKind::Change);
        assert_eq!(seen.borrow().as_slice(), ["/src/components/a.js"]);
    }

    #[test]
    fn non_recursive_watcher_is_scoped_to_direct_children() {
        let registry = Rc::new(RefCell::new(WatchRegistry::new()));
        let seen = Rc::new(StdRefCell::new(Vec::new()));
        let seen2 = seen.clone();
        let _handle = WatchRegistry::subscribe(
            &registry,
            "/src",
            false,
            Rc::new(move |ev| seen2.borrow_mut().push(ev.path)),
        );
        registry.borrow().emit("/src/a.js", WatchEventKind::Change);
        registry
            .borrow()
            .emit("/src/nested/a.js", WatchEventKind::Change);
        assert_eq!(seen.borrow().as_slice(), ["/src/a.js"]);
    }

    #[test]
    fn close_stops_future_notifications() {
        let registry = Rc::new(RefCell::new(WatchRegistry::new()));
        let seen = Rc::new(StdRefCell::new(0usize));
        let seen2 = seen.clone();
        let handle = WatchRegistry::subscribe(
            &registry,
            "/",
            true,
            Rc::new(move |_| *seen2.borrow_mut() += 1),
        );
        registry.borrow().emit("/a.js", WatchEventKind::Change);
        handle.close();
        registry.borrow().emit("/a.js", WatchEventKind::Change);
        assert_eq!(*seen.borrow(), 1);
    }
}
