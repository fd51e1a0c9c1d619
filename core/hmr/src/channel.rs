//! Batches classified changes behind a ~30ms window and hands back
//! [`HmrMessage`]s ready to post. The window itself is a real timer on the
//! host page (a `setInterval` calling [`HmrChannel::flush`] periodically) --
//! this engine has no real timers, so the Rust side only tracks
//! first-seen timestamps and lets the caller decide when "ready" is.

use std::cell::RefCell;
use std::rc::Rc;

use playground_vfs::{Clock, Vfs, WatchHandle};
use rustc_hash::FxHashMap;

use crate::classify::classify_change;
use crate::message::HmrMessage;

pub struct HmrChannel {
    channel_tag: String,
    clock: Rc<dyn Clock>,
    pending: RefCell<FxHashMap<String, (crate::classify::HmrUpdateKind, u64)>>,
}

impl HmrChannel {
    pub fn new(channel_tag: impl Into<String>, clock: Rc<dyn Clock>) -> Rc<Self> {
        Rc::new(Self { channel_tag: channel_tag.into(), clock, pending: RefCell::new(FxHashMap::default()) })
    }

    /// Subscribes to [`playground_vfs::Vfs::watch`] on `root`, classifying
    /// and recording every observed mutation. Mirrors
    /// [`playground_sw_bridge::subscribe_lifecycle`]'s shape: this crate
    /// only accumulates; delivering the flushed messages to an actual
    /// iframe window is the host's job.
    pub fn watch(self: &Rc<Self>, vfs: &Vfs, root: &str, recursive: bool) -> WatchHandle {
        let this = Rc::clone(self);
        vfs.watch(root, recursive, Rc::new(move |event| this.record_change(&event.path)))
    }

    fn record_change(&self, path: &str) {
        let kind = classify_change(path);
        let now = self.clock.now_ms();
        let mut pending = self.pending.borrow_mut();
        pending
            .entry(path.to_string())
            .and_modify(|(existing_kind, _)| *existing_kind = existing_kind.escalate(kind))
            .or_insert((kind, now));
    }

    /// Drains entries whose first-seen timestamp is at least `window_ms`
    /// old, in arbitrary order -- the spec only requires ordering within a
    /// single server's correlated request/response pairs (§5), not across
    /// HMR messages.
    pub fn flush(&self, window_ms: u64) -> Vec<HmrMessage> {
        let now = self.clock.now_ms();
        let mut pending = self.pending.borrow_mut();
        let ready: Vec<(String, crate::classify::HmrUpdateKind, u64)> = pending
            .iter()
            .filter(|(_, (_, first_seen))| now.saturating_sub(*first_seen) >= window_ms)
            .map(|(path, (kind, _))| (path.clone(), *kind, now))
            .collect();
        for (path, _, _) in &ready {
            pending.remove(path);
        }
        ready.into_iter().map(|(path, kind, ts)| HmrMessage::new(self.channel_tag.clone(), kind, path, ts)).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }
}
