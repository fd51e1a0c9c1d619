//! The one piece of genuine wall-clock reading in the whole workspace --
//! everywhere else takes a [`Clock`] so it stays deterministic and testable.

use playground_vfs::Clock;

/// Backs `Vfs`/`HmrChannel` timestamps with the browser's monotonic clock.
pub struct PerformanceClock {
    performance: web_sys::Performance,
}

impl PerformanceClock {
    pub fn new() -> Option<Self> {
        let window = web_sys::window()?;
        let performance = window.performance()?;
        Some(Self { performance })
    }
}

impl Clock for PerformanceClock {
    fn now_ms(&self) -> u64 {
        self.performance.now() as u64
    }
}
