//! Idempotent one-shot transform-layer initialization.

use std::cell::RefCell;
use std::rc::Rc;

use crate::alias::AliasConfig;
use crate::cache::TransformCache;
use crate::cdn::CdnConfig;

/// A cached transform result: the rewritten code plus the CSS
/// specifiers it stripped out (the dev server re-injects these as
/// `<link>`/`<style>` regardless of whether the code itself came from
/// cache).
#[derive(Clone)]
pub struct CachedOutput {
    pub code: String,
    pub css_specifiers: Vec<String>,
}

pub struct TransformState {
    pub alias_config: AliasConfig,
    pub cdn_config: CdnConfig,
    pub cache: TransformCache<CachedOutput>,
}

/// Coalesces concurrent initialization the way the real on-demand JS
/// transformer is described as doing it: a single well-known slot that
/// the first caller populates, with every later caller (re-entrant or
/// not -- there is no real concurrency here to race) handed back the
/// same `Rc<RefCell<TransformState>>` rather than rebuilding it.
#[derive(Default)]
pub struct TransformLayer {
    state: RefCell<Option<Rc<RefCell<TransformState>>>>,
}

impl TransformLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure_initialized(
        &self,
        alias_config: AliasConfig,
        cdn_config: CdnConfig,
        cache_capacity: usize,
    ) -> Rc<RefCell<TransformState>> {
        if let Some(existing) = self.state.borrow().as_ref() {
            return existing.clone();
        }
        let state = Rc::new(RefCell::new(TransformState {
            alias_config,
            cdn_config,
            cache: TransformCache::new(cache_capacity),
        }));
        *self.state.borrow_mut() = Some(state.clone());
        state
    }

    pub fn is_initialized(&self) -> bool {
        self.state.borrow().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_call_reuses_the_first_state() {
        let layer = TransformLayer::new();
        let first = layer.ensure_initialized(AliasConfig::new().with_alias("@/", "src"), CdnConfig::default(), 64);
        let second = layer.ensure_initialized(AliasConfig::new(), CdnConfig::default(), 1);
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(second.borrow().cache.len(), 0);
    }

    #[test]
    fn not_initialized_until_first_call() {
        let layer = TransformLayer::new();
        assert!(!layer.is_initialized());
        layer.ensure_initialized(AliasConfig::new(), CdnConfig::default(), 8);
        assert!(layer.is_initialized());
    }
}
