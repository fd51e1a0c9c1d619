//! The facade's own configuration surface: a `DevServerConfig` plus the
//! transform-layer and HMR knobs SPEC_FULL.md §6 leaves to the embedding
//! page rather than to any one component.

use playground_devserver::DevServerConfig;
use playground_transform::AliasConfig;

/// Window, in milliseconds, a batched HMR change sits before `flush`
/// drains it -- SPEC_FULL.md §4.7's "~30ms" figure.
pub const DEFAULT_HMR_WINDOW_MS: u64 = 30;

/// Entries held per transform cache before the oldest is evicted.
pub const DEFAULT_TRANSFORM_CACHE_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct PlaygroundConfig {
    pub dev_server: DevServerConfig,
    pub cdn_base_url: String,
    pub alias_config: AliasConfig,
    pub transform_cache_capacity: usize,
    pub hmr_window_ms: u64,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            dev_server: DevServerConfig::default(),
            cdn_base_url: "https://esm.sh/".to_string(),
            alias_config: AliasConfig::new(),
            transform_cache_capacity: DEFAULT_TRANSFORM_CACHE_CAPACITY,
            hmr_window_ms: DEFAULT_HMR_WINDOW_MS,
        }
    }
}
