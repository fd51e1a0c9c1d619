//! The dev server's "Configured options" table (SPEC_FULL.md §6):
//! recognized fields, defaults, and the `NEXT_PUBLIC_`-prefixed env
//! allowlist.

use rustc_hash::FxHashMap;

/// Env keys are only forwarded to the browser if they start with this
/// prefix, mirroring the real framework's client-visibility rule.
pub const PUBLIC_ENV_PREFIX: &str = "NEXT_PUBLIC_";

#[derive(Debug, Clone)]
pub struct DevServerConfig {
    pub pages_dir: String,
    pub app_dir: String,
    pub public_dir: String,
    /// `None` means auto-detect: App-Router wins if `app_dir` exists in
    /// the VFS, otherwise Pages-Router.
    pub prefer_app_router: Option<bool>,
    pub env: FxHashMap<String, String>,
    pub asset_prefix: String,
    pub base_path: String,
    /// Path to a CSS-utility-framework config file; its presence (not its
    /// content -- this emulation does not interpret utility-class rules)
    /// gates whether a runtime config script is injected into the HTML.
    pub css_config_path: Option<String>,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            pages_dir: "/pages".to_string(),
            app_dir: "/app".to_string(),
            public_dir: "/public".to_string(),
            prefer_app_router: None,
            env: FxHashMap::default(),
            asset_prefix: String::new(),
            base_path: String::new(),
            css_config_path: None,
        }
    }
}

impl DevServerConfig {
    /// Returns only the `env` entries visible to client code, in
    /// `NEXT_PUBLIC_`-stripped-or-not (kept as-is, per the real framework's
    /// convention of forwarding the full key) order.
    pub fn public_env(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .env
            .iter()
            .filter(|(k, _)| k.starts_with(PUBLIC_ENV_PREFIX))
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        entries.sort_by_key(|(k, _)| *k);
        entries
    }

    /// Normalizes a prefix field (`assetPrefix`/`basePath`) to a leading
    /// `/` with no trailing `/`, tolerating an already-correct or entirely
    /// absent value.
    pub fn normalized_asset_prefix(&self) -> String {
        normalize_prefix(&self.asset_prefix)
    }

    pub fn normalized_base_path(&self) -> String {
        normalize_prefix(&self.base_path)
    }
}

fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_env_filters_by_prefix_and_sorts() {
        let mut config = DevServerConfig::default();
        config.env.insert("SECRET_KEY".to_string(), "shh".to_string());
        config.env.insert("NEXT_PUBLIC_API_URL".to_string(), "https://api.example".to_string());
        config.env.insert("NEXT_PUBLIC_APP_NAME".to_string(), "demo".to_string());
        assert_eq!(
            config.public_env(),
            vec![
                ("NEXT_PUBLIC_API_URL", "https://api.example"),
                ("NEXT_PUBLIC_APP_NAME", "demo"),
            ]
        );
    }

    #[test]
    fn prefix_normalization_tolerates_missing_or_trailing_slash() {
        let mut config = DevServerConfig::default();
        config.asset_prefix = "cdn/".to_string();
        config.base_path = String::new();
        assert_eq!(config.normalized_asset_prefix(), "/cdn");
        assert_eq!(config.normalized_base_path(), "");
    }
}
