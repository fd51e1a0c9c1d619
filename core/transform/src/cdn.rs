//! Bare npm-import CDN redirection: a specifier that is neither relative
//! (`./`, `../`), absolute (`/`), nor already resolved to the
//! virtual-prefix form is assumed to name an npm package and gets
//! rewritten to load from a CDN instead -- the browser has no
//! `node_modules` to resolve it from.

use crate::specifier::rewrite_specifiers;

#[derive(Debug, Clone)]
pub struct CdnConfig {
    pub base_url: String,
}

impl Default for CdnConfig {
    fn default() -> Self {
        Self {
            base_url: "https://esm.sh/".to_string(),
        }
    }
}

fn is_bare_specifier(specifier: &str) -> bool {
    !(specifier.starts_with('.') || specifier.starts_with('/') || specifier.contains("://"))
}

/// Rewrites every bare npm specifier in `source` to `{base_url}{specifier}`.
pub fn redirect_bare_imports(source: &str, config: &CdnConfig) -> String {
    rewrite_specifiers(source, |specifier| {
        is_bare_specifier(specifier).then(|| format!("{}{specifier}", config.base_url))
    })
}
