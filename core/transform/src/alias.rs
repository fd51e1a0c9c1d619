//! Path-alias resolution: rewrites a configured alias prefix (`@/`,
//! `~/`, ...) to the virtual-prefix absolute form the browser's import
//! map and the service-worker bridge expect (`/__virtual__/<port>/...`).

use rustc_hash::FxHashMap;

use crate::specifier::rewrite_specifiers;

/// `prefix -> target directory`, both relative to the project root
/// without a leading/trailing slash on the target (e.g. `@/` -> `src`).
#[derive(Debug, Clone, Default)]
pub struct AliasConfig {
    aliases: FxHashMap<String, String>,
}

impl AliasConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alias(mut self, prefix: impl Into<String>, target_dir: impl Into<String>) -> Self {
        self.aliases.insert(prefix.into(), target_dir.into());
        self
    }

    fn resolve(&self, specifier: &str) -> Option<String> {
        let (prefix, target) = self
            .aliases
            .iter()
            .filter(|(prefix, _)| specifier.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())?;
        let rest = &specifier[prefix.len()..];
        let rest = rest.trim_start_matches('/');
        if rest.is_empty() {
            Some(format!("/{target}"))
        } else {
            Some(format!("/{target}/{rest}"))
        }
    }
}

/// Rewrites every aliased import specifier in `source` to its
/// virtual-prefix absolute form. Specifiers matching no configured alias
/// are left untouched (relative imports, bare npm specifiers -- the
/// latter handled separately by [`crate::cdn`]).
pub fn resolve_aliases(source: &str, config: &AliasConfig) -> String {
    rewrite_specifiers(source, |specifier| config.resolve(specifier))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_aliased_specifier_to_absolute_path() {
        let config = AliasConfig::new().with_alias("@/", "src");
        let out = resolve_aliases("import Foo from '@/components/Foo';\n", &config);
        assert!(out.contains("'/src/components/Foo'"));
    }

    #[test]
    fn longest_matching_prefix_wins() {
        let config = AliasConfig::new()
            .with_alias("@/", "src")
            .with_alias("@/ui/", "src/design-system");
        let out = resolve_aliases("import Button from '@/ui/Button';\n", &config);
        assert!(out.contains("'/src/design-system/Button'"));
    }

    #[test]
    fn unaliased_specifier_is_left_alone() {
        let config = AliasConfig::new().with_alias("@/", "src");
        let out = resolve_aliases("import x from './local.js';\n", &config);
        assert!(out.contains("'./local.js'"));
    }
}
