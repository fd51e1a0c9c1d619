//! Ties the individual transforms together into the nine-point
//! source-transform pipeline: CSS-import strip, alias resolution,
//! JSX/TS transform, CDN redirect, React-Refresh injection -- behind
//! the content-hash-keyed cache.

use crate::alias::resolve_aliases;
use crate::cache::content_hash;
use crate::cdn::redirect_bare_imports;
use crate::css::strip_css_imports;
use crate::error::{TransformError, TransformResult};
use crate::jsx::{strip_typescript, transform_jsx};
use crate::refresh::inject_react_refresh;
use crate::state::{CachedOutput, TransformState};

pub struct TransformOutput {
    pub code: String,
    pub css_specifiers: Vec<String>,
    pub from_cache: bool,
}

const TRANSFORMABLE_EXTENSIONS: &[&str] = &[".js", ".jsx", ".ts", ".tsx", ".mjs"];

pub fn is_transformable(path: &str) -> bool {
    TRANSFORMABLE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

/// Runs the full pipeline for `source` read from `path`, consulting and
/// populating `state.cache` along the way.
pub fn transform_source(state: &TransformState, path: &str, source: &str) -> TransformResult<TransformOutput> {
    if !is_transformable(path) {
        return Err(TransformError::UnsupportedExtension(path.to_string()));
    }

    let hash = content_hash(source);
    if let Some(cached) = state.cache.get(path, hash) {
        return Ok(TransformOutput {
            code: cached.code,
            css_specifiers: cached.css_specifiers,
            from_cache: true,
        });
    }

    let (stripped, css_specifiers) = strip_css_imports(source);
    let aliased = resolve_aliases(&stripped, &state.alias_config);

    let is_typescript = path.ends_with(".ts") || path.ends_with(".tsx");
    let de_typed = if is_typescript { strip_typescript(&aliased) } else { aliased };

    let (jsx_applied, saw_jsx) = transform_jsx(&de_typed);
    let redirected = redirect_bare_imports(&jsx_applied, &state.cdn_config);

    let is_component_file = saw_jsx || path.ends_with(".jsx") || path.ends_with(".tsx");
    let code = if is_component_file {
        inject_react_refresh(&redirected, path)
    } else {
        redirected
    };

    state.cache.insert(
        path,
        hash,
        CachedOutput {
            code: code.clone(),
            css_specifiers: css_specifiers.clone(),
        },
    );

    Ok(TransformOutput {
        code,
        css_specifiers,
        from_cache: false,
    })
}

#[cfg(test)]
mod tests {
    use crate::alias::AliasConfig;
    use crate::cdn::CdnConfig;
    use crate::state::TransformState;
    use crate::cache::TransformCache;

    use super::*;

    fn state() -> TransformState {
        TransformState {
            alias_config: AliasConfig::new().with_alias("@/", "src"),
            cdn_config: CdnConfig::default(),
            cache: TransformCache::new(16),
        }
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let state = state();
        let err = transform_source(&state, "/styles/a.css", "body {}").unwrap_err();
        assert_eq!(err, TransformError::UnsupportedExtension("/styles/a.css".to_string()));
    }

    #[test]
    fn full_pipeline_strips_css_resolves_alias_and_redirects_cdn() {
        let state = state();
        let source = "import './globals.css';\nimport Button from '@/components/Button';\nimport React from 'react';\nexport default function Home() {\n  return <Button label=\"hi\" />;\n}\n";
        let out = transform_source(&state, "/pages/index.jsx", source).unwrap();
        assert!(!out.from_cache);
        assert_eq!(out.css_specifiers, vec!["./globals.css".to_string()]);
        assert!(out.code.contains("'/src/components/Button'"));
        assert!(out.code.contains("https://esm.sh/react"));
        assert!(out.code.contains("_jsx(Button"));
        assert!(out.code.contains("$RefreshReg$(Home"));
    }

    #[test]
    fn second_call_with_same_content_is_served_from_cache() {
        let state = state();
        let source = "export default function App() { return <div />; }\n";
        let first = transform_source(&state, "/app.jsx", source).unwrap();
        let second = transform_source(&state, "/app.jsx", source).unwrap();
        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(first.code, second.code);
    }

    #[test]
    fn edited_source_misses_the_cache() {
        let state = state();
        transform_source(&state, "/app.jsx", "export default function App() { return <div />; }\n").unwrap();
        let out = transform_source(&state, "/app.jsx", "export default function App() { return <span />; }\n").unwrap();
        assert!(!out.from_cache);
    }

    #[test]
    fn plain_ts_file_is_not_treated_as_a_component_file() {
        let state = state();
        let out = transform_source(&state, "/lib/util.ts", "export function add(a: number, b: number) { return a + b; }\n").unwrap();
        assert!(!out.code.contains("$RefreshReg$"));
        assert!(out.code.contains("function add(a, b)"));
    }
}
