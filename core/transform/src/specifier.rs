//! Shared regex machinery for rewriting the specifier string inside an
//! `import`/`export ... from`/dynamic-`import()` statement, leaving the
//! rest of the statement untouched. Both [`crate::alias`] and [`crate::cdn`]
//! are "replace this one string" transforms, so they share this helper
//! instead of each carrying a near-identical set of regexes.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static IMPORT_FROM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^(\s*import\s+(?:[^'";]+?\s+from\s+)?)(['"])([^'"]+)['"](;?\s*)$"#).unwrap());

static EXPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^(\s*export\s+(?:\*(?:\s+as\s+\w+)?|\{[^}]*\})\s+from\s+)(['"])([^'"]+)['"](;?\s*)$"#).unwrap()
});

static DYNAMIC_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(import\(\s*)(['"])([^'"]+)['"](\s*\))"#).unwrap());

/// Rewrites every import/re-export/dynamic-import specifier in `source`
/// for which `resolve` returns `Some(new_specifier)`. Specifiers `resolve`
/// declines (returns `None` for) are left exactly as written. The quote
/// character the statement was already using (`'` or `"`) is preserved.
pub fn rewrite_specifiers(source: &str, resolve: impl Fn(&str) -> Option<String>) -> String {
    let apply = |text: &str, re: &Regex| -> String {
        re.replace_all(text, |caps: &Captures<'_>| match resolve(&caps[3]) {
            Some(replacement) => format!("{}{}{replacement}{}{}", &caps[1], &caps[2], &caps[2], &caps[4]),
            None => caps[0].to_string(),
        })
        .into_owned()
    };

    let out = apply(source, &IMPORT_FROM);
    let out = apply(&out, &EXPORT_FROM);
    apply(&out, &DYNAMIC_IMPORT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_import_from_specifier_only() {
        let out = rewrite_specifiers("import { a } from 'old';\n", |s| {
            (s == "old").then(|| "new".to_string())
        });
        assert_eq!(out, "import { a } from 'new';\n");
    }

    #[test]
    fn leaves_unresolved_specifiers_untouched() {
        let out = rewrite_specifiers("import x from './local.js';\n", |_| None);
        assert_eq!(out, "import x from './local.js';\n");
    }

    #[test]
    fn rewrites_dynamic_import_literal() {
        let out = rewrite_specifiers("const m = await import('old');", |s| {
            (s == "old").then(|| "new".to_string())
        });
        assert_eq!(out, "const m = await import('new');");
    }

    #[test]
    fn rewrites_re_export_from() {
        let out = rewrite_specifiers("export * from 'old';\n", |s| (s == "old").then(|| "new".to_string()));
        assert_eq!(out, "export * from 'new';\n");
    }
}
