//! CSS-import stripping.
//!
//! A source transform for component files, not a CSS processor: a CSS
//! import has no meaningful JS value, so it is deleted from the module
//! body and recorded for the caller to re-inject as a side-effecting
//! `<link>` (or equivalent `<style>` injection, for the Vite-style
//! server's module form). A default-imported stylesheet (CSS-modules
//! convention, `import styles from './x.module.css'`) keeps its binding
//! alive as an empty object so property access on it (`styles.button`)
//! doesn't throw -- it just never resolves to a real class name here.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static CSS_SIDE_EFFECT_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^\s*import\s+['"]([^'"]+\.css)['"];?\s*$"#).unwrap());

static CSS_DEFAULT_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*import\s+(\w+)\s+from\s+['"]([^'"]+\.css)['"];?\s*$"#).unwrap()
});

/// Strips CSS imports out of `source`, returning the rewritten source and
/// the list of CSS specifiers encountered in import order.
pub fn strip_css_imports(source: &str) -> (String, Vec<String>) {
    let mut specifiers = Vec::new();

    let out = CSS_DEFAULT_IMPORT.replace_all(source, |caps: &Captures<'_>| {
        specifiers.push(caps[2].to_string());
        format!("const {} = {{}};", &caps[1])
    });

    let out = CSS_SIDE_EFFECT_IMPORT.replace_all(&out, |caps: &Captures<'_>| {
        specifiers.push(caps[1].to_string());
        String::new()
    });

    (out.into_owned(), specifiers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_side_effect_css_import() {
        let (out, specs) = strip_css_imports("import './globals.css';\nconsole.log(1);\n");
        assert!(!out.contains("import"));
        assert_eq!(specs, vec!["./globals.css".to_string()]);
    }

    #[test]
    fn default_css_module_import_becomes_empty_object() {
        let (out, specs) = strip_css_imports("import styles from './a.module.css';\nstyles.button;\n");
        assert!(out.contains("const styles = {};"));
        assert_eq!(specs, vec!["./a.module.css".to_string()]);
    }

    #[test]
    fn leaves_non_css_imports_untouched() {
        let (out, specs) = strip_css_imports("import x from './x.js';\n");
        assert!(out.contains("import x from './x.js';"));
        assert!(specs.is_empty());
    }
}
