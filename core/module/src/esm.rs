//! Lightweight ESM-to-CJS rewriting.
//!
//! This is a best-effort textual rewrite, not a parser: it uses regular
//! expressions to recognize the common import/export forms and dynamic
//! `import()`/`import.meta` usages. It will misfire inside string and
//! comment bodies that happen to contain matching text -- that is a known
//! limitation of the approach, not a bug to be "fixed" with a full parser
//! here (see the design notes on why a regex was chosen over a parser).

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use playground_vfs::path;

static IMPORT_DEFAULT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^\s*import\s+(\w+)\s+from\s+['"]([^'"]+)['"];?"#).unwrap());

static IMPORT_NAMESPACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*import\s+\*\s+as\s+(\w+)\s+from\s+['"]([^'"]+)['"];?"#).unwrap()
});

static IMPORT_DEFAULT_AND_NAMED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*import\s+(\w+)\s*,\s*\{([^}]*)\}\s+from\s+['"]([^'"]+)['"];?"#).unwrap()
});

static IMPORT_NAMED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*import\s+\{([^}]*)\}\s+from\s+['"]([^'"]+)['"];?"#).unwrap()
});

static IMPORT_SIDE_EFFECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^\s*import\s+['"]([^'"]+)['"];?"#).unwrap());

static EXPORT_DEFAULT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*export\s+default\s+").unwrap());

static EXPORT_NAMED_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*export\s+\{([^}]*)\}\s*;?\s*$").unwrap());

static EXPORT_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*export\s+(const|let|var)\s+([a-zA-Z_$][\w$]*)").unwrap()
});

static EXPORT_FUNCTION_OR_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*export\s+(async\s+function\*?|function\*?|class)\s+([a-zA-Z_$][\w$]*)")
        .unwrap()
});

static DYNAMIC_IMPORT_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^\w$.])import\s*\(").unwrap());

static IMPORT_META_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"import\.meta\.url").unwrap());
static IMPORT_META_DIRNAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"import\.meta\.dirname").unwrap());
static IMPORT_META_FILENAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"import\.meta\.filename").unwrap());

/// Heuristically decides whether `source` needs the ESM-to-CJS rewrite:
/// already-compiled CJS bundles are detected by a `"use strict"` prologue
/// followed by a variable declaration, a common bundler fingerprint.
pub fn needs_esm_rewrite(source: &str, filename: &str) -> bool {
    let trimmed = source.trim_start();
    let looks_compiled = trimmed.starts_with("\"use strict\"") || trimmed.starts_with("'use strict'");
    if looks_compiled {
        let after_prologue = trimmed
            .trim_start_matches('"')
            .trim_start_matches('\'')
            .trim_start_matches("use strict")
            .trim_start_matches('"')
            .trim_start_matches('\'')
            .trim_start_matches(';')
            .trim_start();
        if after_prologue.starts_with("var ")
            || after_prologue.starts_with("const ")
            || after_prologue.starts_with("let ")
        {
            return false;
        }
    }
    let is_esm_path = filename.ends_with(".mjs") || filename.contains("/esm/");
    is_esm_path || has_esm_syntax(source)
}

fn has_esm_syntax(source: &str) -> bool {
    IMPORT_DEFAULT.is_match(source)
        || IMPORT_NAMESPACE.is_match(source)
        || IMPORT_NAMED.is_match(source)
        || IMPORT_SIDE_EFFECT.is_match(source)
        || EXPORT_DEFAULT.is_match(source)
        || EXPORT_NAMED_LIST.is_match(source)
        || EXPORT_DECLARATION.is_match(source)
        || EXPORT_FUNCTION_OR_CLASS.is_match(source)
}

/// Rewrites ESM import/export syntax to CommonJS. Returns the rewritten
/// source and whether any `export` form was seen (used to decide whether
/// to install the `__esModule` marker).
pub fn rewrite_to_cjs(source: &str) -> (String, bool) {
    let mut out = source.to_string();
    let mut has_exports = false;

    out = IMPORT_DEFAULT_AND_NAMED
        .replace_all(&out, |caps: &Captures<'_>| {
            let default_name = &caps[1];
            let named = named_import_bindings(&caps[2]);
            format!(
                "const {{default: {default_name}, {named}}} = __interopRequireDefault(require(\"{}\"));",
                &caps[3]
            )
        })
        .into_owned();

    out = IMPORT_NAMESPACE
        .replace_all(&out, |caps: &Captures<'_>| {
            format!("const {} = require(\"{}\");", &caps[1], &caps[2])
        })
        .into_owned();

    out = IMPORT_NAMED
        .replace_all(&out, |caps: &Captures<'_>| {
            format!(
                "const {{{}}} = require(\"{}\");",
                named_import_bindings(&caps[1]),
                &caps[2]
            )
        })
        .into_owned();

    out = IMPORT_DEFAULT
        .replace_all(&out, |caps: &Captures<'_>| {
            format!(
                "const {} = __interopRequireDefault(require(\"{}\")).default;",
                &caps[1], &caps[2]
            )
        })
        .into_owned();

    out = IMPORT_SIDE_EFFECT
        .replace_all(&out, |caps: &Captures<'_>| format!("require(\"{}\");", &caps[1]))
        .into_owned();

    out = EXPORT_DEFAULT
        .replace_all(&out, |_: &Captures<'_>| {
            has_exports = true;
            "module.exports = module.exports.default = "
        })
        .into_owned();

    out = EXPORT_NAMED_LIST
        .replace_all(&out, |caps: &Captures<'_>| {
            has_exports = true;
            export_named_list(&caps[1])
        })
        .into_owned();

    out = EXPORT_DECLARATION
        .replace_all(&out, |caps: &Captures<'_>| {
            has_exports = true;
            format!(
                "{} {}",
                &caps[1], &caps[2],
            )
        })
        .into_owned();
    // The declaration keyword/name replacement above strips `export ` but
    // still needs the trailing assignment appended once the statement's
    // declared name is known; re-scan for names and append at file end.
    let declared_names = EXPORT_DECLARATION
        .captures_iter(source)
        .map(|c| c[2].to_string())
        .collect::<Vec<_>>();
    for name in &declared_names {
        has_exports = true;
        out.push_str(&format!("\nmodule.exports.{name} = {name};"));
    }

    out = EXPORT_FUNCTION_OR_CLASS
        .replace_all(&out, |caps: &Captures<'_>| {
            has_exports = true;
            format!("{} {}", &caps[1], &caps[2])
        })
        .into_owned();
    for caps in EXPORT_FUNCTION_OR_CLASS.captures_iter(source) {
        let name = &caps[2];
        out.push_str(&format!("\nmodule.exports.{name} = {name};"));
    }

    if has_exports {
        out.push_str("\nObject.defineProperty(module.exports, \"__esModule\", { value: true });");
    }

    (out, has_exports)
}

fn named_import_bindings(clause: &str) -> String {
    clause
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|binding| binding.replacen(" as ", ": ", 1))
        .collect::<Vec<_>>()
        .join(", ")
}

fn export_named_list(clause: &str) -> String {
    clause
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|binding| match binding.split_once(" as ") {
            Some((local, exported)) => format!("module.exports.{exported} = {local};"),
            None => format!("module.exports.{binding} = {binding};"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rewrites bare `import(...)` calls to `__dynamicImport(...)`, taking care
/// not to match a preceding identifier character or `$` (so `foo.import(`
/// and `reimport(` are left untouched).
pub fn rewrite_dynamic_import(source: &str) -> String {
    DYNAMIC_IMPORT_CALL
        .replace_all(source, |caps: &Captures<'_>| {
            format!("{}__dynamicImport(", &caps[1])
        })
        .into_owned()
}

/// Rewrites `import.meta.{url,dirname,filename}` into string literals
/// derived from `filename`.
pub fn rewrite_import_meta(source: &str, filename: &str) -> String {
    let url = format!("file://{filename}");
    let dirname = path::dirname(filename);
    let out = IMPORT_META_URL.replace_all(source, json_string_literal(&url).as_str());
    let out = IMPORT_META_DIRNAME.replace_all(&out, json_string_literal(&dirname).as_str());
    IMPORT_META_FILENAME
        .replace_all(&out, json_string_literal(filename).as_str())
        .into_owned()
}

fn json_string_literal(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_esm_syntax_but_not_compiled_cjs() {
        assert!(needs_esm_rewrite("export default function() {}", "/a.js"));
        assert!(needs_esm_rewrite("import x from 'y';", "/a.js"));
        assert!(!needs_esm_rewrite(
            "\"use strict\";\nvar x = require('y');",
            "/a.js"
        ));
    }

    #[test]
    fn mjs_path_is_treated_as_esm_even_without_syntax_match() {
        assert!(needs_esm_rewrite("module.exports = 1;", "/a.mjs"));
    }

    #[test]
    fn rewrites_default_export_with_interop_marker() {
        let (out, has_exports) = rewrite_to_cjs("export default function hi() {}\n");
        assert!(has_exports);
        assert!(out.contains("module.exports = module.exports.default = function hi() {}"));
        assert!(out.contains("__esModule"));
    }

    #[test]
    fn rewrites_named_export_declaration() {
        let (out, _) = rewrite_to_cjs("export const value = 1;\n");
        assert!(out.contains("const value = 1;"));
        assert!(out.contains("module.exports.value = value;"));
    }

    #[test]
    fn rewrites_named_import_with_rename() {
        let (out, _) = rewrite_to_cjs("import { a, b as c } from \"./mod\";\n");
        assert!(out.contains("const {a, b: c} = require(\"./mod\");"));
    }

    #[test]
    fn dynamic_import_rewrite_ignores_member_calls() {
        let out = rewrite_dynamic_import("await import('x'); foo.import('y');");
        assert!(out.contains("__dynamicImport('x')"));
        assert!(out.contains("foo.import('y')"));
    }

    #[test]
    fn import_meta_properties_become_string_literals() {
        let out = rewrite_import_meta(
            "console.log(import.meta.url, import.meta.dirname);",
            "/app/src/a.js",
        );
        assert!(out.contains("\"file:///app/src/a.js\""));
        assert!(out.contains("\"/app/src\""));
    }
}
