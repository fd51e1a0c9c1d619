//! React-Refresh registration injection: appends one `$RefreshReg$` call
//! per declared top-level component, plus an `import.meta.hot.accept`
//! hook, matching how the real Babel/SWC refresh plugins emit
//! registrations at the end of the module rather than inline after each
//! declaration.

use once_cell::sync::Lazy;
use regex::Regex;

static FUNCTION_COMPONENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\*?\s+([A-Z]\w*)\s*\(").unwrap());

static ARROW_COMPONENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:export\s+)?const\s+([A-Z]\w*)\s*=\s*(?:async\s*)?\(").unwrap()
});

static CLASS_COMPONENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(?:export\s+)?(?:default\s+)?class\s+([A-Z]\w*)").unwrap());

/// Appends registration calls for every top-level component declared in
/// `source`, keyed by `module_id` (typically the file's resolved path).
/// A file with no uppercase-named declarations is returned unchanged --
/// there is nothing for the refresh runtime to track.
pub fn inject_react_refresh(source: &str, module_id: &str) -> String {
    let mut names = Vec::new();
    for re in [&*FUNCTION_COMPONENT, &*ARROW_COMPONENT, &*CLASS_COMPONENT] {
        for caps in re.captures_iter(source) {
            let name = caps[1].to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }

    if names.is_empty() {
        return source.to_string();
    }

    let mut out = source.to_string();
    out.push('\n');
    for name in &names {
        out.push_str(&format!("$RefreshReg$({name}, {module_id:?} + \" {name}\");\n"));
    }
    out.push_str("if (import.meta.hot) {\n  import.meta.hot.accept();\n}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_function_component() {
        let out = inject_react_refresh("export default function Home() {\n  return null;\n}\n", "/pages/index.js");
        assert!(out.contains("$RefreshReg$(Home,"));
        assert!(out.contains("import.meta.hot.accept()"));
    }

    #[test]
    fn registers_arrow_and_class_components() {
        let out = inject_react_refresh(
            "const Button = (props) => null;\nclass Card extends React.Component {}\n",
            "/components/mod.js",
        );
        assert!(out.contains("$RefreshReg$(Button,"));
        assert!(out.contains("$RefreshReg$(Card,"));
    }

    #[test]
    fn file_with_no_components_is_untouched() {
        let source = "export function add(a, b) { return a + b; }\n";
        assert_eq!(inject_react_refresh(source, "/lib/math.js"), source);
    }

    #[test]
    fn does_not_duplicate_registration_for_same_name() {
        let out = inject_react_refresh(
            "function Foo() {}\nfunction Foo() {}\n",
            "/dup.js",
        );
        assert_eq!(out.matches("$RefreshReg$(Foo").count(), 1);
    }
}
