//! A best-effort JSX-to-`jsx-runtime`-call transform, plus a narrow set
//! of TypeScript-annotation strips.
//!
//! Like [`crate::specifier`]/[`playground_module::esm`], this is a
//! textual rewrite, not a full parser: it tracks string/template
//! literal boundaries well enough not to misfire inside them, and
//! recognizes JSX open positions by the token immediately before `<`
//! (start-of-file, `(`, `,`, `return`, `=>`, `=`, `?`, `:`, `&&`, `||`,
//! `[`, `{`, `;`) rather than a real grammar. Expressions inside `{...}`
//! attribute/child positions are copied through verbatim -- JSX nested
//! inside such an expression is still detected, since the scanner
//! recurses into balanced-brace spans looking for further `<` starts.
//! It does not track JSX embedded inside template-literal `${}` holes.

/// Emits calls against the automatic JSX runtime (`jsx`/`jsxs`/`Fragment`),
/// matching the real runtime's own single-child-vs-array-children split.
const JSX_RUNTIME_IMPORT: &str =
    "import { jsx as _jsx, jsxs as _jsxs, Fragment as _Fragment } from \"react/jsx-runtime\";\n";

/// Transforms JSX to automatic-runtime calls. Returns the rewritten
/// source and whether any JSX was actually found (callers use this to
/// decide whether a file counts as a "component file" for React-Refresh
/// registration).
pub fn transform_jsx(source: &str) -> (String, bool) {
    let mut cursor = Cursor::new(source);
    let mut out = String::with_capacity(source.len());
    let mut saw_jsx = false;

    while let Some(ch) = cursor.peek() {
        if ch == '\'' || ch == '"' || ch == '`' {
            out.push_str(cursor.take_string_literal());
            continue;
        }
        if ch == '<' && jsx_may_start(&out) {
            if let Some(element) = cursor.try_parse_jsx() {
                saw_jsx = true;
                out.push_str(&element);
                continue;
            }
        }
        out.push(ch);
        cursor.advance();
    }

    if saw_jsx {
        (format!("{JSX_RUNTIME_IMPORT}{out}"), true)
    } else {
        (out, false)
    }
}

/// Whether a `<` at the current output position could be starting JSX,
/// judged by the last non-whitespace character already emitted.
fn jsx_may_start(out: &str) -> bool {
    let trimmed = out.trim_end();
    if trimmed.is_empty() {
        return true;
    }
    for token in ["return", "=>", "&&", "||"] {
        if trimmed.ends_with(token) {
            return true;
        }
    }
    matches!(trimmed.chars().last(), Some('(' | ',' | '=' | '?' | ':' | '[' | '{' | ';'))
}

struct Cursor<'a> {
    chars: Vec<char>,
    pos: usize,
    source: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            source,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    /// Consumes and returns a string/template literal starting at the
    /// current `'`/`"`/`` ` `` position, including the delimiters.
    fn take_string_literal(&mut self) -> &str {
        let start = self.pos;
        let quote = self.chars[self.pos];
        self.advance();
        while let Some(ch) = self.peek() {
            self.advance();
            if ch == '\\' {
                self.advance();
                continue;
            }
            if ch == quote {
                break;
            }
        }
        let start_byte = char_byte_offset(self.source, start);
        let end_byte = char_byte_offset(self.source, self.pos);
        &self.source[start_byte..end_byte]
    }

    /// Attempts to parse one JSX element/fragment starting at `<`.
    /// Backtracks (returns `None`, leaving `pos` unchanged) if what
    /// follows doesn't look like a tag name or `>` (fragment).
    fn try_parse_jsx(&mut self) -> Option<String> {
        let start = self.pos;
        self.advance(); // '<'

        if self.peek() == Some('>') {
            self.advance();
            let children = self.parse_children("")?;
            return Some(format!("_jsx(_Fragment, {{ children: {children} }})"));
        }

        let name = self.take_identifier_path();
        if name.is_empty() {
            self.pos = start;
            return None;
        }

        self.skip_whitespace();
        let mut props = Vec::new();
        loop {
            match self.peek() {
                Some('/') if self.peek_at(1) == Some('>') => {
                    self.advance();
                    self.advance();
                    return Some(render_element(&name, &props, None));
                }
                Some('>') => {
                    self.advance();
                    let children = self.parse_children(&name)?;
                    return Some(render_element(&name, &props, Some(children)));
                }
                Some('{') => {
                    // spread attribute: {...expr}
                    self.advance();
                    self.skip_whitespace();
                    if self.peek() == Some('.') && self.peek_at(1) == Some('.') && self.peek_at(2) == Some('.') {
                        self.advance();
                        self.advance();
                        self.advance();
                    }
                    let expr = self.take_balanced('{', '}');
                    props.push(format!("...({expr})"));
                    self.skip_whitespace();
                }
                Some(_) => {
                    let attr_name = self.take_identifier_path();
                    if attr_name.is_empty() {
                        self.pos = start;
                        return None;
                    }
                    self.skip_whitespace();
                    if self.peek() == Some('=') {
                        self.advance();
                        self.skip_whitespace();
                        let value = match self.peek() {
                            Some('{') => self.take_balanced('{', '}'),
                            Some(q @ ('"' | '\'')) => {
                                let _ = q;
                                self.take_string_literal().to_string()
                            }
                            _ => {
                                self.pos = start;
                                return None;
                            }
                        };
                        props.push(format!("{}: {value}", js_prop_key(&attr_name)));
                    } else {
                        props.push(format!("{}: true", js_prop_key(&attr_name)));
                    }
                    self.skip_whitespace();
                }
                None => {
                    self.pos = start;
                    return None;
                }
            }
        }
    }

    /// Parses children up to (and consuming) the matching `</name>`
    /// closing tag. `_name` is not checked against the closing tag's
    /// name -- mismatched open/close names pass through as written,
    /// matching the "best-effort, not a parser" stance elsewhere here.
    fn parse_children(&mut self, _name: &str) -> Option<String> {
        let mut children = Vec::new();
        let mut text = String::new();

        loop {
            match self.peek() {
                None => return None,
                Some('<') if self.peek_at(1) == Some('/') => {
                    flush_text(&mut text, &mut children);
                    self.advance();
                    self.advance();
                    self.take_identifier_path();
                    self.skip_whitespace();
                    if self.peek() == Some('>') {
                        self.advance();
                    }
                    return Some(render_children(&children));
                }
                Some('<') => {
                    if let Some(element) = self.try_parse_jsx() {
                        flush_text(&mut text, &mut children);
                        children.push(element);
                    } else {
                        text.push('<');
                        self.advance();
                    }
                }
                Some('{') => {
                    flush_text(&mut text, &mut children);
                    let expr = self.take_balanced('{', '}');
                    children.push(format!("({expr})"));
                }
                Some(ch) => {
                    text.push(ch);
                    self.advance();
                }
            }
        }
    }

    fn take_identifier_path(&mut self) -> String {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' || ch == '$' || ch == '.' || ch == '-' {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        name
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(ch) if ch.is_whitespace()) {
            self.advance();
        }
    }

    /// Consumes a `{ ... }`-delimited (or any `open`/`close` pair)
    /// balanced span, tracking nested braces and string literals inside,
    /// and returns its interior text (without the delimiters).
    fn take_balanced(&mut self, open: char, close: char) -> String {
        debug_assert_eq!(self.peek(), Some(open));
        self.advance();
        let start = self.pos;
        let mut depth = 1usize;
        while let Some(ch) = self.peek() {
            if ch == '\'' || ch == '"' || ch == '`' {
                self.take_string_literal();
                continue;
            }
            if ch == open {
                depth += 1;
            } else if ch == close {
                depth -= 1;
                if depth == 0 {
                    let end = self.pos;
                    self.advance();
                    return self.chars[start..end].iter().collect();
                }
            }
            self.advance();
        }
        // Unbalanced input: return what we have rather than panicking.
        self.chars[start..].iter().collect::<String>()
    }
}

fn flush_text(text: &mut String, children: &mut Vec<String>) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        children.push(format!("{:?}", trimmed));
    }
    text.clear();
}

fn render_children(children: &[String]) -> String {
    if children.is_empty() {
        "undefined".to_string()
    } else if children.len() == 1 {
        children[0].clone()
    } else {
        format!("[{}]", children.join(", "))
    }
}

fn render_element(name: &str, props: &[String], children: Option<String>) -> String {
    let tag = if name.chars().next().is_some_and(|c| c.is_uppercase()) || name.contains('.') {
        name.to_string()
    } else {
        format!("{name:?}")
    };
    let mut all_props = props.to_vec();
    let multi_children = matches!(&children, Some(c) if c.starts_with('['));
    if let Some(children) = children {
        all_props.push(format!("children: {children}"));
    }
    let props_obj = format!("{{ {} }}", all_props.join(", "));
    if multi_children {
        format!("_jsxs({tag}, {props_obj})")
    } else {
        format!("_jsx({tag}, {props_obj})")
    }
}

fn js_prop_key(name: &str) -> String {
    if name.contains('-') {
        format!("{name:?}")
    } else {
        name.to_string()
    }
}

fn char_byte_offset(source: &str, char_index: usize) -> usize {
    source.char_indices().nth(char_index).map_or(source.len(), |(b, _)| b)
}

/// Strips a narrow set of TypeScript-only syntax that would otherwise
/// fail to parse as plain JS: `interface` blocks, `type` aliases,
/// parameter/variable `: Type` annotations, and `as const`/`as unknown`
/// assertions. General `as Type` casts are deliberately left alone,
/// since `as` also appears in import/export rename clauses and a regex
/// can't reliably tell the two apart.
pub fn strip_typescript(source: &str) -> String {
    let without_interfaces = strip_balanced_blocks(source, "interface");
    let without_types = strip_type_aliases(&without_interfaces);
    let without_casts = without_types.replace(" as const", "").replace(" as unknown", "");
    strip_annotations(&without_casts)
}

fn strip_balanced_blocks(source: &str, keyword: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    loop {
        let Some(idx) = find_keyword(rest, keyword) else {
            out.push_str(rest);
            break;
        };
        out.push_str(&rest[..idx]);
        let after_keyword = &rest[idx + keyword.len()..];
        let Some(brace_start) = after_keyword.find('{') else {
            out.push_str(keyword);
            rest = after_keyword;
            continue;
        };
        let mut depth = 0usize;
        let mut end = None;
        for (i, ch) in after_keyword[brace_start..].char_indices() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(brace_start + i + 1);
                        break;
                    }
                }
                _ => {}
            }
        }
        match end {
            Some(end) => rest = &after_keyword[end..],
            None => {
                out.push_str(keyword);
                rest = after_keyword;
            }
        }
    }
    out
}

fn find_keyword(source: &str, keyword: &str) -> Option<usize> {
    let mut search_from = 0;
    while let Some(rel) = source[search_from..].find(keyword) {
        let idx = search_from + rel;
        let before_ok = idx == 0 || !source.as_bytes()[idx - 1].is_ascii_alphanumeric();
        let after = idx + keyword.len();
        let after_ok = source.as_bytes().get(after).is_none_or(|b| !b.is_ascii_alphanumeric());
        if before_ok && after_ok {
            return Some(idx);
        }
        search_from = idx + keyword.len();
    }
    None
}

fn strip_type_aliases(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    loop {
        let Some(idx) = find_keyword(rest, "type") else {
            out.push_str(rest);
            break;
        };
        // Only treat as a type alias if followed by an identifier then `=`.
        let after = rest[idx + 4..].trim_start();
        let looks_like_alias = after
            .chars()
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$');
        if !looks_like_alias {
            out.push_str(&rest[..idx + 4]);
            rest = &rest[idx + 4..];
            continue;
        }
        out.push_str(&rest[..idx]);
        let remainder = &rest[idx..];
        let end = remainder.find(';').map(|i| i + 1).unwrap_or(remainder.len());
        rest = &remainder[end..];
    }
    out
}

fn strip_annotations(source: &str) -> String {
    use once_cell::sync::Lazy;
    use regex::Regex;

    static PARAM_ANNOTATION: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"([(,]\s*\w+)\s*:\s*[\w$.\[\]<>| &]+(?=[,)])").unwrap());
    static VAR_ANNOTATION: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"((?:const|let|var)\s+\w+)\s*:\s*[\w$.\[\]<>| &]+(?=\s*=)").unwrap());

    let out = PARAM_ANNOTATION.replace_all(source, "$1");
    VAR_ANNOTATION.replace_all(&out, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transforms_self_closing_element() {
        let (out, saw_jsx) = transform_jsx("const el = <Foo bar=\"baz\" />;");
        assert!(saw_jsx);
        assert!(out.contains("_jsx(Foo, { bar: \"baz\" })"));
        assert!(out.contains("react/jsx-runtime"));
    }

    #[test]
    fn transforms_element_with_single_text_child() {
        let (out, _) = transform_jsx("return <div>Hello</div>;");
        assert!(out.contains("_jsx(\"div\", { children: \"Hello\" })"));
    }

    #[test]
    fn transforms_element_with_multiple_children_using_jsxs() {
        let (out, _) = transform_jsx("return <div><span>a</span><span>b</span></div>;");
        assert!(out.contains("_jsxs(\"div\""));
        assert!(out.contains("_jsx(\"span\", { children: \"a\" })"));
    }

    #[test]
    fn transforms_expression_child() {
        let (out, _) = transform_jsx("return <div>{count}</div>;");
        assert!(out.contains("_jsx(\"div\", { children: (count) })"));
    }

    #[test]
    fn transforms_fragment() {
        let (out, _) = transform_jsx("return <><A /><B /></>;");
        assert!(out.contains("_Fragment"));
    }

    #[test]
    fn leaves_non_jsx_comparison_alone() {
        let (out, saw_jsx) = transform_jsx("if (a < b) { return a; }\n");
        assert!(!saw_jsx);
        assert!(!out.contains("_jsx"));
        assert!(out.contains("a < b"));
    }

    #[test]
    fn strips_interface_and_type_alias() {
        let out = strip_typescript("interface Foo { bar: string }\ntype Id = string;\nconst x = 1;\n");
        assert!(!out.contains("interface"));
        assert!(!out.contains("type Id"));
        assert!(out.contains("const x = 1;"));
    }

    #[test]
    fn strips_parameter_and_variable_annotations() {
        let out = strip_typescript("function f(a: number, b: string) {}\nconst x: number = 1;\n");
        assert!(out.contains("function f(a, b) {}"));
        assert!(out.contains("const x = 1;"));
    }
}
