//! `package.json` parsing and the `exports`-field resolution algorithm.

use serde_json::Value;

/// The fields of a `package.json` the loader actually consults. Anything
/// else in the manifest is ignored.
#[derive(Debug, Clone, Default)]
pub struct PackageManifest {
    pub main: Option<String>,
    pub exports: Option<Value>,
    pub is_module_type: bool,
}

impl PackageManifest {
    pub fn parse(source: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(source).ok()?;
        let main = value.get("main").and_then(Value::as_str).map(str::to_string);
        let exports = value.get("exports").cloned();
        let is_module_type = value.get("type").and_then(Value::as_str) == Some("module");
        Some(Self {
            main,
            exports,
            is_module_type,
        })
    }

    /// Resolves `subpath` (`"."` for the package root, `"./foo"` for a
    /// subpath import) against the `exports` field, honoring condition
    /// priority `require`, then `default`. Returns `None` if there is no
    /// `exports` field, or if the subpath has no match (the caller should
    /// treat a present-but-unmatched `exports` field as a hard failure per
    /// spec, whereas an absent field falls back to `main`/extension probing).
    pub fn resolve_export(&self, subpath: &str) -> Option<String> {
        let exports = self.exports.as_ref()?;
        match exports {
            Value::String(_) | Value::Array(_) => {
                if subpath == "." {
                    resolve_condition_map(exports)
                } else {
                    None
                }
            }
            Value::Object(map) => {
                let has_subpath_keys = map.keys().any(|k| k.starts_with('.'));
                if has_subpath_keys {
                    // Exact match first, then the longest-matching pattern key
                    // ending in `/` or containing a single trailing `*`.
                    if let Some(value) = map.get(subpath) {
                        return resolve_condition_map(value);
                    }
                    if let Some((matched_suffix, value)) = longest_pattern_match(map, subpath) {
                        let target = resolve_condition_map(value)?;
                        return Some(target.replacen('*', matched_suffix, 1));
                    }
                    None
                } else if subpath == "." {
                    resolve_condition_map(exports)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

fn longest_pattern_match<'a>(
    map: &'a serde_json::Map<String, Value>,
    subpath: &str,
) -> Option<(&'a str, &'a Value)> {
    let mut best: Option<(&str, &str, &Value)> = None;
    for (key, value) in map {
        if !key.starts_with('.') {
            continue;
        }
        let prefix = key.strip_suffix('*').or_else(|| key.strip_suffix('/'));
        let Some(prefix) = prefix else { continue };
        if !subpath.starts_with(prefix) {
            continue;
        }
        if best.map_or(true, |(best_key, ..)| key.len() > best_key.len()) {
            best = Some((key, &subpath[prefix.len()..], value));
        }
    }
    best.map(|(_, suffix, value)| (suffix, value))
}

/// Walks a condition map (or plain string/array target) applying the
/// `require`, then `default` priority order used throughout this loader.
fn resolve_condition_map(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(resolve_condition_map),
        Value::Object(map) => {
            for condition in ["require", "default"] {
                if let Some(v) = map.get(condition) {
                    if let Some(resolved) = resolve_condition_map(v) {
                        return Some(resolved);
                    }
                }
            }
            None
        }
        Value::Null => None,
        _ => None,
    }
}
