//! Page/route resolution: Pages-Router static/dynamic/catch-all matching
//! and App-Router layout-chain accumulation. Mirrors the resolver's own
//! "try candidates in specificity order, first match wins" shape
//! (`core/module/src/resolver.rs`) rather than introducing a different
//! resolution idiom for routes.

use rustc_hash::FxHashMap;

use playground_vfs::{path, Vfs};

const SOURCE_EXTENSIONS: &[&str] = &[".tsx", ".ts", ".jsx", ".js"];

/// The outcome of resolving a URL pathname against the route tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteResolution {
    Page {
        file: String,
        params: FxHashMap<String, String>,
        /// App-Router only: `layout.*` files from the app root down to
        /// the page, outermost first. Empty for Pages-Router matches.
        layout_chain: Vec<String>,
    },
    ApiHandler {
        file: String,
        params: FxHashMap<String, String>,
    },
    RouteHandler {
        file: String,
        params: FxHashMap<String, String>,
    },
    NotFound,
}

/// Specificity ordering used to break ties between candidate matches at
/// the same directory depth: an exact segment always beats `[name]`,
/// which always beats `[...rest]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Specificity {
    CatchAll,
    Dynamic,
    Static,
}

fn find_source_file(vfs: &Vfs, base_without_ext: &str) -> Option<String> {
    for ext in SOURCE_EXTENSIONS {
        let candidate = format!("{base_without_ext}{ext}");
        if vfs.stat(&candidate).map(|s| s.is_file).unwrap_or(false) {
            return Some(candidate);
        }
    }
    None
}

/// Resolves `pathname` against `<pages_dir>`, implementing SPEC_FULL.md
/// §4.5 step 4: index routes, static segment matches, then dynamic
/// (`[name]`) and catch-all (`[...rest]`) segment matches, static beating
/// dynamic beating catch-all whenever both could match the same segment.
pub fn resolve_pages_route(vfs: &Vfs, pages_dir: &str, pathname: &str) -> Option<(String, FxHashMap<String, String>)> {
    let segments: Vec<&str> = path::segments(pathname);

    if segments.is_empty() {
        if let Some(file) = find_source_file(vfs, &path::join(pages_dir, "index")) {
            return Some((file, FxHashMap::default()));
        }
    }

    if let Some(file) = find_source_file(vfs, &path::join(pages_dir, pathname.trim_start_matches('/'))) {
        return Some((file, FxHashMap::default()));
    }
    if let Some(file) = find_source_file(vfs, &path::join(&path::join(pages_dir, pathname.trim_start_matches('/')), "index")) {
        return Some((file, FxHashMap::default()));
    }

    resolve_dynamic(vfs, pages_dir, &segments)
}

/// Walks `dir`'s children looking for a `[name]` or `[...rest]` directory
/// (or leaf file, for the final segment) matching the next unmatched URL
/// segment, recursing until all segments are consumed.
fn resolve_dynamic(vfs: &Vfs, dir: &str, segments: &[&str]) -> Option<(String, FxHashMap<String, String>)> {
    let Some((head, rest)) = segments.split_first() else {
        return find_source_file(vfs, &path::join(dir, "index")).map(|file| (file, FxHashMap::default()));
    };

    let entries = vfs.readdir(dir).ok()?;
    let mut best: Option<(Specificity, String, FxHashMap<String, String>)> = None;

    for entry in entries {
        let (param_name, specificity, is_catch_all) = match dynamic_segment_name(&entry) {
            Some(name) if name.starts_with("...") => (name.trim_start_matches("...").to_string(), Specificity::CatchAll, true),
            Some(name) => (name, Specificity::Dynamic, false),
            None => continue,
        };

        let entry_path = path::join(dir, &entry);
        let is_dir = vfs.stat(&entry_path).map(|s| s.is_directory).unwrap_or(false);

        if is_catch_all {
            // A catch-all consumes every remaining segment, whether or not
            // this is the last one.
            let value = segments.join("/");
            let mut params = FxHashMap::default();
            params.insert(param_name, value);
            let resolved = if is_dir {
                find_source_file(vfs, &path::join(&entry_path, "index"))
            } else {
                strip_bracket_extension(&entry_path)
            };
            if let Some(file) = resolved {
                update_best(&mut best, specificity, file, params);
            }
            continue;
        }

        if rest.is_empty() {
            let resolved = if is_dir {
                find_source_file(vfs, &path::join(&entry_path, "index"))
            } else {
                strip_bracket_extension(&entry_path)
            };
            if let Some(file) = resolved {
                let mut params = FxHashMap::default();
                params.insert(param_name, (*head).to_string());
                update_best(&mut best, specificity, file, params);
            }
        } else if is_dir {
            if let Some((file, mut child_params)) = resolve_dynamic(vfs, &entry_path, rest) {
                child_params.insert(param_name, (*head).to_string());
                update_best(&mut best, specificity, file, child_params);
            }
        }
    }

    best.map(|(_, file, params)| (file, params))
}

fn update_best(
    best: &mut Option<(Specificity, String, FxHashMap<String, String>)>,
    specificity: Specificity,
    file: String,
    params: FxHashMap<String, String>,
) {
    let replace = match best {
        Some((current, _, _)) => specificity > *current,
        None => true,
    };
    if replace {
        *best = Some((specificity, file, params));
    }
}

/// A directory/file name like `[id]` or `[...rest].jsx` names a dynamic
/// segment; returns the inner name (including a leading `...` for
/// catch-alls) with any source extension stripped.
fn dynamic_segment_name(entry: &str) -> Option<String> {
    let without_ext = SOURCE_EXTENSIONS
        .iter()
        .find_map(|ext| entry.strip_suffix(ext))
        .unwrap_or(entry);
    without_ext.strip_prefix('[')?.strip_suffix(']').map(str::to_string)
}

fn strip_bracket_extension(path_with_ext: &str) -> Option<String> {
    Some(path_with_ext.to_string())
}

/// App-Router resolution (SPEC_FULL.md §4.5 step 5): walks from `app_dir`
/// down the path, accumulating every `layout.*` encountered, and matching
/// a `page.*` (page route) or `route.*` (handler route) at the terminal
/// segment. Dynamic segments resolve the same way Pages-Router does.
pub fn resolve_app_route(vfs: &Vfs, app_dir: &str, pathname: &str) -> RouteResolution {
    let segments = path::segments(pathname);
    match walk_app_dir(vfs, app_dir, &segments, FxHashMap::default()) {
        Some(AppMatch::Page { file, params, layout_chain }) => RouteResolution::Page { file, params, layout_chain },
        Some(AppMatch::Route { file, params }) => RouteResolution::RouteHandler { file, params },
        None => RouteResolution::NotFound,
    }
}

enum AppMatch {
    Page {
        file: String,
        params: FxHashMap<String, String>,
        layout_chain: Vec<String>,
    },
    Route {
        file: String,
        params: FxHashMap<String, String>,
    },
}

/// Returns the match found along the successful path only -- each
/// candidate child is tried with its own fresh layout-chain suffix, so a
/// dead-end branch's `layout.*` never leaks into the chain of whichever
/// sibling branch actually matches.
fn walk_app_dir(vfs: &Vfs, dir: &str, segments: &[&str], params: FxHashMap<String, String>) -> Option<AppMatch> {
    let own_layout = find_source_file(vfs, &path::join(dir, "layout"));

    let prepend_layout = |mut found: AppMatch| {
        if let (AppMatch::Page { layout_chain, .. }, Some(layout)) = (&mut found, &own_layout) {
            layout_chain.insert(0, layout.clone());
        }
        found
    };

    if segments.is_empty() {
        if let Some(file) = find_source_file(vfs, &path::join(dir, "route")) {
            return Some(AppMatch::Route { file, params });
        }
        return find_source_file(vfs, &path::join(dir, "page")).map(|file| {
            prepend_layout(AppMatch::Page {
                file,
                params,
                layout_chain: Vec::new(),
            })
        });
    }

    let (head, rest) = segments.split_first().expect("checked non-empty above");
    let entries = vfs.readdir(dir).ok()?;

    let mut candidates: Vec<(Specificity, String, FxHashMap<String, String>)> = Vec::new();
    for entry in &entries {
        let entry_path = path::join(dir, entry);
        if !vfs.stat(&entry_path).map(|s| s.is_directory).unwrap_or(false) {
            continue;
        }
        if entry == head {
            candidates.push((Specificity::Static, entry_path, params.clone()));
            continue;
        }
        if let Some(name) = dynamic_segment_name(entry) {
            if let Some(rest_name) = name.strip_prefix("...") {
                let mut p = params.clone();
                p.insert(rest_name.to_string(), segments.join("/"));
                candidates.push((Specificity::CatchAll, entry_path, p));
            } else {
                let mut p = params.clone();
                p.insert(name, (*head).to_string());
                candidates.push((Specificity::Dynamic, entry_path, p));
            }
        }
    }
    candidates.sort_by(|a, b| b.0.cmp(&a.0));

    for (specificity, entry_path, entry_params) in candidates {
        let remaining = if specificity == Specificity::CatchAll { &[][..] } else { rest };
        if let Some(found) = walk_app_dir(vfs, &entry_path, remaining, entry_params) {
            return Some(prepend_layout(found));
        }
    }
    None
}

/// Resolves `/_next/shims/<name>`-style and route-info bookkeeping share
/// no state with page/route resolution, so they live in their own small
/// helper rather than this module.
pub fn pages_router_active(vfs: &Vfs, config_prefers_app: Option<bool>, app_dir: &str) -> bool {
    match config_prefers_app {
        Some(prefer_app) => !prefer_app,
        None => !vfs.stat(app_dir).map(|s| s.is_directory).unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use playground_vfs::LogicalClock;

    fn vfs() -> Vfs {
        Vfs::new(Rc::new(LogicalClock::new()))
    }

    #[test]
    fn resolves_index_route() {
        let fs = vfs();
        fs.write("/pages/index.jsx", "").unwrap();
        let (file, params) = resolve_pages_route(&fs, "/pages", "/").unwrap();
        assert_eq!(file, "/pages/index.jsx");
        assert!(params.is_empty());
    }

    #[test]
    fn resolves_static_nested_route() {
        let fs = vfs();
        fs.write("/pages/about.jsx", "").unwrap();
        let (file, _) = resolve_pages_route(&fs, "/pages", "/about").unwrap();
        assert_eq!(file, "/pages/about.jsx");
    }

    #[test]
    fn static_beats_dynamic_at_same_depth() {
        let fs = vfs();
        fs.write("/pages/users/settings.jsx", "").unwrap();
        fs.write("/pages/users/[id].jsx", "").unwrap();
        let (file, params) = resolve_pages_route(&fs, "/pages", "/users/settings").unwrap();
        assert_eq!(file, "/pages/users/settings.jsx");
        assert!(params.is_empty());
    }

    #[test]
    fn dynamic_segment_produces_params() {
        let fs = vfs();
        fs.write("/pages/users/[id].jsx", "").unwrap();
        let (file, params) = resolve_pages_route(&fs, "/pages", "/users/42").unwrap();
        assert_eq!(file, "/pages/users/[id].jsx");
        assert_eq!(params.get("id"), Some(&"42".to_string()));
    }

    #[test]
    fn catch_all_matches_multi_segment_tail() {
        let fs = vfs();
        fs.write("/pages/docs/[...slug].jsx", "").unwrap();
        let (file, params) = resolve_pages_route(&fs, "/pages", "/docs/a/b/c").unwrap();
        assert_eq!(file, "/pages/docs/[...slug].jsx");
        assert_eq!(params.get("slug"), Some(&"a/b/c".to_string()));
    }

    #[test]
    fn extra_segment_without_catch_all_does_not_match() {
        let fs = vfs();
        fs.write("/pages/users/[id].jsx", "").unwrap();
        assert!(resolve_pages_route(&fs, "/pages", "/users/42/extra").is_none());
    }

    #[test]
    fn app_router_accumulates_layout_chain_outermost_first() {
        let fs = vfs();
        fs.write("/app/layout.jsx", "").unwrap();
        fs.write("/app/dashboard/layout.jsx", "").unwrap();
        fs.write("/app/dashboard/page.jsx", "").unwrap();
        match resolve_app_route(&fs, "/app", "/dashboard") {
            RouteResolution::Page { file, layout_chain, .. } => {
                assert_eq!(file, "/app/dashboard/page.jsx");
                assert_eq!(layout_chain, vec!["/app/layout.jsx".to_string(), "/app/dashboard/layout.jsx".to_string()]);
            }
            other => panic!("expected Page, got {other:?}"),
        }
    }

    #[test]
    fn app_router_resolves_route_handler_over_page() {
        let fs = vfs();
        fs.write("/app/api/ping/route.ts", "").unwrap();
        match resolve_app_route(&fs, "/app", "/api/ping") {
            RouteResolution::RouteHandler { file, .. } => assert_eq!(file, "/app/api/ping/route.ts"),
            other => panic!("expected RouteHandler, got {other:?}"),
        }
    }

    #[test]
    fn pages_router_is_active_when_no_app_dir_and_no_preference() {
        let fs = vfs();
        assert!(pages_router_active(&fs, None, "/app"));
        fs.mkdir("/app", Default::default()).unwrap();
        assert!(!pages_router_active(&fs, None, "/app"));
        assert!(pages_router_active(&fs, Some(false), "/app"));
    }
}
