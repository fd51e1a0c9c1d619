//! Specifier resolution: relative paths, `node_modules` walks, and the
//! `package.json` `exports` field.

use std::cell::RefCell;

use rustc_hash::FxHashMap;

use playground_vfs::{path, Vfs};

use crate::manifest::PackageManifest;

/// Specifiers naming a family of packages that are intercepted regardless
/// of whether a real copy is installed under `node_modules` -- the native
/// transform, the native bundler, the formatter, and the telemetry SDK.
/// Matched both by specifier prefix and by resolved `node_modules` package
/// directory name.
pub const ALWAYS_REDIRECTED_PACKAGES: &[&str] =
    &["@swc/core", "esbuild", "prettier", "analytics-sdk"];

/// The closed set of specifiers backed by a host primitive shim rather than
/// by a file on disk. See the host-shims crate for the actual objects.
pub const HOST_PRIMITIVE_SPECIFIERS: &[&str] = &[
    "fs", "path", "process", "events", "stream", "buffer", "http", "https", "zlib", "crypto",
];

const RESOLVABLE_EXTENSIONS: &[&str] = &[".js", ".json"];

/// The outcome of resolving a specifier from a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSpecifier {
    /// Resolves to an absolute file path within the VFS.
    File(String),
    /// Resolves to a host-primitive or always-redirected shim, identified
    /// by its canonical specifier (e.g. `"path"`, `"@swc/core"`).
    Shim(String),
    NotFound,
}

/// Resolves module specifiers against the VFS, memoizing both positive and
/// negative results per `(fromDir, specifier)` pair.
pub struct Resolver {
    vfs: Vfs,
    cache: RefCell<FxHashMap<(String, String), ResolvedSpecifier>>,
}

impl Resolver {
    pub fn new(vfs: Vfs) -> Self {
        Self {
            vfs,
            cache: RefCell::new(FxHashMap::default()),
        }
    }

    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }

    pub fn resolve(&self, from_dir: &str, specifier: &str) -> ResolvedSpecifier {
        let key = (from_dir.to_string(), specifier.to_string());
        if let Some(cached) = self.cache.borrow().get(&key) {
            return cached.clone();
        }
        let result = self.resolve_uncached(from_dir, specifier);
        self.cache.borrow_mut().insert(key, result.clone());
        result
    }

    fn resolve_uncached(&self, from_dir: &str, specifier: &str) -> ResolvedSpecifier {
        let specifier = specifier.strip_prefix("node:").unwrap_or(specifier);

        if redirected_package_for_specifier(specifier).is_some() {
            return ResolvedSpecifier::Shim(specifier.to_string());
        }
        if HOST_PRIMITIVE_SPECIFIERS.contains(&specifier) {
            return ResolvedSpecifier::Shim(specifier.to_string());
        }

        let result = if specifier.starts_with("./") || specifier.starts_with("../") || specifier.starts_with('/')
        {
            self.resolve_relative(from_dir, specifier)
        } else {
            self.resolve_package(from_dir, specifier)
        };

        match result {
            Some(resolved_path) => {
                if let Some(pkg) = redirected_package_for_path(&resolved_path) {
                    ResolvedSpecifier::Shim(pkg.to_string())
                } else {
                    ResolvedSpecifier::File(resolved_path)
                }
            }
            None => ResolvedSpecifier::NotFound,
        }
    }

    fn resolve_relative(&self, from_dir: &str, specifier: &str) -> Option<String> {
        let base = if specifier.starts_with('/') {
            specifier.to_string()
        } else {
            path::join(from_dir, specifier)
        };
        self.resolve_as_file_or_directory(&base)
    }

    fn resolve_as_file_or_directory(&self, candidate: &str) -> Option<String> {
        if self.is_file(candidate) {
            return Some(candidate.to_string());
        }
        for ext in RESOLVABLE_EXTENSIONS {
            let with_ext = format!("{candidate}{ext}");
            if self.is_file(&with_ext) {
                return Some(with_ext);
            }
        }
        let index = path::join(candidate, "index.js");
        if self.is_file(&index) {
            return Some(index);
        }
        None
    }

    fn is_file(&self, path: &str) -> bool {
        self.vfs.stat(path).map(|s| s.is_file).unwrap_or(false)
    }

    fn resolve_package(&self, from_dir: &str, specifier: &str) -> Option<String> {
        for candidate_root in node_modules_ancestors(from_dir) {
            let package_root = path::join(&candidate_root, specifier);
            if let Some(found) = self.resolve_package_at(&package_root, specifier) {
                return Some(found);
            }
        }
        let root_candidate = path::join("/node_modules", specifier);
        self.resolve_package_at(&root_candidate, specifier)
    }

    /// Resolves `specifier` once a `node_modules/<specifier...>` directory
    /// candidate has been located. `specifier` may itself contain a
    /// subpath (`lodash/get`), in which case the package root is the
    /// first segment (or first two for a scoped package) and the rest is
    /// an export subpath.
    fn resolve_package_at(&self, package_root: &str, specifier: &str) -> Option<String> {
        let (pkg_root, pkg_name, subpath) = split_package_root(package_root, specifier);
        if !self.vfs.stat(&pkg_root).map(|s| s.is_directory).unwrap_or(false) {
            return None;
        }
        let manifest_path = path::join(&pkg_root, "package.json");
        let manifest = self
            .vfs
            .read_to_string(&manifest_path)
            .ok()
            .and_then(|src| PackageManifest::parse(&src));

        if let Some(manifest) = &manifest {
            let export_subpath = if subpath.is_empty() {
                ".".to_string()
            } else {
                format!("./{subpath}")
            };
            if manifest.exports.is_some() {
                return manifest
                    .resolve_export(&export_subpath)
                    .and_then(|rel| self.resolve_as_file_or_directory(&path::join(&pkg_root, &rel)));
            }
            if subpath.is_empty() {
                let main = manifest.main.clone().unwrap_or_else(|| "index.js".to_string());
                if let Some(found) = self.resolve_as_file_or_directory(&path::join(&pkg_root, &main)) {
                    return Some(found);
                }
            }
        }

        let _ = pkg_name;
        let full_candidate = if subpath.is_empty() {
            pkg_root.clone()
        } else {
            path::join(&pkg_root, &subpath)
        };
        self.resolve_as_file_or_directory(&full_candidate)
    }
}

/// Splits `node_modules/<specifier>` into `(package_root, package_name, subpath)`,
/// honoring scoped packages (`@scope/name/sub`).
fn split_package_root(package_root: &str, specifier: &str) -> (String, String, String) {
    let segments: Vec<&str> = specifier.split('/').collect();
    let name_len = if specifier.starts_with('@') { 2 } else { 1 };
    let pkg_name = segments[..name_len.min(segments.len())].join("/");
    let subpath = segments
        .get(name_len..)
        .map(|rest| rest.join("/"))
        .unwrap_or_default();

    // `package_root` was joined from the full specifier; strip the subpath
    // back off to get just the package directory.
    let base = package_root.trim_end_matches(&format!("/{subpath}"));
    let base = if subpath.is_empty() { package_root } else { base };
    (base.to_string(), pkg_name, subpath)
}

/// Yields `<dir>/node_modules` for `from_dir` and each ancestor, walking up
/// to the VFS root.
fn node_modules_ancestors(from_dir: &str) -> Vec<String> {
    let mut dirs = Vec::new();
    let mut current = path::normalize(from_dir);
    loop {
        dirs.push(path::join(&current, "node_modules"));
        if current == "/" {
            break;
        }
        current = path::dirname(&current);
    }
    dirs
}

fn redirected_package_for_specifier(specifier: &str) -> Option<&'static str> {
    ALWAYS_REDIRECTED_PACKAGES
        .iter()
        .find(|pkg| specifier == **pkg || specifier.starts_with(&format!("{pkg}/")))
        .copied()
}

fn redirected_package_for_path(resolved_path: &str) -> Option<&'static str> {
    for pkg in ALWAYS_REDIRECTED_PACKAGES {
        let marker = format!("/node_modules/{pkg}/");
        if resolved_path.contains(&marker) || resolved_path.ends_with(&format!("/node_modules/{pkg}")) {
            return Some(pkg);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn vfs() -> Vfs {
        Vfs::new(Rc::new(playground_vfs::LogicalClock::new()))
    }

    #[test]
    fn relative_resolution_tries_extensions_then_index() {
        let fs = vfs();
        fs.write("/src/utils.js", "").unwrap();
        fs.write("/src/nested/index.js", "").unwrap();
        let resolver = Resolver::new(fs);

        assert_eq!(
            resolver.resolve("/src", "./utils"),
            ResolvedSpecifier::File("/src/utils.js".to_string())
        );
        assert_eq!(
            resolver.resolve("/src", "./nested"),
            ResolvedSpecifier::File("/src/nested/index.js".to_string())
        );
        assert_eq!(resolver.resolve("/src", "./missing"), ResolvedSpecifier::NotFound);
    }

    #[test]
    fn host_primitives_resolve_to_shims_without_touching_the_vfs() {
        let resolver = Resolver::new(vfs());
        assert_eq!(
            resolver.resolve("/src", "node:path"),
            ResolvedSpecifier::Shim("path".to_string())
        );
        assert_eq!(
            resolver.resolve("/src", "fs"),
            ResolvedSpecifier::Shim("fs".to_string())
        );
    }

    #[test]
    fn always_redirected_packages_win_even_if_installed() {
        let fs = vfs();
        fs.write("/node_modules/esbuild/index.js", "").unwrap();
        fs.write("/node_modules/esbuild/package.json", r#"{"main":"index.js"}"#)
            .unwrap();
        let resolver = Resolver::new(fs);
        assert_eq!(
            resolver.resolve("/", "esbuild"),
            ResolvedSpecifier::Shim("esbuild".to_string())
        );
    }

    #[test]
    fn package_without_exports_uses_main_field() {
        let fs = vfs();
        fs.write("/node_modules/lodash/dist/index.js", "").unwrap();
        fs.write(
            "/node_modules/lodash/package.json",
            r#"{"main": "dist/index.js"}"#,
        )
        .unwrap();
        let resolver = Resolver::new(fs);
        assert_eq!(
            resolver.resolve("/src", "lodash"),
            ResolvedSpecifier::File("/node_modules/lodash/dist/index.js".to_string())
        );
    }

    #[test]
    fn package_with_exports_chooses_require_condition() {
        let fs = vfs();
        fs.write("/node_modules/pkg/dist/cjs.js", "").unwrap();
        fs.write(
            "/node_modules/pkg/package.json",
            r#"{"exports": {".": {"import": "./dist/esm.js", "require": "./dist/cjs.js"}}}"#,
        )
        .unwrap();
        let resolver = Resolver::new(fs);
        assert_eq!(
            resolver.resolve("/src", "pkg"),
            ResolvedSpecifier::File("/node_modules/pkg/dist/cjs.js".to_string())
        );
    }

    #[test]
    fn unknown_subpath_under_exports_fails() {
        let fs = vfs();
        fs.write(
            "/node_modules/pkg/package.json",
            r#"{"exports": {".": "./index.js"}}"#,
        )
        .unwrap();
        fs.write("/node_modules/pkg/index.js", "").unwrap();
        let resolver = Resolver::new(fs);
        assert_eq!(
            resolver.resolve("/src", "pkg/secret"),
            ResolvedSpecifier::NotFound
        );
    }

    #[test]
    fn walks_up_ancestors_to_find_node_modules() {
        let fs = vfs();
        fs.write("/node_modules/shared/index.js", "").unwrap();
        let resolver = Resolver::new(fs);
        assert_eq!(
            resolver.resolve("/a/b/c", "shared"),
            ResolvedSpecifier::File("/node_modules/shared/index.js".to_string())
        );
    }

    #[test]
    fn resolution_results_are_memoized() {
        let fs = vfs();
        fs.write("/src/a.js", "").unwrap();
        let resolver = Resolver::new(fs.clone());
        assert_eq!(
            resolver.resolve("/src", "./a"),
            ResolvedSpecifier::File("/src/a.js".to_string())
        );
        fs.unlink("/src/a.js").unwrap();
        // Still served from cache even though the file is now gone.
        assert_eq!(
            resolver.resolve("/src", "./a"),
            ResolvedSpecifier::File("/src/a.js".to_string())
        );
        resolver.clear_cache();
        assert_eq!(resolver.resolve("/src", "./a"), ResolvedSpecifier::NotFound);
    }
}
