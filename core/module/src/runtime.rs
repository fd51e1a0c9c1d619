//! Ties the resolver, the module cache, and the host primitive shims to a
//! `boa_engine::Context`, implementing `require`, `createRequire`, and the
//! dynamic-`import()`/`import.meta` interop installed into every module.

use std::rc::Rc;

use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::{js_string, Context, JsError, JsNativeError, JsResult, JsString, JsValue, Source};
use boa_interop::{ContextData, IntoJsFunctionCopied};
use rustc_hash::FxHashMap;

use playground_vfs::{path, Vfs};

use crate::cache::ModuleCache;
use crate::error::{ModuleError, ModuleResult};
use crate::esm;
use crate::resolver::{ResolvedSpecifier, Resolver};

/// A host-primitive shim: something that produces the `module.exports`
/// value for a specifier like `"path"` or `"@swc/core"` without touching
/// the virtual filesystem.
pub trait HostPrimitive {
    fn install(&self, context: &mut Context) -> JsResult<JsValue>;
}

/// The closed table of specifier -> shim, consulted whenever the resolver
/// reports [`ResolvedSpecifier::Shim`].
#[derive(Default)]
pub struct ShimRegistry {
    shims: FxHashMap<String, Rc<dyn HostPrimitive>>,
}

impl ShimRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, specifier: impl Into<String>, shim: Rc<dyn HostPrimitive>) {
        self.shims.insert(specifier.into(), shim);
    }

    /// Looks up a registered shim by specifier. Exposed publicly so shim
    /// crates can assert on what they've registered in their own tests.
    pub fn get(&self, specifier: &str) -> Option<&Rc<dyn HostPrimitive>> {
        self.shims.get(specifier)
    }
}

/// The CommonJS module loader proper: resolves specifiers, reads source
/// from the VFS, rewrites ESM syntax to CJS, and executes each module body
/// inside a generated `(function(module, exports, __filename, __dirname))`
/// wrapper.
pub struct ModuleRuntime {
    vfs: Vfs,
    resolver: Resolver,
    cache: ModuleCache,
    shims: ShimRegistry,
}

impl ModuleRuntime {
    pub fn new(vfs: Vfs, shims: ShimRegistry) -> Rc<Self> {
        Rc::new(Self {
            resolver: Resolver::new(vfs.clone()),
            vfs,
            cache: ModuleCache::new(),
            shims,
        })
    }

    /// Registers the native entry points every generated module wrapper and
    /// `createRequire` closure calls into. Must run once per `Context`
    /// before any module is loaded in it.
    pub fn install(self: &Rc<Self>, context: &mut Context) -> JsResult<()> {
        context.insert_data(self.clone());

        let require_fn = require_native
            .into_js_function_copied(context)
            .to_js_function(context.realm());
        context.register_global_property(
            js_string!("__require_native"),
            require_fn,
            Attribute::all(),
        )?;

        context.eval(Source::from_bytes(INTEROP_HELPERS))?;

        // Set globalThis.process/console before any module body runs, so a
        // package reading `process.env` or calling `console.log` at top
        // level (outside of any function) sees a populated global instead
        // of throwing a ReferenceError. Only installed if the host
        // registered a shim for the specifier -- an empty `ShimRegistry`
        // (as in this crate's own unit tests) simply runs without either.
        for name in ["process", "console"] {
            if let Some(shim) = self.shims.get(name) {
                let value = shim.install(context)?;
                context.register_global_property(js_string!(name), value, Attribute::all())?;
            }
        }

        Ok(())
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        self.resolver.clear_cache();
    }

    /// Loads and executes `path` as the program's entry module (the
    /// equivalent of `node path`), returning its `module.exports`.
    pub fn run_file(self: &Rc<Self>, context: &mut Context, path: &str) -> ModuleResult<JsValue> {
        self.load(context, &path::normalize(path))
    }

    /// Implements `require(specifier)` as seen from a module living in
    /// `from_dir`.
    pub fn require(
        self: &Rc<Self>,
        context: &mut Context,
        from_dir: &str,
        specifier: &str,
    ) -> ModuleResult<JsValue> {
        match self.resolver.resolve(from_dir, specifier) {
            ResolvedSpecifier::File(resolved_path) => self.load(context, &resolved_path),
            ResolvedSpecifier::Shim(name) => {
                let shim = self
                    .shims
                    .get(&name)
                    .ok_or_else(|| ModuleError::UnshimmedHostPrimitive(name.clone()))?;
                shim.install(context)
                    .map_err(|e| ModuleError::Evaluation(name, e.to_string()))
            }
            ResolvedSpecifier::NotFound => Err(ModuleError::NotFound(specifier.to_string())),
        }
    }

    /// Builds a bound `require` function for a module living in `from_dir`,
    /// the equivalent of Node's `module.createRequire(fromDir)`.
    pub fn create_require(&self, context: &mut Context, from_dir: &str) -> JsResult<JsValue> {
        let from_dir_json = serde_json::to_string(from_dir).unwrap_or_else(|_| "\"/\"".to_string());
        let source = format!(
            "(function(fromDir) {{\n\
                 return function require(specifier) {{ return __require_native(fromDir, specifier); }};\n\
             }})({from_dir_json})"
        );
        context.eval(Source::from_bytes(source.as_bytes()))
    }

    fn load(self: &Rc<Self>, context: &mut Context, resolved_path: &str) -> ModuleResult<JsValue> {
        if let Some(exports) = self.cache.get(resolved_path) {
            return Ok(exports);
        }

        let mut body = self.vfs.read_to_string(resolved_path)?;
        if esm::needs_esm_rewrite(&body, resolved_path) {
            let (rewritten, _) = esm::rewrite_to_cjs(&body);
            body = rewritten;
        }
        body = esm::rewrite_dynamic_import(&body);
        body = esm::rewrite_import_meta(&body, resolved_path);

        let dirname = path::dirname(resolved_path);
        let module_obj = ObjectInitializer::new(context).build();
        let exports_obj = ObjectInitializer::new(context).build();
        module_obj
            .set(js_string!("exports"), JsValue::from(exports_obj.clone()), false, context)
            .map_err(|e| ModuleError::Evaluation(resolved_path.to_string(), e.to_string()))?;

        self.cache
            .begin_loading(resolved_path, JsValue::from(exports_obj.clone()));

        let require_json = serde_json::to_string(&dirname).unwrap_or_else(|_| "\"/\"".to_string());
        let wrapper_source = format!(
            "(function(module, exports, __filename, __dirname) {{\n\
                 const require = (specifier) => __require_native({require_json}, specifier);\n\
                 const __dynamicImport = (specifier) => Promise.resolve().then(() => __require_native({require_json}, specifier)).then((v) => (v && v.__esModule) ? v : Object.assign({{ default: v }}, (v && typeof v === 'object') ? v : null));\n\
                 {body}\n\
             }})"
        );

        let run = || -> JsResult<JsValue> {
            let wrapper = context.eval(Source::from_bytes(wrapper_source.as_bytes()))?;
            let callable = wrapper.as_callable().ok_or_else(|| {
                JsError::from(
                    JsNativeError::typ().with_message("module body did not evaluate to a function"),
                )
            })?;
            let filename_arg = JsValue::from(JsString::from(resolved_path));
            let dirname_arg = JsValue::from(JsString::from(dirname.as_str()));
            callable.call(
                &JsValue::undefined(),
                &[
                    JsValue::from(module_obj.clone()),
                    JsValue::from(exports_obj.clone()),
                    filename_arg,
                    dirname_arg,
                ],
                context,
            )
        };

        match run() {
            Ok(_) => {
                let final_exports = module_obj
                    .get(js_string!("exports"), context)
                    .unwrap_or_else(|_| JsValue::from(exports_obj));
                self.cache.finish_loading(resolved_path, final_exports.clone());
                Ok(final_exports)
            }
            Err(e) => {
                self.cache.remove(resolved_path);
                Err(ModuleError::Evaluation(resolved_path.to_string(), e.to_string()))
            }
        }
    }
}

/// Installed once per context, this backs both `require(specifier)` (bound
/// through `createRequire`'s generated closure) and `__dynamicImport`.
fn require_native(
    ContextData(runtime): ContextData<Rc<ModuleRuntime>>,
    from_dir: JsString,
    specifier: JsString,
    context: &mut Context,
) -> JsResult<JsValue> {
    let from_dir = from_dir.to_std_string_escaped();
    let specifier = specifier.to_std_string_escaped();
    runtime
        .require(context, &from_dir, &specifier)
        .map_err(|e| JsError::from(JsNativeError::error().with_message(e.to_string())))
}

/// `__interopRequireDefault` mirrors the Babel/TypeScript helper of the
/// same name: a CJS module without an `__esModule` marker is treated as if
/// its entire `module.exports` were the default export.
const INTEROP_HELPERS: &[u8] = br#"
function __interopRequireDefault(mod) {
    return mod && mod.__esModule ? mod : { default: mod };
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc as StdRc;

    fn runtime() -> (Rc<ModuleRuntime>, Vfs) {
        let vfs = Vfs::new(StdRc::new(playground_vfs::LogicalClock::new()));
        (ModuleRuntime::new(vfs.clone(), ShimRegistry::new()), vfs)
    }

    #[test]
    fn run_file_executes_cjs_module_and_caches_exports() {
        let (runtime, vfs) = runtime();
        vfs.write("/a.js", "module.exports = { value: 1 + 1 };").unwrap();
        let mut context = Context::default();
        runtime.install(&mut context).unwrap();

        let exports = runtime.run_file(&mut context, "/a.js").unwrap();
        let value = exports
            .as_object()
            .unwrap()
            .get(js_string!("value"), &mut context)
            .unwrap();
        assert_eq!(value.to_i32(&mut context).unwrap(), 2);

        // Second load is served from cache: mutating the file has no effect.
        vfs.write("/a.js", "module.exports = { value: 999 };").unwrap();
        let cached = runtime.run_file(&mut context, "/a.js").unwrap();
        let cached_value = cached
            .as_object()
            .unwrap()
            .get(js_string!("value"), &mut context)
            .unwrap();
        assert_eq!(cached_value.to_i32(&mut context).unwrap(), 2);
    }

    #[test]
    fn circular_require_sees_partial_exports() {
        let (runtime, vfs) = runtime();
        vfs.write(
            "/a.js",
            "exports.loadedB = require('./b').ready; exports.ready = true;",
        )
        .unwrap();
        vfs.write(
            "/b.js",
            "const a = require('./a'); exports.ready = a.ready === undefined;",
        )
        .unwrap();
        let mut context = Context::default();
        runtime.install(&mut context).unwrap();

        let exports = runtime.run_file(&mut context, "/a.js").unwrap();
        let loaded_b_ready = exports
            .as_object()
            .unwrap()
            .get(js_string!("loadedB"), &mut context)
            .unwrap();
        assert_eq!(loaded_b_ready, JsValue::from(true));
    }

    #[test]
    fn failed_module_body_is_not_cached() {
        let (runtime, vfs) = runtime();
        vfs.write("/broken.js", "throw new Error('boom');").unwrap();
        let mut context = Context::default();
        runtime.install(&mut context).unwrap();

        assert!(runtime.run_file(&mut context, "/broken.js").is_err());
        vfs.write("/broken.js", "module.exports = 1;").unwrap();
        let retried = runtime.run_file(&mut context, "/broken.js").unwrap();
        assert_eq!(retried, JsValue::from(1));
    }
}
