//! Host-primitive shims: minimal behavioral stand-ins for the runtime
//! standard library the module loader injects in place of a real install
//! under `node_modules` (`fs`, `path`, `process`, `events`, `stream`,
//! `buffer`, `http`, `https`, `crypto`, `zlib`) plus the always-redirected
//! package families (`@swc/core`, `esbuild`, `prettier`, the telemetry SDK).

mod natives;
mod shims;
mod state;

use std::rc::Rc;

use boa_engine::{Context, JsResult};

use playground_module::ShimRegistry;

pub use shims::{RedirectedPackageKind, RedirectedPackageShim};
pub use state::ShimState;

/// Registers the native entry points (fs/process/crypto/zlib) into
/// `context` and builds the [`ShimRegistry`] the module runtime consults
/// for every specifier in [`playground_module::HOST_PRIMITIVE_SPECIFIERS`]
/// plus [`playground_module::ALWAYS_REDIRECTED_PACKAGES`]. Must run once
/// per `Context`, before the first `require` of a shimmed specifier.
pub fn install(context: &mut Context, state: Rc<ShimState>) -> JsResult<ShimRegistry> {
    natives::install(context, state)?;

    let mut registry = ShimRegistry::new();
    registry.register("path", Rc::new(shims::PathShim));
    registry.register("process", Rc::new(shims::ProcessShim));
    registry.register("console", Rc::new(shims::ConsoleShim));
    registry.register("events", Rc::new(shims::EventsShim));
    registry.register("stream", Rc::new(shims::StreamShim));
    registry.register("buffer", Rc::new(shims::BufferShim));
    registry.register("fs", Rc::new(shims::FsShim));
    registry.register("crypto", Rc::new(shims::CryptoShim));
    registry.register("zlib", Rc::new(shims::ZlibShim));
    registry.register("http", Rc::new(shims::HttpShim));
    registry.register("https", Rc::new(shims::HttpShim));

    registry.register(
        "@swc/core",
        Rc::new(RedirectedPackageShim { kind: RedirectedPackageKind::NativeTransform }),
    );
    registry.register(
        "esbuild",
        Rc::new(RedirectedPackageShim { kind: RedirectedPackageKind::NativeBundler }),
    );
    registry.register(
        "prettier",
        Rc::new(RedirectedPackageShim { kind: RedirectedPackageKind::Formatter }),
    );
    registry.register(
        "analytics-sdk",
        Rc::new(RedirectedPackageShim { kind: RedirectedPackageKind::TelemetrySdk }),
    );

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use boa_engine::{js_string, Context, Source};
    use playground_vfs::{LogicalClock, Vfs};

    use super::*;

    fn new_context_with_shims() -> (Context, ShimRegistry) {
        let vfs = Vfs::new(Rc::new(LogicalClock::new()));
        let mut env = BTreeMap::new();
        env.insert("NEXT_PUBLIC_FOO".to_string(), "bar".to_string());
        let state = ShimState::new(vfs, env);
        let mut context = Context::default();
        let registry = install(&mut context, state).expect("install shims");
        (context, registry)
    }

    #[test]
    fn path_shim_joins_and_normalizes() {
        let (mut context, registry) = new_context_with_shims();
        let path_mod = registry_get(&registry, "path").install(&mut context).unwrap();
        context.register_global_property(js_string!("path"), path_mod, boa_engine::property::Attribute::all()).unwrap();
        let result = context
            .eval(Source::from_bytes(b"path.join('/a', './b', '../c')"))
            .unwrap();
        assert_eq!(result.as_string().unwrap().to_std_string_escaped(), "/a/c");
    }

    #[test]
    fn events_shim_dispatches_and_supports_once() {
        let (mut context, registry) = new_context_with_shims();
        let events_mod = registry_get(&registry, "events").install(&mut context).unwrap();
        context.register_global_property(js_string!("events"), events_mod, boa_engine::property::Attribute::all()).unwrap();
        let result = context
            .eval(Source::from_bytes(
                b"(function(){ var e = new events.EventEmitter(); var seen = 0; \
                  e.once('tick', function(){ seen++; }); e.emit('tick'); e.emit('tick'); return seen; })()",
            ))
            .unwrap();
        assert_eq!(result.as_number().unwrap(), 1.0);
    }

    #[test]
    fn buffer_shim_round_trips_base64() {
        let (mut context, registry) = new_context_with_shims();
        let buffer_mod = registry_get(&registry, "buffer").install(&mut context).unwrap();
        context.register_global_property(js_string!("buffer"), buffer_mod, boa_engine::property::Attribute::all()).unwrap();
        let result = context
            .eval(Source::from_bytes(
                b"buffer.Buffer.from('hello', 'utf8').toString('base64')",
            ))
            .unwrap();
        assert_eq!(result.as_string().unwrap().to_std_string_escaped(), "aGVsbG8=");
    }

    #[test]
    fn crypto_shim_hashes_sha256() {
        let (mut context, registry) = new_context_with_shims();
        let crypto_mod = registry_get(&registry, "crypto").install(&mut context).unwrap();
        context.register_global_property(js_string!("crypto"), crypto_mod, boa_engine::property::Attribute::all()).unwrap();
        let result = context
            .eval(Source::from_bytes(
                b"crypto.createHash('sha256').update('abc').digest('hex')",
            ))
            .unwrap();
        assert_eq!(
            result.as_string().unwrap().to_std_string_escaped(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
        );
    }

    #[test]
    fn process_shim_exposes_whitelisted_env() {
        let (mut context, registry) = new_context_with_shims();
        let process_mod = registry_get(&registry, "process").install(&mut context).unwrap();
        context.register_global_property(js_string!("process"), process_mod, boa_engine::property::Attribute::all()).unwrap();
        let result = context
            .eval(Source::from_bytes(b"process.env.NEXT_PUBLIC_FOO"))
            .unwrap();
        assert_eq!(result.as_string().unwrap().to_std_string_escaped(), "bar");
    }

    #[test]
    fn console_shim_exposes_log_and_error_as_callables() {
        let (mut context, registry) = new_context_with_shims();
        let console_mod = registry_get(&registry, "console").install(&mut context).unwrap();
        context.register_global_property(js_string!("console"), console_mod, boa_engine::property::Attribute::all()).unwrap();
        let result = context
            .eval(Source::from_bytes(
                b"(function(){ console.log('hi', 1); console.error('boom'); return typeof console.log === 'function' && typeof console.warn === 'function'; })()",
            ))
            .unwrap();
        assert_eq!(result.as_boolean().unwrap(), true);
    }

    #[test]
    fn redirected_package_shims_are_closed_set() {
        let (_context, registry) = new_context_with_shims();
        assert!(registry_get_opt(&registry, "@swc/core").is_some());
        assert!(registry_get_opt(&registry, "esbuild").is_some());
        assert!(registry_get_opt(&registry, "prettier").is_some());
        assert!(registry_get_opt(&registry, "analytics-sdk").is_some());
        assert!(registry_get_opt(&registry, "left-pad").is_none());
    }

    fn registry_get<'a>(registry: &'a ShimRegistry, specifier: &str) -> &'a Rc<dyn playground_module::HostPrimitive> {
        registry.get(specifier).expect("shim registered")
    }

    fn registry_get_opt<'a>(
        registry: &'a ShimRegistry,
        specifier: &str,
    ) -> Option<&'a Rc<dyn playground_module::HostPrimitive>> {
        registry.get(specifier)
    }
}
