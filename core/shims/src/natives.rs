//! Native (Rust-backed) entry points the JS-side shim objects call into for
//! filesystem access, hashing, and compression -- the things that cannot be
//! expressed as plain JS running inside the sandboxed engine.

use std::rc::Rc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use boa_engine::{js_string, Context, JsError, JsNativeError, JsResult, JsString, JsValue, NativeFunction};
use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_interop::{ContextData, IntoJsFunctionCopied};
use flate2::read::{GzDecoder, GzEncoder, ZlibDecoder, ZlibEncoder};
use flate2::Compression;
use sha2::{Digest, Sha256};
use std::io::Read;

use crate::state::ShimState;

fn to_js_err(message: impl std::fmt::Display) -> JsError {
    JsError::from(JsNativeError::error().with_message(message.to_string()))
}

fn fs_read_file_sync(
    ContextData(state): ContextData<Rc<ShimState>>,
    path: JsString,
) -> JsResult<JsValue> {
    let path = path.to_std_string_escaped();
    let text = state.vfs.read_to_string(&path).map_err(to_js_err)?;
    Ok(JsValue::from(js_string!(text)))
}

fn fs_write_file_sync(
    ContextData(state): ContextData<Rc<ShimState>>,
    path: JsString,
    data: JsString,
) -> JsResult<JsValue> {
    let path = path.to_std_string_escaped();
    let data = data.to_std_string_escaped();
    state.vfs.write(&path, data).map_err(to_js_err)?;
    Ok(JsValue::undefined())
}

fn fs_exists_sync(ContextData(state): ContextData<Rc<ShimState>>, path: JsString) -> JsResult<JsValue> {
    Ok(JsValue::from(state.vfs.exists(&path.to_std_string_escaped())))
}

fn fs_readdir_sync(
    ContextData(state): ContextData<Rc<ShimState>>,
    path: JsString,
    context: &mut Context,
) -> JsResult<JsValue> {
    let entries = state
        .vfs
        .readdir(&path.to_std_string_escaped())
        .map_err(to_js_err)?;
    let json = serde_json::to_string(&entries).unwrap_or_else(|_| "[]".to_string());
    context.eval(boa_engine::Source::from_bytes(format!("({json})").as_bytes()))
}

fn fs_mkdir_sync(
    ContextData(state): ContextData<Rc<ShimState>>,
    path: JsString,
    recursive: bool,
) -> JsResult<JsValue> {
    state
        .vfs
        .mkdir(&path.to_std_string_escaped(), playground_vfs::DirOptions { recursive })
        .map_err(to_js_err)?;
    Ok(JsValue::undefined())
}

fn fs_stat_sync(
    ContextData(state): ContextData<Rc<ShimState>>,
    path: JsString,
    context: &mut Context,
) -> JsResult<JsValue> {
    let stat = state
        .vfs
        .stat(&path.to_std_string_escaped())
        .map_err(to_js_err)?;
    let attribute = Attribute::default();
    let obj = ObjectInitializer::new(context)
        .property(js_string!("isFile"), stat.is_file, attribute)
        .property(js_string!("isDirectory"), stat.is_directory, attribute)
        .property(js_string!("size"), stat.size as f64, attribute)
        .property(js_string!("mtimeMs"), stat.mtime as f64, attribute)
        .build();
    Ok(JsValue::from(obj))
}

fn process_cwd(ContextData(state): ContextData<Rc<ShimState>>) -> JsResult<JsValue> {
    Ok(JsValue::from(js_string!(state.cwd.borrow().clone())))
}

/// Backs every `console.*` method: the JS side has already joined its
/// arguments into one string and passed the level as the first argument,
/// so this just picks the stream. `error` and `warn` go to stderr,
/// matching Node; everything else goes to stdout.
fn console_write(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let level = args
        .first()
        .and_then(JsValue::as_string)
        .map(JsString::to_std_string_escaped)
        .unwrap_or_default();
    let message = args
        .get(1)
        .and_then(JsValue::as_string)
        .map(JsString::to_std_string_escaped)
        .unwrap_or_default();
    match level.as_str() {
        "error" | "warn" => eprintln!("{message}"),
        _ => println!("{message}"),
    }
    Ok(JsValue::undefined())
}

fn process_chdir(ContextData(state): ContextData<Rc<ShimState>>, path: JsString) -> JsResult<JsValue> {
    *state.cwd.borrow_mut() = playground_vfs::path::normalize(&path.to_std_string_escaped());
    Ok(JsValue::undefined())
}

fn process_env_json(ContextData(state): ContextData<Rc<ShimState>>) -> JsResult<JsValue> {
    let json = serde_json::to_string(&state.env).unwrap_or_else(|_| "{}".to_string());
    Ok(JsValue::from(js_string!(json)))
}

/// Plain base64 transcoding, used wherever JS-side code needs it and has
/// no `btoa`/`atob` global to reach for -- this engine is embedded with no
/// DOM, so those browser-only globals don't exist here.
fn base64_encode_utf8(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let text = args
        .first()
        .and_then(JsValue::as_string)
        .ok_or_else(|| to_js_err("base64Encode(text): text must be a string"))?
        .to_std_string_escaped();
    Ok(JsValue::from(js_string!(BASE64.encode(text.as_bytes()))))
}

fn base64_decode_utf8(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    let encoded = args
        .first()
        .and_then(JsValue::as_string)
        .ok_or_else(|| to_js_err("base64Decode(data): data must be a string"))?
        .to_std_string_escaped();
    let bytes = BASE64.decode(encoded).map_err(to_js_err)?;
    let text = String::from_utf8(bytes).map_err(to_js_err)?;
    Ok(JsValue::from(js_string!(text)))
}

/// `crypto.createHash('sha256').update(data).digest('hex')` collapsed into
/// a single call -- this shim only ever needs one-shot digests, not the
/// streaming `Hash` object shape.
fn crypto_sha256_hex(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let data = args
        .first()
        .and_then(JsValue::as_string)
        .ok_or_else(|| to_js_err("sha256(data): data must be a string"))?
        .to_std_string_escaped();
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    let digest = hasher.finalize();
    let hex = digest.iter().map(|b| format!("{b:02x}")).collect::<String>();
    let _ = context;
    Ok(JsValue::from(js_string!(hex)))
}

fn zlib_deflate_base64(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    run_codec(args, |bytes| {
        let mut encoder = ZlibEncoder::new(bytes, Compression::default());
        let mut out = Vec::new();
        encoder.read_to_end(&mut out).map_err(to_js_err)?;
        Ok(out)
    })
}

fn zlib_inflate_base64(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    run_codec(args, |bytes| {
        let mut decoder = ZlibDecoder::new(bytes);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).map_err(to_js_err)?;
        Ok(out)
    })
}

fn zlib_gzip_base64(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    run_codec(args, |bytes| {
        let mut encoder = GzEncoder::new(bytes, Compression::default());
        let mut out = Vec::new();
        encoder.read_to_end(&mut out).map_err(to_js_err)?;
        Ok(out)
    })
}

fn zlib_gunzip_base64(_this: &JsValue, args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    run_codec(args, |bytes| {
        let mut decoder = GzDecoder::new(bytes);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).map_err(to_js_err)?;
        Ok(out)
    })
}

fn run_codec(
    args: &[JsValue],
    f: impl FnOnce(&[u8]) -> JsResult<Vec<u8>>,
) -> JsResult<JsValue> {
    let input_b64 = args
        .first()
        .and_then(JsValue::as_string)
        .ok_or_else(|| to_js_err("expected a base64-encoded string argument"))?
        .to_std_string_escaped();
    let bytes = BASE64.decode(input_b64).map_err(to_js_err)?;
    let output = f(&bytes)?;
    Ok(JsValue::from(js_string!(BASE64.encode(output))))
}

/// Registers every native entry point under a fixed `__shim_*` global name.
/// The JS-side shim objects built by [`crate::shims`] call these directly;
/// nothing here is reachable from user code under its native name.
pub fn install(context: &mut Context, state: Rc<ShimState>) -> JsResult<()> {
    context.insert_data(state);

    macro_rules! register_copied {
        ($name:expr, $f:expr) => {{
            let f = ($f).into_js_function_copied(context).to_js_function(context.realm());
            context.register_global_property(js_string!($name), f, Attribute::all())?;
        }};
    }

    register_copied!("__shim_fs_readFileSync", fs_read_file_sync);
    register_copied!("__shim_fs_writeFileSync", fs_write_file_sync);
    register_copied!("__shim_fs_existsSync", fs_exists_sync);
    register_copied!("__shim_fs_readdirSync", fs_readdir_sync);
    register_copied!("__shim_fs_mkdirSync", fs_mkdir_sync);
    register_copied!("__shim_fs_statSync", fs_stat_sync);
    register_copied!("__shim_process_cwd", process_cwd);
    register_copied!("__shim_process_chdir", process_chdir);
    register_copied!("__shim_process_envJson", process_env_json);

    macro_rules! register_fn_ptr {
        ($name:expr, $f:expr, $arity:expr) => {{
            let holder = ObjectInitializer::new(context)
                .function(NativeFunction::from_fn_ptr($f), js_string!($name), $arity)
                .build();
            let value = holder.get(js_string!($name), context)?;
            context.register_global_property(js_string!($name), value, Attribute::all())?;
        }};
    }

    register_fn_ptr!("__shim_base64_encodeUtf8", base64_encode_utf8, 1);
    register_fn_ptr!("__shim_base64_decodeUtf8", base64_decode_utf8, 1);
    register_fn_ptr!("__shim_crypto_sha256Hex", crypto_sha256_hex, 1);
    register_fn_ptr!("__shim_zlib_deflateBase64", zlib_deflate_base64, 1);
    register_fn_ptr!("__shim_zlib_inflateBase64", zlib_inflate_base64, 1);
    register_fn_ptr!("__shim_zlib_gzipBase64", zlib_gzip_base64, 1);
    register_fn_ptr!("__shim_zlib_gunzipBase64", zlib_gunzip_base64, 1);
    register_fn_ptr!("__shim_console_write", console_write, 2);

    Ok(())
}
