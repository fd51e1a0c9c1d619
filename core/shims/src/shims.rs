//! The JS-facing shim objects themselves: thin `HostPrimitive` wrappers that
//! `context.eval` a small IIFE of generated source text and return its
//! result. Each one is self-contained (no shared global prototypes) so
//! installation order between specifiers never matters.
//!
//! Shims that need real computation (`fs`, `process` env/cwd, `crypto`,
//! `zlib`) call into the `__shim_*` natives registered by
//! [`crate::natives::install`]; everything else -- `path`, `events`,
//! `stream`, `buffer`, the always-redirected package stand-ins -- is plain
//! JS with no native backing, mirroring how little of those modules a dev
//! server actually exercises.

use boa_engine::{Context, JsResult, JsValue, Source};

use playground_module::HostPrimitive;

fn eval_iife(context: &mut Context, source: &str) -> JsResult<JsValue> {
    context.eval(Source::from_bytes(source.as_bytes()))
}

/// `require('path')` -- POSIX path algebra. Pure string manipulation;
/// mirrors `playground_vfs::path`'s normalize/join/dirname rules but can't
/// call into Rust directly since plain specifiers carry no native binding,
/// so the rules are restated in JS.
pub struct PathShim;

impl HostPrimitive for PathShim {
    fn install(&self, context: &mut Context) -> JsResult<JsValue> {
        eval_iife(context, PATH_SRC)
    }
}

const PATH_SRC: &str = r#"
(function () {
  function normalize(p) {
    var abs = p.length > 0 && p[0] === '/';
    var parts = p.split('/');
    var out = [];
    for (var i = 0; i < parts.length; i++) {
      var seg = parts[i];
      if (seg === '' || seg === '.') continue;
      if (seg === '..') { if (out.length && out[out.length - 1] !== '..') out.pop(); else if (!abs) out.push('..'); }
      else out.push(seg);
    }
    var joined = out.join('/');
    if (abs) return '/' + joined;
    return joined === '' ? '.' : joined;
  }
  function join() {
    var segs = Array.prototype.slice.call(arguments).filter(function (s) { return s.length > 0; });
    return normalize(segs.join('/'));
  }
  function dirname(p) {
    var n = normalize(p);
    var idx = n.lastIndexOf('/');
    if (idx < 0) return '.';
    if (idx === 0) return '/';
    return n.slice(0, idx);
  }
  function basename(p, ext) {
    var n = normalize(p);
    var idx = n.lastIndexOf('/');
    var base = idx < 0 ? n : n.slice(idx + 1);
    if (ext && base.endsWith(ext) && base !== ext) base = base.slice(0, base.length - ext.length);
    return base;
  }
  function extname(p) {
    var base = basename(p);
    var idx = base.lastIndexOf('.');
    if (idx <= 0) return '';
    return base.slice(idx);
  }
  function isAbsolute(p) { return p.length > 0 && p[0] === '/'; }
  function relative(from, to) {
    var f = normalize(from).split('/').filter(Boolean);
    var t = normalize(to).split('/').filter(Boolean);
    var i = 0;
    while (i < f.length && i < t.length && f[i] === t[i]) i++;
    var up = f.slice(i).map(function () { return '..'; });
    var down = t.slice(i);
    var out = up.concat(down);
    return out.length === 0 ? '.' : out.join('/');
  }
  return {
    sep: '/',
    delimiter: ':',
    normalize: normalize,
    join: join,
    resolve: function () { return normalize(Array.prototype.slice.call(arguments).join('/')); },
    dirname: dirname,
    basename: basename,
    extname: extname,
    isAbsolute: isAbsolute,
    relative: relative,
    parse: function (p) {
      return { root: isAbsolute(p) ? '/' : '', dir: dirname(p), base: basename(p), ext: extname(p), name: basename(p, extname(p)) };
    },
  };
})()
"#;

/// `require('events')` -- a minimal `EventEmitter`: registration, `emit`
/// dispatch in listener-order, `once` auto-removal, and the convention that
/// an unhandled `'error'` emission throws.
pub struct EventsShim;

impl HostPrimitive for EventsShim {
    fn install(&self, context: &mut Context) -> JsResult<JsValue> {
        eval_iife(context, EVENTS_SRC)
    }
}

const EVENTS_SRC: &str = r#"
(function () {
  function EventEmitter() { this._listeners = Object.create(null); }
  EventEmitter.prototype.on = function (name, fn) {
    (this._listeners[name] || (this._listeners[name] = [])).push(fn);
    return this;
  };
  EventEmitter.prototype.once = function (name, fn) {
    var self = this;
    function wrapper() { self.off(name, wrapper); fn.apply(self, arguments); }
    return this.on(name, wrapper);
  };
  EventEmitter.prototype.off = EventEmitter.prototype.removeListener = function (name, fn) {
    var list = this._listeners[name];
    if (!list) return this;
    this._listeners[name] = list.filter(function (l) { return l !== fn; });
    return this;
  };
  EventEmitter.prototype.emit = function (name) {
    var args = Array.prototype.slice.call(arguments, 1);
    var list = this._listeners[name];
    if (!list || list.length === 0) {
      if (name === 'error') {
        var err = args[0];
        throw err instanceof Error ? err : new Error(String(err));
      }
      return false;
    }
    list.slice().forEach(function (l) { l.apply(undefined, args); });
    return true;
  };
  EventEmitter.prototype.listenerCount = function (name) { return (this._listeners[name] || []).length; };
  EventEmitter.prototype.removeAllListeners = function (name) {
    if (name === undefined) this._listeners = Object.create(null);
    else delete this._listeners[name];
    return this;
  };
  return { EventEmitter: EventEmitter };
})()
"#;

/// `require('stream')` -- buffered-queue `Readable`/`Writable`/`Duplex`/
/// `Transform` with `pipe`, built on the same emitter shape as `events`
/// (duplicated rather than shared, since each shim install is independent).
pub struct StreamShim;

impl HostPrimitive for StreamShim {
    fn install(&self, context: &mut Context) -> JsResult<JsValue> {
        eval_iife(context, STREAM_SRC)
    }
}

const STREAM_SRC: &str = r#"
(function () {
  function emitter(obj) {
    obj._listeners = Object.create(null);
    obj.on = function (name, fn) { (this._listeners[name] || (this._listeners[name] = [])).push(fn); return this; };
    obj.once = function (name, fn) { var self = this; function w() { self.off(name, w); fn.apply(self, arguments); } return this.on(name, w); };
    obj.off = obj.removeListener = function (name, fn) {
      var list = this._listeners[name]; if (!list) return this;
      this._listeners[name] = list.filter(function (l) { return l !== fn; }); return this;
    };
    obj.emit = function (name) {
      var args = Array.prototype.slice.call(arguments, 1);
      var list = this._listeners[name];
      if (!list || list.length === 0) { if (name === 'error') throw args[0]; return false; }
      list.slice().forEach(function (l) { l.apply(undefined, args); });
      return true;
    };
    return obj;
  }
  function Readable() {
    emitter(this);
    this._queue = [];
    this._ended = false;
  }
  Readable.prototype.push = function (chunk) {
    if (chunk === null) { this._ended = true; this.emit('end'); return false; }
    this._queue.push(chunk);
    this.emit('data', chunk);
    return true;
  };
  Readable.prototype.pipe = function (dest) {
    this.on('data', function (chunk) { dest.write(chunk); });
    this.on('end', function () { if (dest.end) dest.end(); });
    return dest;
  };
  function Writable() {
    emitter(this);
    this._chunks = [];
    this._finished = false;
  }
  Writable.prototype.write = function (chunk) { this._chunks.push(chunk); this.emit('drain'); return true; };
  Writable.prototype.end = function (chunk) {
    if (chunk !== undefined) this.write(chunk);
    this._finished = true;
    this.emit('finish');
  };
  function Duplex() { Readable.call(this); Writable.call(this); }
  Duplex.prototype.push = Readable.prototype.push;
  Duplex.prototype.pipe = Readable.prototype.pipe;
  Duplex.prototype.write = Writable.prototype.write;
  Duplex.prototype.end = Writable.prototype.end;
  function Transform(transformFn) {
    Duplex.call(this);
    this._transformFn = transformFn || function (chunk) { return chunk; };
  }
  Transform.prototype.push = Duplex.prototype.push;
  Transform.prototype.pipe = Duplex.prototype.pipe;
  Transform.prototype.end = Duplex.prototype.end;
  Transform.prototype.write = function (chunk) {
    this.push(this._transformFn(chunk));
    return true;
  };
  return { Readable: Readable, Writable: Writable, Duplex: Duplex, Transform: Transform };
})()
"#;

/// `require('buffer')` -- a `Buffer` stand-in backed by plain JS arrays of
/// byte values (not a typed array view); sufficient for the `utf8`/`base64`/
/// `hex` conversions packages actually touch when just moving bytes through
/// the module runtime.
pub struct BufferShim;

impl HostPrimitive for BufferShim {
    fn install(&self, context: &mut Context) -> JsResult<JsValue> {
        eval_iife(context, BUFFER_SRC)
    }
}

const BUFFER_SRC: &str = r#"
(function () {
  function bytesFromUtf8(s) {
    var bytes = [];
    for (var i = 0; i < s.length; i++) {
      var code = s.codePointAt(i);
      if (code > 0xffff) i++;
      if (code < 0x80) bytes.push(code);
      else if (code < 0x800) { bytes.push(0xc0 | (code >> 6), 0x80 | (code & 0x3f)); }
      else if (code < 0x10000) { bytes.push(0xe0 | (code >> 12), 0x80 | ((code >> 6) & 0x3f), 0x80 | (code & 0x3f)); }
      else { bytes.push(0xf0 | (code >> 18), 0x80 | ((code >> 12) & 0x3f), 0x80 | ((code >> 6) & 0x3f), 0x80 | (code & 0x3f)); }
    }
    return bytes;
  }
  function utf8FromBytes(bytes) {
    var out = '';
    for (var i = 0; i < bytes.length; i++) {
      var b0 = bytes[i];
      if (b0 < 0x80) { out += String.fromCharCode(b0); continue; }
      if (b0 < 0xe0) { out += String.fromCharCode(((b0 & 0x1f) << 6) | (bytes[++i] & 0x3f)); continue; }
      if (b0 < 0xf0) {
        var b1 = bytes[++i], b2 = bytes[++i];
        out += String.fromCharCode(((b0 & 0x0f) << 12) | ((b1 & 0x3f) << 6) | (b2 & 0x3f));
        continue;
      }
      var b1f = bytes[++i], b2f = bytes[++i], b3f = bytes[++i];
      var cp = ((b0 & 0x07) << 18) | ((b1f & 0x3f) << 12) | ((b2f & 0x3f) << 6) | (b3f & 0x3f);
      out += String.fromCodePoint(cp);
    }
    return out;
  }
  function PlaygroundBuffer(bytes) { this._bytes = bytes; this.length = bytes.length; }
  PlaygroundBuffer.prototype.toString = function (encoding) {
    encoding = encoding || 'utf8';
    if (encoding === 'base64') return __shim_base64_encodeUtf8(utf8FromBytes(this._bytes));
    if (encoding === 'hex') return this._bytes.map(function (b) { return b.toString(16).padStart(2, '0'); }).join('');
    return utf8FromBytes(this._bytes);
  };
  PlaygroundBuffer.prototype.slice = function (start, end) { return new PlaygroundBuffer(this._bytes.slice(start, end)); };
  var Buffer = {
    from: function (input, encoding) {
      if (Array.isArray(input)) return new PlaygroundBuffer(input.slice());
      if (input instanceof PlaygroundBuffer) return new PlaygroundBuffer(input._bytes.slice());
      encoding = encoding || 'utf8';
      if (encoding === 'hex') {
        var bytes = [];
        for (var i = 0; i < input.length; i += 2) bytes.push(parseInt(input.slice(i, i + 2), 16));
        return new PlaygroundBuffer(bytes);
      }
      if (encoding === 'base64') return new PlaygroundBuffer(bytesFromUtf8(__shim_base64_decodeUtf8(String(input))));
      return new PlaygroundBuffer(bytesFromUtf8(String(input)));
    },
    alloc: function (size, fill) {
      var bytes = new Array(size).fill(fill === undefined ? 0 : fill);
      return new PlaygroundBuffer(bytes);
    },
    isBuffer: function (v) { return v instanceof PlaygroundBuffer; },
    concat: function (list) {
      var bytes = [];
      list.forEach(function (b) { bytes = bytes.concat(b._bytes); });
      return new PlaygroundBuffer(bytes);
    },
  };
  return { Buffer: Buffer };
})()
"#;

/// `require('fs')` -- synchronous, VFS-backed. Only the `Sync` surface is
/// exposed: the module runtime never awaits, so the async/callback variants
/// would just be sync calls wearing a `Promise`/callback costume, which
/// nothing in this system's own source relies on.
pub struct FsShim;

impl HostPrimitive for FsShim {
    fn install(&self, context: &mut Context) -> JsResult<JsValue> {
        eval_iife(context, FS_SRC)
    }
}

const FS_SRC: &str = r#"
(function () {
  return {
    readFileSync: function (path, encoding) { return __shim_fs_readFileSync(path); },
    writeFileSync: function (path, data) { return __shim_fs_writeFileSync(path, String(data)); },
    existsSync: function (path) { return __shim_fs_existsSync(path); },
    readdirSync: function (path) { return __shim_fs_readdirSync(path); },
    mkdirSync: function (path, options) { return __shim_fs_mkdirSync(path, !!(options && options.recursive)); },
    statSync: function (path) {
      var s = __shim_fs_statSync(path);
      return {
        isFile: function () { return s.isFile; },
        isDirectory: function () { return s.isDirectory; },
        size: s.size,
        mtimeMs: s.mtimeMs,
      };
    },
  };
})()
"#;

/// `require('process')` -- a mock process: whitelisted env snapshot, cwd
/// tracking through the VFS-rooted `chdir`, an emitter for `on`/`emit`
/// (unused by dev-server code paths but part of the node surface packages
/// probe for), and no-op `stdout`/`stderr` mock streams.
pub struct ProcessShim;

impl HostPrimitive for ProcessShim {
    fn install(&self, context: &mut Context) -> JsResult<JsValue> {
        eval_iife(context, PROCESS_SRC)
    }
}

const PROCESS_SRC: &str = r#"
(function () {
  function emitter(obj) {
    obj._listeners = Object.create(null);
    obj.on = function (name, fn) { (this._listeners[name] || (this._listeners[name] = [])).push(fn); return this; };
    obj.emit = function (name) {
      var args = Array.prototype.slice.call(arguments, 1);
      var list = this._listeners[name];
      if (list) list.slice().forEach(function (l) { l.apply(undefined, args); });
      return !!list;
    };
  }
  function mockStream() {
    var s = {};
    emitter(s);
    s.write = function () { return true; };
    return s;
  }
  var proc = {
    platform: 'browser',
    version: 'v20.0.0-playground',
    versions: { node: '20.0.0-playground' },
    argv: ['node', '/__playground__/entry.js'],
    env: JSON.parse(__shim_process_envJson()),
    stdout: mockStream(),
    stderr: mockStream(),
    cwd: function () { return __shim_process_cwd(); },
    chdir: function (dir) { return __shim_process_chdir(dir); },
    nextTick: function (fn) { var args = Array.prototype.slice.call(arguments, 1); Promise.resolve().then(function () { fn.apply(undefined, args); }); },
    hrtime: function (previous) {
      var ms = Date.now();
      var seconds = Math.floor(ms / 1000);
      var nanos = (ms % 1000) * 1e6;
      if (previous) return [seconds - previous[0], nanos - previous[1]];
      return [seconds, nanos];
    },
    exit: function () {},
  };
  emitter(proc);
  return proc;
})()
"#;

/// `require('console')` (and the `globalThis.console` the module loader
/// installs before any module body runs) -- joins each call's arguments
/// with a space the way Node's `util.format` does for plain values, then
/// hands the level and the joined string to the native writer.
pub struct ConsoleShim;

impl HostPrimitive for ConsoleShim {
    fn install(&self, context: &mut Context) -> JsResult<JsValue> {
        eval_iife(context, CONSOLE_SRC)
    }
}

const CONSOLE_SRC: &str = r#"
(function () {
  function format(args) {
    return Array.prototype.map.call(args, function (a) {
      return typeof a === 'string' ? a : String(a);
    }).join(' ');
  }
  function method(level) {
    return function () { __shim_console_write(level, format(arguments)); };
  }
  return {
    log: method('log'),
    info: method('info'),
    warn: method('warn'),
    error: method('error'),
    debug: method('debug'),
    trace: method('trace'),
  };
})()
"#;

/// `require('crypto')` -- hashing only, per the documented shim surface.
/// `createHash('sha256')` collapses into a one-shot digest backed by the
/// real `sha2` crate rather than a hand-rolled JS implementation.
pub struct CryptoShim;

impl HostPrimitive for CryptoShim {
    fn install(&self, context: &mut Context) -> JsResult<JsValue> {
        eval_iife(context, CRYPTO_SRC)
    }
}

const CRYPTO_SRC: &str = r#"
(function () {
  return {
    createHash: function (algorithm) {
      if (algorithm !== 'sha256') throw new Error("unsupported digest algorithm: " + algorithm);
      var chunks = [];
      return {
        update: function (data) { chunks.push(String(data)); return this; },
        digest: function (encoding) {
          var hex = __shim_crypto_sha256Hex(chunks.join(''));
          if (encoding === 'hex' || encoding === undefined) return hex;
          throw new Error("unsupported digest encoding: " + encoding);
        },
      };
    },
  };
})()
"#;

/// `require('zlib')` -- deflate/inflate/gzip/gunzip, sync only. The real
/// byte-level work happens in `flate2`; this object just base64-shuttles
/// across the native boundary, matching the string-only calling convention
/// `boa_interop`'s `ContextData` extractor gives us.
pub struct ZlibShim;

impl HostPrimitive for ZlibShim {
    fn install(&self, context: &mut Context) -> JsResult<JsValue> {
        eval_iife(context, ZLIB_SRC)
    }
}

const ZLIB_SRC: &str = r#"
(function () {
  function toBase64(input) {
    if (input && typeof input.toString === 'function' && input.constructor && input.constructor.name !== 'String') {
      return input.toString('base64');
    }
    return __shim_base64_encodeUtf8(String(input));
  }
  return {
    deflateSync: function (data) { return __shim_zlib_deflateBase64(toBase64(data)); },
    inflateSync: function (data) { return __shim_base64_decodeUtf8(__shim_zlib_inflateBase64(toBase64(data))); },
    gzipSync: function (data) { return __shim_zlib_gzipBase64(toBase64(data)); },
    gunzipSync: function (data) { return __shim_base64_decodeUtf8(__shim_zlib_gunzipBase64(toBase64(data))); },
  };
})()
"#;

/// `require('http')` / `require('https')` -- per the documented policy
/// these are **mutable copies**: SDKs that monkey-patch `http.request` must
/// each see their own object, so every `install()` call (already true of
/// every shim here) returns a fresh one. The real server surface --
/// binding a `handleRequest` to a port -- lives in the HTTP Model crate;
/// this object only provides the client-ish constructor shape packages
/// probe for (`createServer`, `request`, `STATUS_CODES`) without wiring a
/// live server, since requiring `"http"` directly (rather than going
/// through the dev server's own registration call) isn't itself how a
/// server comes to be registered.
pub struct HttpShim;

impl HostPrimitive for HttpShim {
    fn install(&self, context: &mut Context) -> JsResult<JsValue> {
        eval_iife(context, HTTP_SRC)
    }
}

const HTTP_SRC: &str = r#"
(function () {
  function emitter(obj) {
    obj._listeners = Object.create(null);
    obj.on = function (name, fn) { (this._listeners[name] || (this._listeners[name] = [])).push(fn); return this; };
    obj.emit = function (name) {
      var args = Array.prototype.slice.call(arguments, 1);
      var list = this._listeners[name];
      if (list) list.slice().forEach(function (l) { l.apply(undefined, args); });
      return !!list;
    };
  }
  return {
    STATUS_CODES: { 200: 'OK', 404: 'Not Found', 500: 'Internal Server Error' },
    createServer: function (handler) {
      var server = {};
      emitter(server);
      server._handler = handler;
      server.listen = function (port, cb) { if (cb) cb(); return server; };
      server.close = function (cb) { if (cb) cb(); return server; };
      return server;
    },
    request: function () {
      throw new Error("outbound http.request is not supported in this runtime");
    },
  };
})()
"#;

/// Generic stand-in for the always-redirected package families
/// (`@swc/core`, `esbuild`, `prettier`, the telemetry SDK): each resolves
/// here by specifier prefix or `node_modules` path regardless of whether a
/// real copy is installed. `kind` selects the minimal surface packages
/// actually probe; behavior outside that surface is not guaranteed.
pub struct RedirectedPackageShim {
    pub kind: RedirectedPackageKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedirectedPackageKind {
    NativeTransform,
    NativeBundler,
    Formatter,
    TelemetrySdk,
}

impl HostPrimitive for RedirectedPackageShim {
    fn install(&self, context: &mut Context) -> JsResult<JsValue> {
        let source = match self.kind {
            RedirectedPackageKind::NativeTransform => SWC_CORE_SRC,
            RedirectedPackageKind::NativeBundler => ESBUILD_SRC,
            RedirectedPackageKind::Formatter => PRETTIER_SRC,
            RedirectedPackageKind::TelemetrySdk => ANALYTICS_SDK_SRC,
        };
        eval_iife(context, source)
    }
}

/// Real transforms go through the dedicated transform capability; a
/// package that imports `@swc/core` directly just needs its calls to be
/// harmless no-ops that echo input back.
const SWC_CORE_SRC: &str = r#"
(function () {
  function transformSync(code) { return { code: code, map: null }; }
  return {
    transformSync: transformSync,
    transform: function (code) { return Promise.resolve(transformSync(code)); },
    transformFileSync: function () { throw new Error("@swc/core file transforms are not supported in this runtime"); },
  };
})()
"#;

const ESBUILD_SRC: &str = r#"
(function () {
  function transformSync(code) { return { code: code, map: '', warnings: [] }; }
  return {
    transformSync: transformSync,
    transform: function (code) { return Promise.resolve(transformSync(code)); },
    build: function () { return Promise.reject(new Error("esbuild.build is not supported in this runtime")); },
  };
})()
"#;

const PRETTIER_SRC: &str = r#"
(function () {
  return {
    format: function (code) { return Promise.resolve(code); },
    check: function () { return Promise.resolve(true); },
  };
})()
"#;

const ANALYTICS_SDK_SRC: &str = r#"
(function () {
  return {
    track: function () {},
    identify: function () {},
    flush: function () { return Promise.resolve(); },
  };
})()
"#;
