//! The service worker itself is never run by this engine -- a real
//! `ServiceWorkerGlobalScope` only exists in an actual browser, the same
//! reason [`playground_devserver::html`]'s React-Refresh preamble and HMR
//! client are hand-authored template strings rather than transformed
//! modules. This is the literal script the page registers with
//! `navigator.serviceWorker.register`.

/// Debug escape hatch query parameter: short-circuits to a fixed 200 with a
/// static body, bypassing server dispatch entirely.
pub const HEALTH_CHECK_PARAM: &str = "__sw_health";

/// Debug escape hatch query parameter: echoes the request body back,
/// base64-encoded, instead of dispatching to a server.
pub const ECHO_PARAM: &str = "__sw_echo";

/// 30s per §4.6/§5; matches the handler-side deadline Component D's
/// mock-response dispatch documents as its own unextendable bound.
pub const REQUEST_TIMEOUT_MS: u32 = 30_000;

pub const VIRTUAL_PREFIX: &str = "/__virtual__/";

/// Renders the worker script. `virtual_prefix` is injected rather than
/// hardcoded so a test can point it at a scoped prefix without string-
/// patching the template.
pub fn render_worker_script(virtual_prefix: &str) -> String {
    format!(
        r#"// Generated service worker. Do not edit by hand.
const VIRTUAL_PREFIX = {virtual_prefix:?};
const REQUEST_TIMEOUT_MS = {REQUEST_TIMEOUT_MS};
const HEALTH_CHECK_PARAM = {HEALTH_CHECK_PARAM:?};
const ECHO_PARAM = {ECHO_PARAM:?};

let port = null;
let nextRequestId = 1;
const pending = new Map();

self.addEventListener("message", (event) => {{
  const message = event.data;
  if (message && message.type === "init") {{
    port = event.ports[0];
    port.onmessage = (portEvent) => handlePortMessage(portEvent.data);
  }}
}});

function handlePortMessage(message) {{
  if (!message || typeof message.id !== "number") return;
  const waiter = pending.get(message.id);
  if (!waiter) return;
  pending.delete(message.id);
  if (message.error) {{
    waiter.reject(new Error(message.error));
  }} else {{
    waiter.resolve(message.data);
  }}
}}

function sendRequest(portPart, method, url, headers, bodyBytes) {{
  const id = nextRequestId++;
  const envelope = {{ id, port: portPart, method, url, headers, body: bodyBytes }};
  return new Promise((resolve, reject) => {{
    const timer = setTimeout(() => {{
      pending.delete(id);
      reject(new Error("service worker request timed out"));
    }}, REQUEST_TIMEOUT_MS);
    pending.set(id, {{
      resolve: (data) => {{ clearTimeout(timer); resolve(data); }},
      reject: (error) => {{ clearTimeout(timer); reject(error); }},
    }});
    port.postMessage(envelope);
  }});
}}

function base64ToBlob(base64, contentType) {{
  const binary = atob(base64 || "");
  const bytes = new Uint8Array(binary.length);
  for (let i = 0; i < binary.length; i++) bytes[i] = binary.charCodeAt(i);
  return new Blob([bytes], {{ type: contentType || "application/octet-stream" }});
}}

function withForcedHeaders(headers) {{
  const out = new Headers(headers);
  out.set("Cross-Origin-Embedder-Policy", "credentialless");
  out.set("Cross-Origin-Opener-Policy", "same-origin");
  out.set("Cross-Origin-Resource-Policy", "cross-origin");
  out.delete("X-Frame-Options");
  return out;
}}

self.addEventListener("fetch", (event) => {{
  const url = new URL(event.request.url);
  if (!url.pathname.startsWith(VIRTUAL_PREFIX)) return;

  const rest = url.pathname.slice(VIRTUAL_PREFIX.length);
  const slash = rest.indexOf("/");
  const portPart = Number(slash === -1 ? rest : rest.slice(0, slash));
  if (!Number.isInteger(portPart)) return;

  if (url.searchParams.has(HEALTH_CHECK_PARAM)) {{
    event.respondWith(new Response("ok", {{ status: 200 }}));
    return;
  }}

  event.respondWith(
    (async () => {{
      const headers = {{}};
      for (const [name, value] of event.request.headers.entries()) headers[name] = value;
      const bodyBuffer = event.request.body ? await event.request.arrayBuffer() : null;
      const bodyBytes = bodyBuffer ? Array.from(new Uint8Array(bodyBuffer)) : null;

      if (url.searchParams.has(ECHO_PARAM)) {{
        const echoed = btoa(String.fromCharCode(...(bodyBytes || [])));
        return new Response(base64ToBlob(echoed, "application/octet-stream"), {{
          status: 200,
          headers: withForcedHeaders({{ "content-type": "application/octet-stream" }}),
        }});
      }}

      if (!port) {{
        return new Response("service worker bridge not initialized", {{ status: 503 }});
      }}

      try {{
        const data = await sendRequest(portPart, event.request.method, url.pathname + url.search, headers, bodyBytes);
        const responseHeaders = withForcedHeaders(data.headers || {{}});
        return new Response(base64ToBlob(data.bodyBase64, responseHeaders.get("content-type")), {{
          status: data.statusCode,
          statusText: data.statusMessage,
          headers: responseHeaders,
        }});
      }} catch (error) {{
        return new Response(String(error && error.message ? error.message : error), {{ status: 500 }});
      }}
    }})()
  );
}});

self.addEventListener("install", () => self.skipWaiting());
self.addEventListener("activate", (event) => event.waitUntil(self.clients.claim()));
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_intercepts_the_virtual_prefix() {
        let script = render_worker_script(VIRTUAL_PREFIX);
        assert!(script.contains("url.pathname.startsWith(VIRTUAL_PREFIX)"));
        assert!(script.contains("\"/__virtual__/\""));
    }

    #[test]
    fn script_enforces_the_request_timeout() {
        let script = render_worker_script(VIRTUAL_PREFIX);
        assert!(script.contains("REQUEST_TIMEOUT_MS = 30000"));
        assert!(script.contains("setTimeout"));
    }

    #[test]
    fn script_forces_cross_origin_headers_and_strips_frame_options() {
        let script = render_worker_script(VIRTUAL_PREFIX);
        assert!(script.contains("Cross-Origin-Embedder-Policy"));
        assert!(script.contains("credentialless"));
        assert!(script.contains("Cross-Origin-Opener-Policy"));
        assert!(script.contains("Cross-Origin-Resource-Policy"));
        assert!(script.contains("out.delete(\"X-Frame-Options\")"));
    }

    #[test]
    fn script_exposes_debug_escape_hatches() {
        let script = render_worker_script(VIRTUAL_PREFIX);
        assert!(script.contains(HEALTH_CHECK_PARAM));
        assert!(script.contains(ECHO_PARAM));
    }

    #[test]
    fn script_honors_a_custom_virtual_prefix() {
        let script = render_worker_script("/__scoped__/");
        assert!(script.contains("\"/__scoped__/\""));
    }
}
