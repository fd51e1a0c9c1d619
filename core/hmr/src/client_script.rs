//! The iframe-side HMR client, served at the well-known `/__hmr_client__`
//! path the HTML preamble (`crate::html::hmr_client_script` over in the dev
//! server) imports and calls `applyUpdate` on. Hand-authored for the same
//! reason [`playground_sw_bridge::render_worker_script`] is: there is no
//! real DOM (`<link>`/`<style>` elements, dynamic `import()` against a live
//! module graph) for this engine to drive, only a real browser iframe.

pub const HMR_CLIENT_SCRIPT: &str = r#"// Generated HMR client. Do not edit by hand.
export function applyUpdate(message) {
  if (message.type === "full-reload") {
    location.reload();
    return;
  }
  if (message.path.endsWith(".css")) {
    applyCssUpdate(message);
    return;
  }
  applySourceUpdate(message);
}

function applyCssUpdate(message) {
  const link = Array.from(document.querySelectorAll("link[rel=stylesheet]")).find((el) => {
    const url = new URL(el.href, location.href);
    return url.pathname === message.path;
  });
  if (link) {
    const url = new URL(link.href, location.href);
    url.searchParams.set("t", String(message.timestamp));
    link.href = url.toString();
    return;
  }
  const style = document.querySelector(`style[data-id="${message.path}"]`);
  if (style) {
    import(`${message.path}?t=${message.timestamp}`).catch(() => location.reload());
  }
}

let pendingSourceUpdates = [];
let flushTimer = null;

function applySourceUpdate(message) {
  pendingSourceUpdates.push(message);
  if (flushTimer) return;
  flushTimer = setTimeout(flushSourceUpdates, 30);
}

async function flushSourceUpdates() {
  const batch = pendingSourceUpdates;
  pendingSourceUpdates = [];
  flushTimer = null;
  try {
    await Promise.all(batch.map((update) => import(`${update.path}?t=${update.timestamp}`)));
    if (window.$RefreshRuntime$) {
      window.$RefreshRuntime$.performReactRefresh();
    }
  } catch (error) {
    console.error(error);
    location.reload();
  }
}
"#;
