//! The simpler Vite-style dev server: single-file resolution under a
//! root directory, a `sec-fetch-dest`-based CSS module-vs-stylesheet
//! heuristic, and the same React-Refresh preamble + HMR client injection
//! the framework-style server uses.

use rustc_hash::FxHashMap;

use playground_http::{status_text, ResponseRecord};
use playground_transform::{transform_source, TransformState};
use playground_vfs::{path, Vfs};

use crate::error::{DevServerError, DevServerResult};
use crate::html::{hmr_client_script, refresh_preamble_script};

pub const VITE_CHANNEL_TAG: &str = "vite-hmr";

/// Resolves `pathname` to a file under `root`, trying the path verbatim,
/// then each source extension, then `index.html` for a directory request.
fn resolve_file(vfs: &Vfs, root: &str, pathname: &str) -> Option<String> {
    let candidate = path::join(root, pathname.trim_start_matches('/'));
    if vfs.stat(&candidate).map(|s| s.is_file).unwrap_or(false) {
        return Some(candidate);
    }
    for ext in [".html", ".js", ".jsx", ".ts", ".tsx"] {
        let with_ext = format!("{candidate}{ext}");
        if vfs.stat(&with_ext).map(|s| s.is_file).unwrap_or(false) {
            return Some(with_ext);
        }
    }
    let index = path::join(&candidate, "index.html");
    if vfs.stat(&index).map(|s| s.is_file).unwrap_or(false) {
        return Some(index);
    }
    None
}

/// The `sec-fetch-dest`-based heuristic from SPEC_FULL.md §4.5: a CSS file
/// requested with an empty or `script` destination (i.e. imported from JS)
/// is served as a JS module injecting a `<style>` tag; a `style`
/// destination (a real stylesheet `<link>`) is served as raw CSS.
fn css_wants_module_form(headers: &FxHashMap<String, String>) -> bool {
    match headers.get("sec-fetch-dest").map(String::as_str) {
        None | Some("") | Some("script") => true,
        Some("style") => false,
        Some(_) => true,
    }
}

fn css_module_wrapper(css: &str) -> String {
    let json = serde_json::to_string(css).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        "const __css = {json};\nconst __style = document.createElement(\"style\");\n__style.textContent = __css;\ndocument.head.appendChild(__style);\nexport default __css;\n"
    )
}

pub struct ViteServer {
    vfs: Vfs,
    root: String,
    cdn_base_url: String,
}

impl ViteServer {
    pub fn new(vfs: Vfs, root: impl Into<String>, cdn_base_url: impl Into<String>) -> Self {
        Self {
            vfs,
            root: root.into(),
            cdn_base_url: cdn_base_url.into(),
        }
    }

    pub fn handle_request(
        &self,
        transform_state: &TransformState,
        pathname: &str,
        headers: &FxHashMap<String, String>,
    ) -> DevServerResult<ResponseRecord> {
        if pathname == "/__hmr_client__" {
            return Ok(js_response(playground_hmr::HMR_CLIENT_SCRIPT));
        }

        let Some(file) = resolve_file(&self.vfs, &self.root, pathname) else {
            return Ok(not_found());
        };

        if file.ends_with(".html") {
            let body = self.vfs.read_to_string(&file)?;
            return Ok(self.inject_head(&body));
        }

        if file.ends_with(".css") {
            let css = self.vfs.read_to_string(&file)?;
            return Ok(if css_wants_module_form(headers) {
                let mut record = ResponseRecord::json(200, serde_json::Value::Null);
                record.body = css_module_wrapper(&css).into_bytes();
                record.headers.insert("content-type".to_string(), "application/javascript; charset=utf-8".to_string());
                record.headers.insert("content-length".to_string(), record.body.len().to_string());
                record
            } else {
                let mut headers = FxHashMap::default();
                headers.insert("content-type".to_string(), "text/css; charset=utf-8".to_string());
                headers.insert("content-length".to_string(), css.len().to_string());
                ResponseRecord {
                    status_code: 200,
                    status_message: status_text(200).to_string(),
                    headers,
                    body: css.into_bytes(),
                }
            });
        }

        if playground_transform::is_transformable(&file) {
            let source = self.vfs.read_to_string(&file)?;
            let output = transform_source(transform_state, &file, &source)
                .map_err(|e| DevServerError::Transform { path: file.clone(), message: e.to_string() })?;
            let mut record = ResponseRecord::json(200, serde_json::Value::Null);
            record.headers.insert("content-type".to_string(), "application/javascript; charset=utf-8".to_string());
            record.body = output.code.into_bytes();
            record.headers.insert("content-length".to_string(), record.body.len().to_string());
            return Ok(record);
        }

        let bytes = self.vfs.read(&file)?;
        let mut headers = FxHashMap::default();
        headers.insert("content-length".to_string(), bytes.len().to_string());
        Ok(ResponseRecord {
            status_code: 200,
            status_message: status_text(200).to_string(),
            headers,
            body: bytes,
        })
    }

    fn inject_head(&self, html: &str) -> ResponseRecord {
        let injected = format!(
            "{}\n{}",
            refresh_preamble_script(&self.cdn_base_url),
            hmr_client_script(VITE_CHANNEL_TAG)
        );
        let body = if let Some(pos) = html.find("</head>") {
            format!("{}{}{}", &html[..pos], injected, &html[pos..])
        } else {
            format!("{injected}{html}")
        };
        ResponseRecord::html(200, body)
    }
}

fn js_response(source: &str) -> ResponseRecord {
    let mut headers = FxHashMap::default();
    headers.insert("content-type".to_string(), "application/javascript; charset=utf-8".to_string());
    headers.insert("content-length".to_string(), source.len().to_string());
    ResponseRecord { status_code: 200, status_message: status_text(200).to_string(), headers, body: source.as_bytes().to_vec() }
}

fn not_found() -> ResponseRecord {
    let mut headers = FxHashMap::default();
    let body = b"Not Found".to_vec();
    headers.insert("content-type".to_string(), "text/plain; charset=utf-8".to_string());
    headers.insert("content-length".to_string(), body.len().to_string());
    ResponseRecord {
        status_code: 404,
        status_message: status_text(404).to_string(),
        headers,
        body,
    }
}
