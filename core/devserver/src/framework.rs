//! The framework-style server: the full eleven-step URL pipeline from
//! SPEC_FULL.md §4.5, backed by [`crate::route`] resolution,
//! [`crate::html`] document generation, and [`playground_module`] /
//! [`playground_http`] for handler execution.

use std::rc::Rc;

use boa_engine::{js_string, Context, JsValue};
use rustc_hash::FxHashMap;

use playground_http::{dispatch_node_style, dispatch_web_style, status_text, MockRequest, ResponseRecord};
use playground_module::ModuleRuntime;
use playground_transform::{transform_source, TransformState};
use playground_vfs::{path, Vfs};

use crate::config::DevServerConfig;
use crate::error::{DevServerError, DevServerResult};
use crate::html::{render_document, DocumentOptions};
use crate::route::{self, RouteResolution};
use crate::shims;

pub const FRAMEWORK_CHANNEL_TAG: &str = "next-hmr";

#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub method: String,
    pub url: String,
    pub headers: FxHashMap<String, String>,
    pub body: Option<Vec<u8>>,
}

pub struct FrameworkServer {
    vfs: Vfs,
    config: DevServerConfig,
    cdn_base_url: String,
}

impl FrameworkServer {
    pub fn new(vfs: Vfs, config: DevServerConfig, cdn_base_url: impl Into<String>) -> Self {
        Self {
            vfs,
            config,
            cdn_base_url: cdn_base_url.into(),
        }
    }

    pub fn handle_request(
        &self,
        context: &mut Context,
        runtime: &Rc<ModuleRuntime>,
        transform_state: &TransformState,
        port: u16,
        request: &IncomingRequest,
    ) -> DevServerResult<ResponseRecord> {
        let (raw_path, query) = split_query(&request.url);
        let stripped = strip_virtual_prefix(&raw_path, port);
        let pathname = strip_asset_and_base_path(&stripped, &self.config);

        if pathname == "/__hmr_client__" {
            return Ok(js_response(playground_hmr::HMR_CLIENT_SCRIPT));
        }

        if let Some(name) = pathname.strip_prefix("/_next/shims/") {
            return Ok(match shims::shim_source(name) {
                Some(source) => js_response(source),
                None => not_found_record(),
            });
        }

        if pathname == "/_next/route-info" {
            return Ok(self.route_info_response(query.get("pathname").map(String::as_str).unwrap_or("/")));
        }

        if let Some(rest) = pathname.strip_prefix("/_next/static/") {
            let candidate = path::join("/_next/static", rest);
            return self.serve_verbatim(&candidate);
        }

        let app_router_active = !route::pages_router_active(&self.vfs, self.config.prefer_app_router, &self.config.app_dir);

        if app_router_active {
            if let RouteResolution::RouteHandler { file, params } = route::resolve_app_route(&self.vfs, &self.config.app_dir, &pathname) {
                return self.execute_web_handler(context, runtime, &file, request, params);
            }
        }

        if !app_router_active {
            if let Some(rest) = pathname.strip_prefix("/api/") {
                if let Some((file, _params)) = route::resolve_pages_route(&self.vfs, &path::join(&self.config.pages_dir, "api"), &format!("/{rest}")) {
                    return self.execute_node_handler(context, runtime, &file, request);
                }
            }
        }

        let public_candidate = path::join(&self.config.public_dir, pathname.trim_start_matches('/'));
        if self.vfs.stat(&public_candidate).map(|s| s.is_file).unwrap_or(false) {
            return self.serve_verbatim(&public_candidate);
        }

        if playground_transform::is_transformable(&pathname) && self.vfs.exists(&pathname) {
            return self.transform_and_serve(transform_state, &pathname);
        }

        if let Some(resolved) = extensionless_resolve(&self.vfs, &pathname) {
            return self.transform_and_serve(transform_state, &resolved);
        }

        self.render_page_route(port, &pathname)
    }

    fn route_info_response(&self, target_pathname: &str) -> ResponseRecord {
        let resolution = self.resolve_any(target_pathname);
        let (found, params) = match resolution {
            RouteResolution::Page { params, .. } => (true, params),
            RouteResolution::ApiHandler { params, .. } => (true, params),
            RouteResolution::RouteHandler { params, .. } => (true, params),
            RouteResolution::NotFound => (false, FxHashMap::default()),
        };
        ResponseRecord::json(200, serde_json::json!({ "params": params, "found": found }))
    }

    fn resolve_any(&self, pathname: &str) -> RouteResolution {
        let app_router_active = !route::pages_router_active(&self.vfs, self.config.prefer_app_router, &self.config.app_dir);
        if app_router_active {
            let resolved = route::resolve_app_route(&self.vfs, &self.config.app_dir, pathname);
            if resolved != RouteResolution::NotFound {
                return resolved;
            }
        }
        match route::resolve_pages_route(&self.vfs, &self.config.pages_dir, pathname) {
            Some((file, params)) => RouteResolution::Page { file, params, layout_chain: Vec::new() },
            None => RouteResolution::NotFound,
        }
    }

    fn render_page_route(&self, port: u16, pathname: &str) -> DevServerResult<ResponseRecord> {
        match self.resolve_any(pathname) {
            RouteResolution::Page { file, layout_chain, .. } => {
                let body = render_document(&DocumentOptions {
                    port,
                    page_file: &file,
                    layout_chain: &layout_chain,
                    config: &self.config,
                    channel_tag: FRAMEWORK_CHANNEL_TAG,
                    cdn_base_url: &self.cdn_base_url,
                    status_code: 200,
                });
                Ok(ResponseRecord::html(200, body))
            }
            _ => self.render_not_found(port),
        }
    }

    fn render_not_found(&self, port: u16) -> DevServerResult<ResponseRecord> {
        let custom = find_not_found_page(&self.vfs, &self.config);
        let body = match custom {
            Some(file) => render_document(&DocumentOptions {
                port,
                page_file: &file,
                layout_chain: &[],
                config: &self.config,
                channel_tag: FRAMEWORK_CHANNEL_TAG,
                cdn_base_url: &self.cdn_base_url,
                status_code: 404,
            }),
            None => "<!doctype html>\n<html><body>404</body></html>\n".to_string(),
        };
        Ok(ResponseRecord::html(404, body))
    }

    fn execute_node_handler(
        &self,
        context: &mut Context,
        runtime: &Rc<ModuleRuntime>,
        file: &str,
        request: &IncomingRequest,
    ) -> DevServerResult<ResponseRecord> {
        let exports = runtime
            .run_file(context, file)
            .map_err(|e| DevServerError::Evaluation(e.to_string()))?;
        let handler = unwrap_default_export(context, &exports);
        let server = playground_http::VirtualServer { port: 0, handler };

        let mock_request = MockRequest {
            method: request.method.clone(),
            url: request.url.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
        };
        match dispatch_node_style(context, &server, &mock_request) {
            Ok(record) => Ok(record),
            Err(playground_http::HttpError::Timeout(url)) => Err(DevServerError::HandlerTimeout(url)),
            Err(other) => Ok(ResponseRecord::json(
                500,
                serde_json::json!({ "error": other.to_string() }),
            )),
        }
    }

    fn execute_web_handler(
        &self,
        context: &mut Context,
        runtime: &Rc<ModuleRuntime>,
        file: &str,
        request: &IncomingRequest,
        params: FxHashMap<String, String>,
    ) -> DevServerResult<ResponseRecord> {
        let exports = runtime
            .run_file(context, file)
            .map_err(|e| DevServerError::Evaluation(e.to_string()))?;
        let Some(obj) = exports.as_object() else {
            return Err(DevServerError::Evaluation(format!("{file} did not export an object")));
        };
        let verb = request.method.to_uppercase();
        let handler_value = obj
            .get(js_string!(verb.clone()), context)
            .map_err(|e| DevServerError::Evaluation(e.to_string()))?;
        if handler_value.as_callable().is_none() {
            return Err(DevServerError::MethodNotAllowed(file.to_string(), verb));
        }

        let mock_request = MockRequest {
            method: request.method.clone(),
            url: request.url.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
        };
        let request_js = mock_request
            .to_js(context)
            .map_err(|e| DevServerError::Evaluation(e.to_string()))?;

        let params_json = serde_json::to_string(&params).unwrap_or_else(|_| "{}".to_string());
        let params_js = context
            .eval(boa_engine::Source::from_bytes(format!("({params_json})").as_bytes()))
            .unwrap_or(JsValue::undefined());

        match dispatch_web_style(context, &handler_value, request_js, params_js) {
            Ok(record) => Ok(record),
            Err(playground_http::HttpError::Timeout(url)) => Err(DevServerError::HandlerTimeout(url)),
            Err(other) => Ok(ResponseRecord::json(
                500,
                serde_json::json!({ "error": other.to_string() }),
            )),
        }
    }

    fn transform_and_serve(&self, transform_state: &TransformState, file: &str) -> DevServerResult<ResponseRecord> {
        let source = self.vfs.read_to_string(file)?;
        let output = transform_source(transform_state, file, &source)
            .map_err(|e| DevServerError::Transform { path: file.to_string(), message: e.to_string() })?;
        let mut record = ResponseRecord::json(200, serde_json::Value::Null);
        record.body = output.code.into_bytes();
        record.headers.insert("content-type".to_string(), "application/javascript; charset=utf-8".to_string());
        record.headers.insert("content-length".to_string(), record.body.len().to_string());
        if output.from_cache {
            record.headers.insert("x-transform-cache".to_string(), "hit".to_string());
        }
        Ok(record)
    }

    fn serve_verbatim(&self, path: &str) -> DevServerResult<ResponseRecord> {
        if !self.vfs.stat(path).map(|s| s.is_file).unwrap_or(false) {
            return Ok(not_found_record());
        }
        let bytes = self.vfs.read(path)?;
        let mut headers = FxHashMap::default();
        headers.insert("content-length".to_string(), bytes.len().to_string());
        Ok(ResponseRecord {
            status_code: 200,
            status_message: status_text(200).to_string(),
            headers,
            body: bytes,
        })
    }
}

/// A CJS module's exports may itself be the handler function (`module.exports
/// = (req, res) => {}`), or -- after `__interopRequireDefault`-style ESM
/// rewriting -- wrapped as `{ default: fn, __esModule: true }`.
fn unwrap_default_export(context: &mut Context, exports: &JsValue) -> JsValue {
    if exports.as_callable().is_some() {
        return exports.clone();
    }
    if let Some(obj) = exports.as_object() {
        if let Ok(default) = obj.get(js_string!("default"), context) {
            if default.as_callable().is_some() {
                return default;
            }
        }
    }
    exports.clone()
}

fn find_not_found_page(vfs: &Vfs, config: &DevServerConfig) -> Option<String> {
    route::resolve_pages_route(vfs, &config.pages_dir, "/404").map(|(file, _)| file)
}

fn js_response(source: &str) -> ResponseRecord {
    let mut headers = FxHashMap::default();
    headers.insert("content-type".to_string(), "application/javascript; charset=utf-8".to_string());
    headers.insert("content-length".to_string(), source.len().to_string());
    ResponseRecord {
        status_code: 200,
        status_message: status_text(200).to_string(),
        headers,
        body: source.as_bytes().to_vec(),
    }
}

fn not_found_record() -> ResponseRecord {
    let body = b"Not Found".to_vec();
    let mut headers = FxHashMap::default();
    headers.insert("content-type".to_string(), "text/plain; charset=utf-8".to_string());
    headers.insert("content-length".to_string(), body.len().to_string());
    ResponseRecord {
        status_code: 404,
        status_message: status_text(404).to_string(),
        headers,
        body,
    }
}

/// Splits `raw` into its path and query-parameter map via `url::Url`,
/// anchored against a throwaway base since these URLs are always
/// path-relative within the virtual server's own namespace.
pub fn split_query(raw: &str) -> (String, FxHashMap<String, String>) {
    let full = format!("http://playground.invalid{raw}");
    match url::Url::parse(&full) {
        Ok(parsed) => {
            let query = parsed.query_pairs().into_owned().collect();
            (parsed.path().to_string(), query)
        }
        Err(_) => (raw.to_string(), FxHashMap::default()),
    }
}

/// Step 1 of the URL pipeline: strip `/__virtual__/<port>` if present.
pub fn strip_virtual_prefix(pathname: &str, port: u16) -> String {
    let prefix = format!("/__virtual__/{port}");
    pathname
        .strip_prefix(&prefix)
        .map(|rest| if rest.is_empty() { "/".to_string() } else { rest.to_string() })
        .unwrap_or_else(|| pathname.to_string())
}

/// Step 2: strip configured `assetPrefix` then `basePath`, tolerating a
/// double slash at the join point (SPEC_FULL.md §9's documented caveat).
pub fn strip_asset_and_base_path(pathname: &str, config: &DevServerConfig) -> String {
    let mut rest = pathname.to_string();
    for prefix in [config.normalized_asset_prefix(), config.normalized_base_path()] {
        if prefix.is_empty() {
            continue;
        }
        if let Some(stripped) = rest.strip_prefix(&prefix) {
            rest = stripped.to_string();
        } else {
            let doubled = format!("{prefix}/");
            if let Some(stripped) = rest.strip_prefix(&doubled) {
                rest = format!("/{stripped}");
            }
        }
    }
    if rest.is_empty() {
        "/".to_string()
    } else {
        rest
    }
}

fn extensionless_resolve(vfs: &Vfs, pathname: &str) -> Option<String> {
    if pathname.contains('.') {
        return None;
    }
    for ext in [".jsx", ".tsx", ".ts", ".js"] {
        let candidate = format!("{pathname}{ext}");
        if vfs.stat(&candidate).map(|s| s.is_file).unwrap_or(false) {
            return Some(candidate);
        }
    }
    None
}
