//! HTML document generation for the framework-style server (SPEC_FULL.md
//! §4.5 step 6): import map, whitelisted env script, optional CSS utility
//! runtime config, React-Refresh preamble (always first among module
//! scripts), HMR client, and the layout-wrapped module script that mounts
//! the page.

use crate::config::DevServerConfig;

/// Packages the import map aliases to, so the browser (which has no
/// `node_modules`) can resolve bare `react`/`react-dom` imports the same
/// way [`playground_transform::CdnConfig`] redirects them inside modules.
const IMPORT_MAP_PACKAGES: &[&str] = &["react", "react-dom", "react-dom/client", "react/jsx-runtime"];

pub fn import_map_script(cdn_base_url: &str) -> String {
    let entries: Vec<String> = IMPORT_MAP_PACKAGES
        .iter()
        .map(|pkg| format!("    \"{pkg}\": \"{cdn_base_url}{pkg}\""))
        .collect();
    format!(
        "<script type=\"importmap\">{{\n  \"imports\": {{\n{}\n  }}\n}}</script>",
        entries.join(",\n")
    )
}

/// Only `NEXT_PUBLIC_`-prefixed env entries are forwarded, per
/// [`DevServerConfig::public_env`].
pub fn env_script(config: &DevServerConfig) -> String {
    let entries: Vec<String> = config
        .public_env()
        .into_iter()
        .map(|(k, v)| format!("  \"{}\": {}", k, serde_json::to_string(v).unwrap_or_else(|_| "null".to_string())))
        .collect();
    format!(
        "<script>window.__ENV__ = {{\n{},\n  \"__BASE_PATH__\": {}\n}};</script>",
        entries.join(",\n"),
        serde_json::to_string(&config.normalized_base_path()).unwrap_or_else(|_| "\"\"".to_string())
    )
}

/// `None` when no CSS-utility config file is configured -- nothing is
/// injected in that case (the spec calls this injection "optional").
pub fn css_config_script(config: &DevServerConfig) -> Option<String> {
    config.css_config_path.as_ref().map(|path| {
        format!("<script>window.__CSS_CONFIG_PATH__ = {};</script>", serde_json::to_string(path).unwrap_or_default())
    })
}

/// Loaded as a top-level-await module *before* any other module script, so
/// that `$RefreshReg$`/`$RefreshSig$` exist by the time a transformed
/// component module runs its injected registration calls.
pub fn refresh_preamble_script(cdn_base_url: &str) -> String {
    format!(
        "<script type=\"module\">\n\
         import RefreshRuntime from \"{cdn_base_url}react-refresh/runtime\";\n\
         RefreshRuntime.injectIntoGlobalHook(window);\n\
         window.$RefreshReg$ = () => {{}};\n\
         window.$RefreshSig$ = () => (type) => type;\n\
         window.$RefreshRuntime$ = RefreshRuntime;\n\
         </script>"
    )
}

pub fn hmr_client_script(channel_tag: &str) -> String {
    format!(
        "<script type=\"module\">\n\
         window.addEventListener(\"message\", (event) => {{\n\
         \x20 if (!event.data || event.data.channel !== \"{channel_tag}\") return;\n\
         \x20 import(\"/__hmr_client__\").then((client) => client.applyUpdate(event.data));\n\
         }});\n\
         </script>"
    )
}

/// The page mount script: for App-Router, wraps the page element in the
/// layout chain in declared order (outermost first) using
/// `Array::reduceRight` -- see the module comment for why that direction.
pub fn module_bootstrap_script(port: u16, page_file: &str, layout_chain: &[String], cdn_base_url: &str) -> String {
    let page_url = virtual_url(port, page_file);
    let mut imports = format!("import React from \"{cdn_base_url}react\";\nimport {{ createRoot }} from \"{cdn_base_url}react-dom/client\";\nimport Page from \"{page_url}\";\n");
    let mut layout_names = Vec::new();
    for (index, layout_file) in layout_chain.iter().enumerate() {
        let name = format!("Layout{index}");
        imports.push_str(&format!("import {name} from \"{}\";\n", virtual_url(port, layout_file)));
        layout_names.push(name);
    }

    let layouts_array = format!("[{}]", layout_names.join(", "));
    format!(
        "<script type=\"module\">\n\
         {imports}\
         const tree = {layouts_array}.reduceRight((child, Layout) => React.createElement(Layout, null, child), React.createElement(Page, null));\n\
         createRoot(document.getElementById(\"__next\")).render(tree);\n\
         </script>"
    )
}

fn virtual_url(port: u16, file: &str) -> String {
    format!("/__virtual__/{port}{file}")
}

pub struct DocumentOptions<'a> {
    pub port: u16,
    pub page_file: &'a str,
    pub layout_chain: &'a [String],
    pub config: &'a DevServerConfig,
    pub channel_tag: &'a str,
    pub cdn_base_url: &'a str,
    pub status_code: u16,
}

pub fn render_document(options: &DocumentOptions) -> String {
    let mut head = vec![import_map_script(options.cdn_base_url), env_script(options.config)];
    if let Some(css_script) = css_config_script(options.config) {
        head.push(css_script);
    }
    head.push(refresh_preamble_script(options.cdn_base_url));
    head.push(hmr_client_script(options.channel_tag));

    format!(
        "<!doctype html>\n<html>\n<head>\n{}\n</head>\n<body>\n<div id=\"__next\"></div>\n{}\n</body>\n</html>\n",
        head.join("\n"),
        module_bootstrap_script(options.port, options.page_file, options.layout_chain, options.cdn_base_url)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DevServerConfig {
        let mut config = DevServerConfig::default();
        config.env.insert("NEXT_PUBLIC_TITLE".to_string(), "demo".to_string());
        config
    }

    #[test]
    fn import_map_lists_react_packages() {
        let script = import_map_script("https://esm.sh/");
        assert!(script.contains("\"react\": \"https://esm.sh/react\""));
        assert!(script.contains("importmap"));
    }

    #[test]
    fn env_script_only_exposes_public_vars() {
        let mut config = config();
        config.env.insert("SECRET".to_string(), "nope".to_string());
        let script = env_script(&config);
        assert!(script.contains("NEXT_PUBLIC_TITLE"));
        assert!(!script.contains("SECRET"));
    }

    #[test]
    fn css_config_script_absent_without_config_path() {
        assert!(css_config_script(&config()).is_none());
    }

    #[test]
    fn css_config_script_present_when_configured() {
        let mut config = config();
        config.css_config_path = Some("/tailwind.config.js".to_string());
        assert!(css_config_script(&config).unwrap().contains("/tailwind.config.js"));
    }

    #[test]
    fn refresh_preamble_precedes_hmr_and_module_script_in_rendered_document() {
        let config = config();
        let document = render_document(&DocumentOptions {
            port: 3000,
            page_file: "/pages/index.jsx",
            layout_chain: &[],
            config: &config,
            channel_tag: "next-hmr",
            cdn_base_url: "https://esm.sh/",
            status_code: 200,
        });
        let refresh_pos = document.find("RefreshRuntime").unwrap();
        let hmr_pos = document.find("next-hmr").unwrap();
        let mount_pos = document.find("createRoot").unwrap();
        assert!(refresh_pos < hmr_pos);
        assert!(hmr_pos < mount_pos);
    }

    #[test]
    fn module_script_wraps_page_in_layout_chain_outermost_first() {
        let script = module_bootstrap_script(
            3000,
            "/app/dashboard/page.jsx",
            &["/app/layout.jsx".to_string(), "/app/dashboard/layout.jsx".to_string()],
            "https://esm.sh/",
        );
        assert!(script.contains("import Layout0 from \"/__virtual__/3000/app/layout.jsx\""));
        assert!(script.contains("import Layout1 from \"/__virtual__/3000/app/dashboard/layout.jsx\""));
        assert!(script.contains("[Layout0, Layout1].reduceRight"));
    }
}
