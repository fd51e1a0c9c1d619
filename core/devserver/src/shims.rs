//! Served JS stubs for the framework's own client-side modules, reachable
//! at `/_next/shims/<name>`. These are static strings, not VFS entries --
//! the framework expects to `import` them at those well-known paths, and
//! nothing downstream needs them to be real implementations, only
//! importable ones.

const LINK_SHIM: &str = "export default function Link({ href, children }) { return children; }\n";
const ROUTER_SHIM: &str = "export function useRouter() { return { push() {}, replace() {}, back() {} }; }\n";
const NAVIGATION_SHIM: &str =
    "export function usePathname() { return location.pathname; }\nexport function useSearchParams() { return new URLSearchParams(location.search); }\nexport function useRouter() { return { push() {}, replace() {}, back() {} }; }\n";
const HEAD_SHIM: &str = "export default function Head({ children }) { return children; }\n";
const IMAGE_SHIM: &str = "export default function Image(props) { return props; }\n";
const DYNAMIC_SHIM: &str = "export default function dynamic(loader) { return loader; }\n";
const SCRIPT_SHIM: &str = "export default function Script() { return null; }\n";
const FONT_GOOGLE_SHIM: &str = "export function font() { return { className: '', style: {} }; }\n";
const FONT_LOCAL_SHIM: &str = "export default function localFont() { return { className: '', style: {} }; }\n";

/// Returns the stub source for `name` (the path segment after
/// `/_next/shims/`), or `None` if no such shim is served.
pub fn shim_source(name: &str) -> Option<&'static str> {
    match name {
        "link" => Some(LINK_SHIM),
        "router" => Some(ROUTER_SHIM),
        "navigation" => Some(NAVIGATION_SHIM),
        "head" => Some(HEAD_SHIM),
        "image" => Some(IMAGE_SHIM),
        "dynamic" => Some(DYNAMIC_SHIM),
        "script" => Some(SCRIPT_SHIM),
        "font/google" => Some(FONT_GOOGLE_SHIM),
        "font/local" => Some(FONT_LOCAL_SHIM),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_shim_names_resolve() {
        for name in ["link", "router", "navigation", "head", "image", "dynamic", "script", "font/google", "font/local"] {
            assert!(shim_source(name).is_some(), "missing shim for {name}");
        }
    }

    #[test]
    fn unknown_shim_name_is_none() {
        assert!(shim_source("not-a-real-shim").is_none());
    }
}
