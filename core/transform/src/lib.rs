//! The on-demand source transform layer: strips CSS imports, resolves
//! configured path aliases, converts JSX to automatic-runtime calls and
//! strips a narrow set of TypeScript-only syntax, redirects bare npm
//! imports to a CDN, and injects React-Refresh registrations -- behind
//! a content-hash-keyed cache and an idempotent one-shot initialization
//! of the shared transform state.

mod alias;
mod cache;
mod cdn;
mod css;
mod error;
mod jsx;
mod pipeline;
mod refresh;
mod specifier;
mod state;

pub use alias::AliasConfig;
pub use cache::{content_hash, TransformCache};
pub use cdn::CdnConfig;
pub use css::strip_css_imports;
pub use error::{TransformError, TransformResult};
pub use jsx::{strip_typescript, transform_jsx};
pub use pipeline::{is_transformable, transform_source, TransformOutput};
pub use refresh::inject_react_refresh;
pub use state::{CachedOutput, TransformLayer, TransformState};
