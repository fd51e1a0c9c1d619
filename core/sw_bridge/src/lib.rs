//! The service-worker bridge (§4.6): page-side dispatch of virtual requests
//! against the [`playground_http`] server registry, the worker message
//! envelopes, and the worker script the page registers. The worker itself
//! runs in a real `ServiceWorkerGlobalScope`, which this engine cannot
//! emulate, so it is a hand-authored script rather than boa-executed code --
//! see [`worker_script`].

mod dispatch;
mod envelope;
mod error;
mod worker_script;

pub use dispatch::{dispatch_virtual_request, subscribe_lifecycle};
pub use envelope::{LifecycleMessage, SwRequestEnvelope, SwResponseData, SwResponseMessage};
pub use error::{SwBridgeError, SwBridgeResult};
pub use worker_script::{render_worker_script, ECHO_PARAM, HEALTH_CHECK_PARAM, REQUEST_TIMEOUT_MS, VIRTUAL_PREFIX};
