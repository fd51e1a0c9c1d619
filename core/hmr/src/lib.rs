//! The HMR channel (§4.7): classifying file-watch events, batching them
//! behind a short window, and the iframe-side client that applies them.

mod channel;
mod classify;
mod client_script;
mod message;

pub use channel::HmrChannel;
pub use classify::{classify_change, HmrUpdateKind};
pub use client_script::HMR_CLIENT_SCRIPT;
pub use message::{HmrMessage, HmrMessageKind};
