//! Wire shapes for the worker message protocol (§6's "Worker message
//! protocol" table). These are the page-side view only: the `init` message
//! transfers an actual `MessagePort`, which has no Rust representation here
//! and is constructed directly by the `ffi/wasm` binding layer.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// sw→page `request`: the worker's view of an intercepted `fetch`, forwarded
/// over the port for the main thread to answer.
#[derive(Debug, Clone, Deserialize)]
pub struct SwRequestEnvelope {
    pub id: u64,
    pub port: u16,
    pub method: String,
    pub url: String,
    pub headers: FxHashMap<String, String>,
    pub body: Option<Vec<u8>>,
}

/// page→sw `response` success payload.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SwResponseData {
    pub status_code: u16,
    pub status_message: String,
    pub headers: FxHashMap<String, String>,
    pub body_base64: String,
}

/// page→sw `response`: either a resolved [`SwResponseData`] or an error
/// string, matching the `{id, data: ...}` / `{id, error: string}` shapes in
/// the protocol table. `#[serde(untagged)]` on the two payload variants
/// would lose the `id` correlation on the error path, so this flattens both
/// into one struct with an optional field instead.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SwResponseMessage {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<SwResponseData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SwResponseMessage {
    pub fn ok(id: u64, data: SwResponseData) -> Self {
        Self { id, data: Some(data), error: None }
    }

    pub fn err(id: u64, error: impl Into<String>) -> Self {
        Self { id, data: None, error: Some(error.into()) }
    }
}

/// page→sw `server-registered` / `server-unregistered`: forwarded verbatim
/// from [`playground_http::RegistryEvent`].
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum LifecycleMessage {
    ServerRegistered { port: u16 },
    ServerUnregistered { port: u16 },
}

impl From<playground_http::RegistryEvent> for LifecycleMessage {
    fn from(event: playground_http::RegistryEvent) -> Self {
        match event {
            playground_http::RegistryEvent::Registered(port) => LifecycleMessage::ServerRegistered { port },
            playground_http::RegistryEvent::Unregistered(port) => LifecycleMessage::ServerUnregistered { port },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_data_serializes_with_camel_case_wire_fields() {
        let mut headers = FxHashMap::default();
        headers.insert("content-type".to_string(), "text/plain".to_string());
        let data = SwResponseData {
            status_code: 200,
            status_message: "OK".to_string(),
            headers,
            body_base64: "aGk=".to_string(),
        };
        let json = serde_json::to_string(&data).unwrap();
        assert!(json.contains("\"statusCode\":200"));
        assert!(json.contains("\"bodyBase64\":\"aGk=\""));
    }

    #[test]
    fn error_message_omits_data_field() {
        let message = SwResponseMessage::err(7, "boom");
        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("\"error\":\"boom\""));
        assert!(!json.contains("\"data\""));
    }

    #[test]
    fn ok_message_omits_error_field() {
        let message = SwResponseMessage::ok(
            1,
            SwResponseData { status_code: 204, status_message: "No Content".to_string(), headers: FxHashMap::default(), body_base64: String::new() },
        );
        let json = serde_json::to_string(&message).unwrap();
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn lifecycle_message_converts_from_registry_event() {
        let registered: LifecycleMessage = playground_http::RegistryEvent::Registered(3001).into();
        assert_eq!(registered, LifecycleMessage::ServerRegistered { port: 3001 });
        let unregistered: LifecycleMessage = playground_http::RegistryEvent::Unregistered(3001).into();
        assert_eq!(unregistered, LifecycleMessage::ServerUnregistered { port: 3001 });
    }
}
