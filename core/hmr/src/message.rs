//! The wire shape from §6: `{channel, type, path, timestamp}`, posted
//! page→iframe with a `"*"` target.

use serde::Serialize;

use crate::classify::HmrUpdateKind;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum HmrMessageKind {
    Update,
    FullReload,
}

impl From<HmrUpdateKind> for HmrMessageKind {
    fn from(kind: HmrUpdateKind) -> Self {
        match kind {
            HmrUpdateKind::Update => Self::Update,
            HmrUpdateKind::FullReload => Self::FullReload,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HmrMessage {
    pub channel: String,
    #[serde(rename = "type")]
    pub kind: HmrMessageKind,
    pub path: String,
    pub timestamp: u64,
}

impl HmrMessage {
    pub fn new(channel: impl Into<String>, kind: HmrUpdateKind, path: impl Into<String>, timestamp: u64) -> Self {
        Self { channel: channel.into(), kind: kind.into(), path: path.into(), timestamp }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_message_serializes_with_wire_field_names() {
        let message = HmrMessage::new("next-hmr", HmrUpdateKind::Update, "/app/page.jsx", 42);
        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("\"channel\":\"next-hmr\""));
        assert!(json.contains("\"type\":\"update\""));
        assert!(json.contains("\"path\":\"/app/page.jsx\""));
        assert!(json.contains("\"timestamp\":42"));
    }

    #[test]
    fn full_reload_kind_serializes_kebab_case() {
        let message = HmrMessage::new("vite-hmr", HmrUpdateKind::FullReload, "/next.config.json", 1);
        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("\"type\":\"full-reload\""));
    }
}
