//! Chat frame definition, parsing and boundary validation.
//!
//! Every frame is a JSON object tagged by `type`, always carrying `value`
//! (text) and `meta` (open key/value bag). Event, state and admin frames
//! may additionally carry a payload field named after their tag. Parsing
//! rejects payload fields that do not belong to the frame's tag instead
//! of silently ignoring them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Frame discriminator as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Ordinary chat text.
    Chat,
    /// Room event (presence changes and the like).
    Event,
    /// Room state snapshot.
    State,
    /// Administrative broadcast.
    Admin,
    /// Error notification.
    Error,
}

impl FrameKind {
    /// Wire tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameKind::Chat => "chat",
            FrameKind::Event => "event",
            FrameKind::State => "state",
            FrameKind::Admin => "admin",
            FrameKind::Error => "error",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "chat" => Some(FrameKind::Chat),
            "event" => Some(FrameKind::Event),
            "state" => Some(FrameKind::State),
            "admin" => Some(FrameKind::Admin),
            "error" => Some(FrameKind::Error),
            _ => None,
        }
    }

    /// Payload field this kind is allowed to carry, if any.
    fn payload_field(&self) -> Option<&'static str> {
        match self {
            FrameKind::Event => Some("event"),
            FrameKind::State => Some("state"),
            FrameKind::Admin => Some("admin"),
            FrameKind::Chat | FrameKind::Error => None,
        }
    }
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why an inbound frame was rejected at the boundary.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Not valid JSON.
    #[error("malformed JSON: {0}")]
    Syntax(#[from] serde_json::Error),
    /// Valid JSON but not an object.
    #[error("frame is not a JSON object")]
    NotObject,
    /// No usable `type` tag.
    #[error("missing or non-string `type` tag")]
    MissingTag,
    /// A `type` tag outside the known set.
    #[error("unknown frame type `{0}`")]
    UnknownTag(String),
    /// No usable `value` field.
    #[error("missing or non-string `value` field")]
    MissingValue,
    /// A `meta` field that is not an object.
    #[error("`meta` must be an object")]
    InvalidMeta,
    /// A payload field that does not belong to the frame's tag.
    #[error("`{field}` payload does not belong on a `{tag}` frame")]
    UnexpectedPayload {
        /// The frame's tag.
        tag: String,
        /// The offending payload field.
        field: &'static str,
    },
}

const PAYLOAD_FIELDS: [&str; 3] = ["event", "state", "admin"];

/// A single frame on a room socket, inbound or outbound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatFrame {
    /// Ordinary chat text.
    Chat {
        /// Message text.
        value: String,
        /// Open key/value bag.
        #[serde(default)]
        meta: Map<String, Value>,
    },
    /// Room event such as a presence change.
    Event {
        /// Event name.
        value: String,
        /// Open key/value bag.
        #[serde(default)]
        meta: Map<String, Value>,
        /// Event payload.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        event: Option<Value>,
    },
    /// Room state snapshot.
    State {
        /// Snapshot name.
        value: String,
        /// Open key/value bag.
        #[serde(default)]
        meta: Map<String, Value>,
        /// Snapshot payload.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        state: Option<Value>,
    },
    /// Administrative broadcast.
    Admin {
        /// Directive text.
        value: String,
        /// Open key/value bag.
        #[serde(default)]
        meta: Map<String, Value>,
        /// Directive payload.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        admin: Option<Value>,
    },
    /// Error notification. The machine-readable code travels in
    /// `meta.code`; `value` is the human-readable detail.
    Error {
        /// Human-readable detail.
        value: String,
        /// Open key/value bag.
        #[serde(default)]
        meta: Map<String, Value>,
    },
}

impl ChatFrame {
    /// Chat frame with empty meta.
    pub fn chat(value: impl Into<String>) -> Self {
        ChatFrame::Chat {
            value: value.into(),
            meta: Map::new(),
        }
    }

    /// Event frame with an optional payload.
    pub fn event(value: impl Into<String>, payload: Option<Value>) -> Self {
        ChatFrame::Event {
            value: value.into(),
            meta: Map::new(),
            event: payload,
        }
    }

    /// State frame with an optional payload.
    pub fn state(value: impl Into<String>, payload: Option<Value>) -> Self {
        ChatFrame::State {
            value: value.into(),
            meta: Map::new(),
            state: payload,
        }
    }

    /// Admin frame with empty meta and no payload.
    pub fn admin(value: impl Into<String>) -> Self {
        ChatFrame::Admin {
            value: value.into(),
            meta: Map::new(),
            admin: None,
        }
    }

    /// Error frame carrying a machine-readable code in `meta.code`.
    pub fn error(code: &str, detail: impl Into<String>) -> Self {
        let mut meta = Map::new();
        meta.insert("code".to_string(), Value::String(code.to_string()));
        ChatFrame::Error {
            value: detail.into(),
            meta,
        }
    }

    /// Parse and validate one inbound frame.
    ///
    /// Beyond shape checks this enforces the tag/payload pairing: a frame
    /// carrying a payload field for a different tag is rejected, never
    /// silently accepted.
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let value: Value = serde_json::from_str(text)?;
        let obj = value.as_object().ok_or(FrameError::NotObject)?;

        let tag = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or(FrameError::MissingTag)?;
        let kind =
            FrameKind::from_tag(tag).ok_or_else(|| FrameError::UnknownTag(tag.to_string()))?;

        if !obj.get("value").is_some_and(Value::is_string) {
            return Err(FrameError::MissingValue);
        }
        if let Some(meta) = obj.get("meta") {
            if !meta.is_object() {
                return Err(FrameError::InvalidMeta);
            }
        }

        let allowed = kind.payload_field();
        for field in PAYLOAD_FIELDS {
            if obj.contains_key(field) && allowed != Some(field) {
                return Err(FrameError::UnexpectedPayload {
                    tag: tag.to_string(),
                    field,
                });
            }
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Serialize to wire text.
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// This frame's discriminator.
    pub fn kind(&self) -> FrameKind {
        match self {
            ChatFrame::Chat { .. } => FrameKind::Chat,
            ChatFrame::Event { .. } => FrameKind::Event,
            ChatFrame::State { .. } => FrameKind::State,
            ChatFrame::Admin { .. } => FrameKind::Admin,
            ChatFrame::Error { .. } => FrameKind::Error,
        }
    }

    /// The always-present text field.
    pub fn value(&self) -> &str {
        match self {
            ChatFrame::Chat { value, .. }
            | ChatFrame::Event { value, .. }
            | ChatFrame::State { value, .. }
            | ChatFrame::Admin { value, .. }
            | ChatFrame::Error { value, .. } => value,
        }
    }

    /// The always-present meta bag.
    pub fn meta(&self) -> &Map<String, Value> {
        match self {
            ChatFrame::Chat { meta, .. }
            | ChatFrame::Event { meta, .. }
            | ChatFrame::State { meta, .. }
            | ChatFrame::Admin { meta, .. }
            | ChatFrame::Error { meta, .. } => meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_wire_shape() {
        let text = ChatFrame::chat("hi").to_text().unwrap();
        assert_eq!(text, r#"{"type":"chat","value":"hi","meta":{}}"#);
    }

    #[test]
    fn test_parse_round_trip_preserves_meta() {
        let text = r#"{"type":"chat","value":"hi","meta":{"color":"ff0000"}}"#;
        let frame = ChatFrame::parse(text).unwrap();
        assert_eq!(frame.kind(), FrameKind::Chat);
        assert_eq!(frame.value(), "hi");
        assert_eq!(frame.meta().get("color"), Some(&json!("ff0000")));
        assert_eq!(frame.to_text().unwrap(), text);
    }

    #[test]
    fn test_event_payload_is_optional() {
        let with = ChatFrame::parse(
            r#"{"type":"event","value":"member_joined","event":{"name":"ada"}}"#,
        )
        .unwrap();
        assert_eq!(with.kind(), FrameKind::Event);

        let without = ChatFrame::parse(r#"{"type":"event","value":"ping"}"#).unwrap();
        assert_eq!(without.kind(), FrameKind::Event);
        assert!(without.meta().is_empty());
    }

    #[test]
    fn test_payload_must_match_tag() {
        let err = ChatFrame::parse(r#"{"type":"chat","value":"hi","admin":{}}"#).unwrap_err();
        assert!(matches!(
            err,
            FrameError::UnexpectedPayload { field: "admin", .. }
        ));

        let err = ChatFrame::parse(r#"{"type":"event","value":"e","state":{}}"#).unwrap_err();
        assert!(matches!(
            err,
            FrameError::UnexpectedPayload { field: "state", .. }
        ));
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let err = ChatFrame::parse(r#"{"type":"other","value":"?"}"#).unwrap_err();
        assert!(matches!(err, FrameError::UnknownTag(tag) if tag == "other"));
    }

    #[test]
    fn test_malformed_frames_are_rejected() {
        assert!(matches!(
            ChatFrame::parse("{not json"),
            Err(FrameError::Syntax(_))
        ));
        assert!(matches!(
            ChatFrame::parse(r#""just a string""#),
            Err(FrameError::NotObject)
        ));
        assert!(matches!(
            ChatFrame::parse(r#"{"value":"hi"}"#),
            Err(FrameError::MissingTag)
        ));
        assert!(matches!(
            ChatFrame::parse(r#"{"type":"chat"}"#),
            Err(FrameError::MissingValue)
        ));
        assert!(matches!(
            ChatFrame::parse(r#"{"type":"chat","value":7}"#),
            Err(FrameError::MissingValue)
        ));
        assert!(matches!(
            ChatFrame::parse(r#"{"type":"chat","value":"hi","meta":[]}"#),
            Err(FrameError::InvalidMeta)
        ));
    }

    #[test]
    fn test_error_frame_carries_code_in_meta() {
        let frame = ChatFrame::error("UNAUTHENTICATED", "no session");
        assert_eq!(frame.kind(), FrameKind::Error);
        assert_eq!(frame.value(), "no session");
        assert_eq!(frame.meta().get("code"), Some(&json!("UNAUTHENTICATED")));
    }
}
