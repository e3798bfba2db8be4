use chrono::Utc;
use genepool_types::NodeId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProtocolError;

/// Protocol identifier carried by every envelope.
pub const PROTOCOL: &str = "genepool-a2a";
/// Protocol version this hub speaks.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Message types a node may send.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Hello,
    Publish,
    Fetch,
    Report,
    Decision,
    Revoke,
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MessageType::Hello => "hello",
            MessageType::Publish => "publish",
            MessageType::Fetch => "fetch",
            MessageType::Report => "report",
            MessageType::Decision => "decision",
            MessageType::Revoke => "revoke",
        };
        write!(f, "{name}")
    }
}

/// Uniform message shell. All node-to-hub requests use this format.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub protocol: String,
    pub protocol_version: String,
    pub message_type: MessageType,
    pub message_id: Uuid,
    pub sender_id: NodeId,
    pub timestamp_ms: i64,
    pub payload: T,
}

impl<T> Envelope<T> {
    /// Build an envelope around a payload, stamping id and send time.
    pub fn new(message_type: MessageType, sender_id: NodeId, payload: T) -> Self {
        Self {
            protocol: PROTOCOL.to_string(),
            protocol_version: PROTOCOL_VERSION.to_string(),
            message_type,
            message_id: Uuid::new_v4(),
            sender_id,
            timestamp_ms: Utc::now().timestamp_millis(),
            payload,
        }
    }

    /// Check protocol identification and that the envelope carries the
    /// message type the handler expects.
    pub fn validate(&self, expected: MessageType) -> Result<(), ProtocolError> {
        if self.protocol != PROTOCOL {
            return Err(ProtocolError::UnknownProtocol {
                found: self.protocol.clone(),
            });
        }
        if self.protocol_version != PROTOCOL_VERSION {
            return Err(ProtocolError::UnsupportedVersion {
                found: self.protocol_version.clone(),
            });
        }
        if self.message_type != expected {
            return Err(ProtocolError::UnexpectedMessageType {
                expected,
                found: self.message_type,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_round_trips_through_json() {
        let envelope = Envelope::new(
            MessageType::Hello,
            NodeId::from("node_alpha"),
            serde_json::json!({"capabilities": ["publish"]}),
        );
        let json = serde_json::to_string(&envelope).unwrap();
        let back: Envelope<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn validate_accepts_matching_envelope() {
        let envelope = Envelope::new(MessageType::Publish, NodeId::from("node_a"), ());
        assert!(envelope.validate(MessageType::Publish).is_ok());
    }

    #[test]
    fn validate_rejects_foreign_protocol() {
        let mut envelope = Envelope::new(MessageType::Hello, NodeId::from("node_a"), ());
        envelope.protocol = "other-protocol".into();
        let err = envelope.validate(MessageType::Hello).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownProtocol { .. }));
        assert_eq!(err.code(), "E_SCHEMA_INVALID_TYPE");
    }

    #[test]
    fn validate_rejects_version_drift() {
        let mut envelope = Envelope::new(MessageType::Hello, NodeId::from("node_a"), ());
        envelope.protocol_version = "2.0".into();
        let err = envelope.validate(MessageType::Hello).unwrap_err();
        assert_eq!(err.code(), "E_SCHEMA_INVALID_VERSION");
    }

    #[test]
    fn validate_rejects_mismatched_message_type() {
        let envelope = Envelope::new(MessageType::Fetch, NodeId::from("node_a"), ());
        let err = envelope.validate(MessageType::Publish).unwrap_err();
        assert!(matches!(err, ProtocolError::UnexpectedMessageType { .. }));
    }

    #[test]
    fn message_type_wire_values() {
        assert_eq!(
            serde_json::to_string(&MessageType::Publish).unwrap(),
            "\"publish\""
        );
        let parsed: MessageType = serde_json::from_str("\"revoke\"").unwrap();
        assert_eq!(parsed, MessageType::Revoke);
    }
}
