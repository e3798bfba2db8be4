use thiserror::Error;

use crate::envelope::MessageType;

/// Errors raised while validating an incoming envelope or payload.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("unknown protocol: {found}")]
    UnknownProtocol { found: String },

    #[error("unsupported protocol version: {found}")]
    UnsupportedVersion { found: String },

    #[error("unexpected message type: expected {expected}, got {found}")]
    UnexpectedMessageType {
        expected: MessageType,
        found: MessageType,
    },

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl ProtocolError {
    /// Stable error code recorded alongside rejected messages.
    pub fn code(&self) -> &'static str {
        match self {
            ProtocolError::UnknownProtocol { .. } | ProtocolError::UnexpectedMessageType { .. } => {
                "E_SCHEMA_INVALID_TYPE"
            }
            ProtocolError::UnsupportedVersion { .. } => "E_SCHEMA_INVALID_VERSION",
            ProtocolError::MissingField(_) => "E_SCHEMA_MISSING_FIELD",
            ProtocolError::InvalidField { .. } => "E_SCHEMA_INVALID_TYPE",
        }
    }
}
