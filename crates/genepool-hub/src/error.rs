use genepool_gate::GateError;
use genepool_protocol::ProtocolError;
use genepool_types::{GateId, NodeId};
use thiserror::Error;

/// Errors surfaced by hub handlers.
#[derive(Error, Debug)]
pub enum HubError {
    #[error("node not registered or inactive: {0}")]
    NodeNotRegistered(NodeId),

    #[error("publish quota exceeded: {used}/{limit}")]
    QuotaExceeded { used: u64, limit: u64 },

    #[error("gate not found: {0}")]
    GateNotFound(GateId),

    #[error("invalid payload field {field}: {reason}")]
    InvalidPayload { field: &'static str, reason: String },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Gate(#[from] GateError),
}

impl HubError {
    /// Stable error code returned to the sending node.
    pub fn code(&self) -> &'static str {
        match self {
            HubError::NodeNotRegistered(_) => "E_AUTH_NODE_NOT_REGISTERED",
            HubError::QuotaExceeded { .. } => "E_RATE_QUOTA_EXCEEDED",
            HubError::GateNotFound(_) => "E_NOTFOUND_GATE",
            HubError::InvalidPayload { .. } => "E_SCHEMA_INVALID_TYPE",
            HubError::Protocol(err) => err.code(),
            HubError::Gate(err) => err.code(),
        }
    }
}
