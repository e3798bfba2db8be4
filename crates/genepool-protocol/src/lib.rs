//! Node-to-hub wire protocol.
//!
//! Every request a node sends to the hub travels inside an [`Envelope`]
//! carrying protocol identification, a message type, the sender's node id,
//! and a typed payload. This crate is the wire vocabulary only; the
//! transport that authenticates and routes envelopes lives outside it.

pub mod envelope;
pub mod error;
pub mod messages;

pub use envelope::{Envelope, MessageType, PROTOCOL, PROTOCOL_VERSION};
pub use error::ProtocolError;
pub use messages::{
    CapsuleSummary, DecisionPayload, DecisionResponse, FetchPayload, FetchQuery, FetchResponse,
    HelloPayload, HelloResponse, PollHint, PublishPayload, PublishResponse, ReportPayload,
    ReportResponse, RevokePayload, RevokeResponse,
};
