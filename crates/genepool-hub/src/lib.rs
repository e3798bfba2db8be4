//! The Genepool hub service.
//!
//! Sits between the wire protocol and the admission gate: registers
//! contributing nodes, enforces publish quotas, stores submitted bundle
//! bytes, hands submissions to the gate scheduler, and answers gate
//! status and cancellation requests. Transport (HTTP, message bus) stays
//! outside this crate; handlers take validated envelopes and return typed
//! responses.

pub mod audit;
pub mod error;
pub mod registry;
pub mod service;

pub use audit::{AuditEntry, AuditLog, MemoryAuditLog};
pub use error::HubError;
pub use registry::{MemoryNodeRegistry, NodeEntry, NodeRegistry, NodeStatus};
pub use service::HubService;
