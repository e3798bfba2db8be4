//! Append-only audit trail of node interactions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use genepool_types::NodeId;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::HubError;

/// One audited action.
#[derive(Clone, Debug)]
pub struct AuditEntry {
    pub message_id: Uuid,
    pub sender_id: NodeId,
    pub action: String,
    pub result: String,
    pub at: DateTime<Utc>,
}

/// Audit log contract. Entries are append-only.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn append(
        &self,
        message_id: Uuid,
        sender_id: &NodeId,
        action: &str,
        result: &str,
    ) -> Result<(), HubError>;
}

/// In-memory audit log.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn append(
        &self,
        message_id: Uuid,
        sender_id: &NodeId,
        action: &str,
        result: &str,
    ) -> Result<(), HubError> {
        let mut entries = self.entries.write().await;
        entries.push(AuditEntry {
            message_id,
            sender_id: sender_id.clone(),
            action: action.to_string(),
            result: result.to_string(),
            at: Utc::now(),
        });
        Ok(())
    }
}
