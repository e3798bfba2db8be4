//! Registry of contributing nodes: identity, capabilities, and publish
//! quota.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use genepool_types::NodeId;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::error::HubError;

/// Whether a node may currently interact with the hub.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeStatus {
    Active,
    Suspended,
}

/// One registered node.
#[derive(Clone, Debug)]
pub struct NodeEntry {
    pub node_id: NodeId,
    pub capabilities: Vec<String>,
    pub gene_count: u64,
    pub capsule_count: u64,
    pub env_fingerprint: Map<String, Value>,
    pub status: NodeStatus,
    pub quota_used: u64,
    pub quota_limit: u64,
    pub last_heartbeat: DateTime<Utc>,
}

/// Node registry contract.
#[async_trait]
pub trait NodeRegistry: Send + Sync {
    /// Register a new node or refresh an existing one. Returns `true`
    /// when the node was seen for the first time.
    async fn upsert(
        &self,
        node_id: &NodeId,
        capabilities: Vec<String>,
        gene_count: u64,
        capsule_count: u64,
        env_fingerprint: Map<String, Value>,
    ) -> Result<bool, HubError>;

    async fn get(&self, node_id: &NodeId) -> Result<Option<NodeEntry>, HubError>;

    /// Spend one unit of publish quota and refresh the heartbeat. Fails
    /// when the quota is exhausted.
    async fn consume_quota(&self, node_id: &NodeId) -> Result<(), HubError>;
}

/// Default publish quota granted on registration.
const DEFAULT_QUOTA_LIMIT: u64 = 100;

/// In-memory registry for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct MemoryNodeRegistry {
    nodes: RwLock<HashMap<NodeId, NodeEntry>>,
}

impl MemoryNodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suspend a node, blocking further publishes.
    pub async fn suspend(&self, node_id: &NodeId) {
        let mut nodes = self.nodes.write().await;
        if let Some(entry) = nodes.get_mut(node_id) {
            entry.status = NodeStatus::Suspended;
        }
    }

    /// Override the quota limit, for tests.
    pub async fn set_quota_limit(&self, node_id: &NodeId, limit: u64) {
        let mut nodes = self.nodes.write().await;
        if let Some(entry) = nodes.get_mut(node_id) {
            entry.quota_limit = limit;
        }
    }
}

#[async_trait]
impl NodeRegistry for MemoryNodeRegistry {
    async fn upsert(
        &self,
        node_id: &NodeId,
        capabilities: Vec<String>,
        gene_count: u64,
        capsule_count: u64,
        env_fingerprint: Map<String, Value>,
    ) -> Result<bool, HubError> {
        let mut nodes = self.nodes.write().await;
        match nodes.get_mut(node_id) {
            Some(entry) => {
                entry.capabilities = capabilities;
                entry.gene_count = gene_count;
                entry.capsule_count = capsule_count;
                entry.env_fingerprint = env_fingerprint;
                entry.last_heartbeat = Utc::now();
                Ok(false)
            }
            None => {
                nodes.insert(
                    node_id.clone(),
                    NodeEntry {
                        node_id: node_id.clone(),
                        capabilities,
                        gene_count,
                        capsule_count,
                        env_fingerprint,
                        status: NodeStatus::Active,
                        quota_used: 0,
                        quota_limit: DEFAULT_QUOTA_LIMIT,
                        last_heartbeat: Utc::now(),
                    },
                );
                Ok(true)
            }
        }
    }

    async fn get(&self, node_id: &NodeId) -> Result<Option<NodeEntry>, HubError> {
        let nodes = self.nodes.read().await;
        Ok(nodes.get(node_id).cloned())
    }

    async fn consume_quota(&self, node_id: &NodeId) -> Result<(), HubError> {
        let mut nodes = self.nodes.write().await;
        let entry = nodes
            .get_mut(node_id)
            .ok_or_else(|| HubError::NodeNotRegistered(node_id.clone()))?;
        if entry.quota_used >= entry.quota_limit {
            return Err(HubError::QuotaExceeded {
                used: entry.quota_used,
                limit: entry.quota_limit,
            });
        }
        entry.quota_used += 1;
        entry.last_heartbeat = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node() -> NodeId {
        NodeId::from("node_alpha")
    }

    #[tokio::test]
    async fn first_upsert_registers_later_upserts_refresh() {
        let registry = MemoryNodeRegistry::new();
        let fresh = registry
            .upsert(&node(), vec!["publish".into()], 1, 0, Map::new())
            .await
            .unwrap();
        assert!(fresh);

        let fresh = registry
            .upsert(&node(), vec!["publish".into(), "fetch".into()], 2, 1, Map::new())
            .await
            .unwrap();
        assert!(!fresh);

        let entry = registry.get(&node()).await.unwrap().unwrap();
        assert_eq!(entry.capabilities.len(), 2);
        assert_eq!(entry.gene_count, 2);
        assert_eq!(entry.quota_used, 0);
    }

    #[tokio::test]
    async fn quota_consumption_counts_up_and_stops_at_the_limit() {
        let registry = MemoryNodeRegistry::new();
        registry
            .upsert(&node(), vec![], 0, 0, Map::new())
            .await
            .unwrap();
        registry.set_quota_limit(&node(), 2).await;

        registry.consume_quota(&node()).await.unwrap();
        registry.consume_quota(&node()).await.unwrap();
        let err = registry.consume_quota(&node()).await.unwrap_err();
        assert_eq!(err.code(), "E_RATE_QUOTA_EXCEEDED");
    }

    #[tokio::test]
    async fn quota_for_unknown_node_is_an_auth_error() {
        let registry = MemoryNodeRegistry::new();
        let err = registry.consume_quota(&node()).await.unwrap_err();
        assert_eq!(err.code(), "E_AUTH_NODE_NOT_REGISTERED");
    }
}
