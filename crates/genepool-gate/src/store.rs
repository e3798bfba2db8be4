//! In-memory implementations of the persistence contracts, for tests and
//! single-process deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use genepool_types::{Decision, GateId, GateRecord, GateStage, GateStatus};
use tokio::sync::RwLock;

use crate::error::GateError;
use crate::traits::{GateStore, ObjectStore};

/// In-memory gate store. Enforces the same forward-only status discipline
/// a relational implementation would.
#[derive(Debug, Default)]
pub struct MemoryGateStore {
    gates: RwLock<HashMap<GateId, GateRecord>>,
}

impl MemoryGateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GateStore for MemoryGateStore {
    async fn insert_gate(&self, gate_id: &GateId, bundle_hash: &str) -> Result<(), GateError> {
        let mut gates = self.gates.write().await;
        if gates.contains_key(gate_id) {
            return Err(GateError::Store(format!("duplicate gate id: {gate_id}")));
        }
        gates.insert(gate_id.clone(), GateRecord::new(gate_id.clone(), bundle_hash));
        Ok(())
    }

    async fn update_status(
        &self,
        gate_id: &GateId,
        status: GateStatus,
        stage: Option<GateStage>,
        error_code: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<(), GateError> {
        let mut gates = self.gates.write().await;
        let record = gates
            .get_mut(gate_id)
            .ok_or_else(|| GateError::Store(format!("unknown gate id: {gate_id}")))?;
        if !record.status.can_advance_to(status) {
            return Err(GateError::Store(format!(
                "illegal status transition for {gate_id}: {} -> {status}",
                record.status
            )));
        }
        record.status = status;
        if let Some(stage) = stage {
            record.stage = stage;
        }
        record.error_code = error_code.map(str::to_string);
        record.error_message = error_message.map(str::to_string);
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn update_decision(
        &self,
        gate_id: &GateId,
        decision: Decision,
        reason: &str,
    ) -> Result<(), GateError> {
        let mut gates = self.gates.write().await;
        let record = gates
            .get_mut(gate_id)
            .ok_or_else(|| GateError::Store(format!("unknown gate id: {gate_id}")))?;
        record.decision = Some(decision);
        record.decision_reason = Some(reason.to_string());
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn get_gate(&self, gate_id: &GateId) -> Result<Option<GateRecord>, GateError> {
        let gates = self.gates.read().await;
        Ok(gates.get(gate_id).cloned())
    }
}

/// In-memory object store keyed by string.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), GateError> {
        let mut objects = self.objects.write().await;
        objects.insert(key.to_string(), bytes);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, GateError> {
        let objects = self.objects.read().await;
        Ok(objects.get(key).cloned())
    }
}
