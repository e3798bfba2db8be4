//! Hub handlers: node registration, publish intake, gate lifecycle.

use std::sync::Arc;

use base64::Engine;
use genepool_gate::{GateError, GateScheduler, ObjectStore, Submission};
use genepool_protocol::{
    Envelope, HelloPayload, HelloResponse, MessageType, PollHint, ProtocolError, PublishPayload,
    PublishResponse,
};
use genepool_types::{GateId, GateRecord};
use rand::Rng;
use tracing::info;

use crate::audit::AuditLog;
use crate::error::HubError;
use crate::registry::{NodeRegistry, NodeStatus};

/// Transport-independent hub service.
pub struct HubService {
    registry: Arc<dyn NodeRegistry>,
    audit: Arc<dyn AuditLog>,
    objects: Arc<dyn ObjectStore>,
    scheduler: Arc<GateScheduler>,
}

impl HubService {
    pub fn new(
        registry: Arc<dyn NodeRegistry>,
        audit: Arc<dyn AuditLog>,
        objects: Arc<dyn ObjectStore>,
        scheduler: Arc<GateScheduler>,
    ) -> Self {
        Self {
            registry,
            audit,
            objects,
            scheduler,
        }
    }

    /// `hello`: register a new node or refresh an existing one. First
    /// contact earns a claim code the operator uses to adopt the node in
    /// the console.
    pub async fn handle_hello(
        &self,
        envelope: Envelope<HelloPayload>,
    ) -> Result<HelloResponse, HubError> {
        envelope.validate(MessageType::Hello)?;
        let payload = &envelope.payload;

        let fresh = self
            .registry
            .upsert(
                &envelope.sender_id,
                payload.capabilities.clone(),
                payload.gene_count.unwrap_or(0),
                payload.capsule_count.unwrap_or(0),
                payload.env_fingerprint.clone().unwrap_or_default(),
            )
            .await?;

        info!(
            node = %envelope.sender_id,
            fresh,
            "Node hello processed"
        );

        Ok(HelloResponse {
            node_id: envelope.sender_id.to_string(),
            status: if fresh { "registered" } else { "updated" }.to_string(),
            claim_code: fresh.then(generate_claim_code),
        })
    }

    /// `publish`: validate the payload, authenticate the sender, charge
    /// quota, persist the bundle bytes, and queue an admission gate.
    pub async fn handle_publish(
        &self,
        envelope: Envelope<PublishPayload>,
    ) -> Result<PublishResponse, HubError> {
        envelope.validate(MessageType::Publish)?;
        let payload = &envelope.payload;
        let sender = &envelope.sender_id;

        if payload.bundle_bytes_base64.is_empty() {
            return Err(ProtocolError::MissingField("bundle_bytes_base64").into());
        }
        // Full content verification happens inside the gate; here we only
        // insist the declared hash is well-formed.
        if !payload.bundle_hash.starts_with("sha256:") {
            return Err(GateError::HashFormat {
                declared: payload.bundle_hash.clone(),
            }
            .into());
        }
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&payload.bundle_bytes_base64)
            .map_err(|err| HubError::InvalidPayload {
                field: "bundle_bytes_base64",
                reason: err.to_string(),
            })?;

        let node = self
            .registry
            .get(sender)
            .await?
            .filter(|entry| entry.status == NodeStatus::Active)
            .ok_or_else(|| HubError::NodeNotRegistered(sender.clone()))?;
        if node.quota_used >= node.quota_limit {
            return Err(HubError::QuotaExceeded {
                used: node.quota_used,
                limit: node.quota_limit,
            });
        }

        let bundle_key = format!("bundles/{}/{}", sender, payload.bundle_hash);
        self.objects.put(&bundle_key, bytes).await?;
        self.registry.consume_quota(sender).await?;

        let gate_id = self
            .scheduler
            .enqueue(
                Submission {
                    bundle_hash: payload.bundle_hash.clone(),
                    sender_id: sender.clone(),
                    bundle_key,
                    bundle_format: payload.bundle_format,
                    project: Some(payload.project.clone()),
                    namespace: Some(payload.namespace.clone()),
                    submit_mode: Some(payload.submit_mode),
                },
                payload.priority.unwrap_or(0),
            )
            .await?;

        self.audit
            .append(envelope.message_id, sender, "publish", "success")
            .await?;

        info!(node = %sender, gate_id = %gate_id, "Publish accepted");

        Ok(PublishResponse {
            status: "accepted".into(),
            candidate_asset_ids: vec![],
            gate_pipeline_id: Some(gate_id.to_string()),
            next: Some(PollHint::poll(format!("/gates/{gate_id}"))),
        })
    }

    /// The scheduler driving admissions for this hub.
    pub fn scheduler(&self) -> &Arc<GateScheduler> {
        &self.scheduler
    }

    /// Gate status projection for polling submitters.
    pub async fn gate_status(&self, gate_id: &GateId) -> Result<GateRecord, HubError> {
        self.scheduler
            .store()
            .get_gate(gate_id)
            .await?
            .ok_or_else(|| HubError::GateNotFound(gate_id.clone()))
    }

    /// Cancel a running gate. Gates that are merely queued or already
    /// finished report as not found.
    pub async fn cancel_gate(&self, gate_id: &GateId) -> Result<bool, HubError> {
        if self.scheduler.cancel(gate_id).await {
            Ok(true)
        } else {
            Err(HubError::GateNotFound(gate_id.clone()))
        }
    }
}

const CLAIM_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CLAIM_CODE_LEN: usize = 8;

fn generate_claim_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CLAIM_CODE_LEN)
        .map(|_| CLAIM_CODE_CHARSET[rng.gen_range(0..CLAIM_CODE_CHARSET.len())] as char)
        .collect()
}
