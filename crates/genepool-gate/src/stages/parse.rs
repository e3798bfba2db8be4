//! Stage 1: decode the bundle and validate its structure.

use genepool_types::{GateId, ParsedBundle};
use tracing::debug;

use crate::cancel::CancelToken;
use crate::context::Submission;
use crate::error::GateError;
use crate::traits::{BundleDecoder, ObjectStore};

pub async fn run(
    gate_id: &GateId,
    submission: &Submission,
    objects: &dyn ObjectStore,
    decoder: &dyn BundleDecoder,
    cancel: &CancelToken,
) -> Result<ParsedBundle, GateError> {
    if cancel.is_cancelled() {
        return Err(GateError::Cancelled);
    }

    let bytes = objects
        .get(&submission.bundle_key)
        .await?
        .ok_or_else(|| GateError::MissingField(format!("bundle bytes at {}", submission.bundle_key)))?;

    let bundle = decoder.decode(&bytes, submission.bundle_format)?;
    validate_structure(&bundle)?;

    debug!(gate_id = %gate_id, gene = %bundle.gene.gene_id, "Parsed bundle");
    Ok(bundle)
}

/// Structural checks the decoder cannot express through serde alone.
fn validate_structure(bundle: &ParsedBundle) -> Result<(), GateError> {
    let gene = &bundle.gene;
    if gene.gene_id.is_empty() {
        return Err(GateError::MissingField("gene.gene_id".into()));
    }
    if gene.summary.trim().is_empty() {
        return Err(GateError::MissingField("gene.summary".into()));
    }
    if !(0.0..=1.0).contains(&gene.confidence) {
        return Err(GateError::InvalidBundle(format!(
            "gene.confidence out of range: {}",
            gene.confidence
        )));
    }
    if gene.validation_plan.tasks.is_empty() {
        return Err(GateError::MissingField("gene.validation_plan.tasks".into()));
    }

    if let Some(capsule) = &bundle.capsule {
        if capsule.capsule_id.is_empty() {
            return Err(GateError::MissingField("capsule.capsule_id".into()));
        }
        if capsule.gene_id != gene.gene_id {
            return Err(GateError::InvalidBundle(format!(
                "capsule {} is bound to gene {}, bundle carries gene {}",
                capsule.capsule_id, capsule.gene_id, gene.gene_id
            )));
        }
        if !(0.0..=1.0).contains(&capsule.confidence) {
            return Err(GateError::InvalidBundle(format!(
                "capsule.confidence out of range: {}",
                capsule.confidence
            )));
        }
        if capsule.patch_object_key.is_empty() {
            return Err(GateError::MissingField("capsule.patch_object_key".into()));
        }
    }

    Ok(())
}
