//! Stage 2: re-derive every declared content id from canonical JSON.
//!
//! This stage is what makes content addressing unspoofable: a gene or
//! capsule whose declared id does not match the SHA-256 of its canonical
//! form never reaches the policy engine.

use genepool_canonical::verify_content_id;
use genepool_types::{CanonicalHashes, GateId, ParsedBundle, VerifiedAssets};
use tracing::debug;

use crate::cancel::CancelToken;
use crate::error::GateError;

pub fn run(
    gate_id: &GateId,
    bundle: &ParsedBundle,
    cancel: &CancelToken,
) -> Result<VerifiedAssets, GateError> {
    if cancel.is_cancelled() {
        return Err(GateError::Cancelled);
    }

    let gene_hash = verify_content_id(&bundle.gene.gene_id, &bundle.gene, "gene_id")?;

    let capsule_hash = match &bundle.capsule {
        Some(capsule) => Some(verify_content_id(
            &capsule.capsule_id,
            capsule,
            "capsule_id",
        )?),
        None => None,
    };

    debug!(gate_id = %gate_id, gene = %gene_hash, "Verified content ids");

    // Evolution events carry generated ids, not content hashes; they are
    // recorded but not re-derived.
    Ok(VerifiedAssets {
        gene_id: bundle.gene.gene_id.clone(),
        capsule_id: bundle.capsule.as_ref().map(|c| c.capsule_id.clone()),
        event_id: bundle.event.as_ref().map(|e| e.event_id.clone()),
        hash_verified: true,
        canonical_hashes: CanonicalHashes {
            gene: gene_hash,
            capsule: capsule_hash,
            event: None,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use genepool_canonical::content_id_excluding;
    use genepool_types::{BlastRadius, Capsule, Gene, ValidationPlan, ValidationTask};

    fn sealed_gene() -> Gene {
        let mut gene = Gene {
            gene_id: String::new(),
            summary: "fix".into(),
            signals: vec!["LNK2019".into()],
            tags: vec![],
            preconditions: vec![],
            constraints: vec![],
            validation_plan: ValidationPlan {
                tasks: vec![ValidationTask::named("build_win64")],
                resource_limits: None,
            },
            confidence: 0.9,
            metadata: serde_json::Map::new(),
        };
        gene.gene_id = content_id_excluding(&gene, "gene_id").unwrap();
        gene
    }

    fn sealed_capsule(gene_id: &str) -> Capsule {
        let mut capsule = Capsule {
            capsule_id: String::new(),
            gene_id: gene_id.to_string(),
            confidence: 0.9,
            blast_radius: BlastRadius { files: 1, lines: 10 },
            patch_object_key: "patches/x.diff".into(),
            validation_plan_key: "plans/x.json".into(),
            env_fingerprint: None,
            metadata: serde_json::Map::new(),
        };
        capsule.capsule_id = content_id_excluding(&capsule, "capsule_id").unwrap();
        capsule
    }

    fn bundle() -> ParsedBundle {
        let gene = sealed_gene();
        let capsule = sealed_capsule(&gene.gene_id);
        ParsedBundle {
            gene,
            capsule: Some(capsule),
            event: None,
            artifacts: Default::default(),
        }
    }

    #[test]
    fn sealed_bundle_verifies() {
        let bundle = bundle();
        let assets = run(&GateId::generate(), &bundle, &CancelToken::new()).unwrap();
        assert!(assets.hash_verified);
        assert_eq!(assets.gene_id, bundle.gene.gene_id);
        assert_eq!(
            assets.canonical_hashes.capsule.as_deref(),
            bundle.capsule.as_ref().map(|c| c.capsule_id.as_str())
        );
    }

    #[test]
    fn mutated_gene_fails_with_hash_mismatch() {
        let mut bundle = bundle();
        bundle.gene.confidence = 0.95;
        let err = run(&GateId::generate(), &bundle, &CancelToken::new()).unwrap_err();
        assert_eq!(err.code(), "E_HASH_MISMATCH");
    }

    #[test]
    fn unprefixed_id_fails_with_format_error() {
        let mut bundle = bundle();
        bundle.gene.gene_id = "deadbeef".into();
        let err = run(&GateId::generate(), &bundle, &CancelToken::new()).unwrap_err();
        assert_eq!(err.code(), "E_HASH_INVALID_FORMAT");
    }

    #[test]
    fn mutated_capsule_fails_even_when_gene_is_intact() {
        let mut bundle = bundle();
        bundle.capsule.as_mut().unwrap().blast_radius.lines = 999;
        let err = run(&GateId::generate(), &bundle, &CancelToken::new()).unwrap_err();
        assert_eq!(err.code(), "E_HASH_MISMATCH");
    }

    #[test]
    fn cancelled_token_fails_fast() {
        let token = CancelToken::new();
        token.cancel();
        let err = run(&GateId::generate(), &bundle(), &token).unwrap_err();
        assert!(matches!(err, GateError::Cancelled));
    }
}
