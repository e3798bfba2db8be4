use genepool_types::{
    BundleFormat, GateId, NodeId, ParsedBundle, PromotionDecision, SecurityReport, SubmitMode,
    ValidationResult, VerifiedAssets,
};

/// What a node submitted, as handed to the scheduler.
///
/// Bundle bytes live in the object store; the submission carries only the
/// key, never the bytes themselves.
#[derive(Clone, Debug)]
pub struct Submission {
    /// `sha256:`-prefixed hash of the archive bytes as declared by the sender.
    pub bundle_hash: String,
    pub sender_id: NodeId,
    /// Object-store key of the raw bundle bytes.
    pub bundle_key: String,
    pub bundle_format: BundleFormat,
    pub project: Option<String>,
    pub namespace: Option<String>,
    pub submit_mode: Option<SubmitMode>,
}

/// Mutable working state of a single pipeline execution.
///
/// Exclusively owned by the one execution that created it and discarded
/// when the run ends; terminal facts are projected into the persisted gate
/// record, the context itself is never durable.
#[derive(Clone, Debug)]
pub struct GateContext {
    pub gate_id: GateId,
    pub submission: Submission,

    // Stage outputs, populated in pipeline order.
    pub parsed_bundle: Option<ParsedBundle>,
    pub verified_assets: Option<VerifiedAssets>,
    pub security_report: Option<SecurityReport>,
    pub validation_result: Option<ValidationResult>,
    pub decision: Option<PromotionDecision>,
}

impl GateContext {
    pub fn new(gate_id: GateId, submission: Submission) -> Self {
        Self {
            gate_id,
            submission,
            parsed_bundle: None,
            verified_assets: None,
            security_report: None,
            validation_result: None,
            decision: None,
        }
    }
}
