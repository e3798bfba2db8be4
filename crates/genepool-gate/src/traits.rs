use async_trait::async_trait;
use genepool_types::{
    BundleFormat, Decision, GateId, GateRecord, GateStage, GateStatus, ParsedBundle,
    ValidationPlan,
};
use thiserror::Error;

use crate::error::GateError;

/// Persistence contract for gate records.
///
/// The pipeline writes status at every stage boundary so that status
/// queries keep answering after the process that ran the pipeline has
/// exited. Implementations must enforce forward-only status movement per
/// gate id.
#[async_trait]
pub trait GateStore: Send + Sync {
    /// Create the row for a freshly accepted submission, in `received`.
    async fn insert_gate(&self, gate_id: &GateId, bundle_hash: &str) -> Result<(), GateError>;

    /// Record a status transition. `stage` of `None` leaves the recorded
    /// stage untouched (used by failure finalization, which reports the
    /// stage that was last reached).
    async fn update_status(
        &self,
        gate_id: &GateId,
        status: GateStatus,
        stage: Option<GateStage>,
        error_code: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<(), GateError>;

    /// Record the terminal decision and its reason.
    async fn update_decision(
        &self,
        gate_id: &GateId,
        decision: Decision,
        reason: &str,
    ) -> Result<(), GateError>;

    async fn get_gate(&self, gate_id: &GateId) -> Result<Option<GateRecord>, GateError>;
}

/// Byte storage for bundles, patches, and validation reports. The pipeline
/// only ever passes keys around; store semantics stay behind this trait.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), GateError>;
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, GateError>;
}

/// Failure reported by a CI adapter operation.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct CiError(pub String);

/// Input handed to the external validation runner.
#[derive(Clone, Debug)]
pub struct CiTaskInput {
    pub gate_id: GateId,
    /// Git commit / branch the runner should check out.
    pub repo_ref: String,
    /// Object-store key of the patch to apply, when a capsule is present.
    pub patch_key: Option<String>,
    pub validation_plan: ValidationPlan,
}

/// Status reported by the external runner for a triggered job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CiTaskStatus {
    Running,
    Pass,
    Fail,
    Error,
}

/// One poll answer from the external runner.
#[derive(Clone, Debug)]
pub struct CiTaskOutput {
    pub status: CiTaskStatus,
    /// Object-store key of the validation report, when the runner uploaded one.
    pub report_key: Option<String>,
    /// Link to the runner's own log view.
    pub log_url: Option<String>,
    pub error_message: Option<String>,
}

impl CiTaskOutput {
    pub fn running() -> Self {
        Self {
            status: CiTaskStatus::Running,
            report_key: None,
            log_url: None,
            error_message: None,
        }
    }

    pub fn pass() -> Self {
        Self {
            status: CiTaskStatus::Pass,
            report_key: None,
            log_url: None,
            error_message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            status: CiTaskStatus::Fail,
            report_key: None,
            log_url: None,
            error_message: Some(message.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: CiTaskStatus::Error,
            report_key: None,
            log_url: None,
            error_message: Some(message.into()),
        }
    }
}

/// Abstraction over an external validation runner.
///
/// This is the one external interface whose shape is normative: multiple
/// vendor integrations must satisfy it identically. Cancellation must
/// always be forwarded via `cancel_task`, never silently dropped.
#[async_trait]
pub trait CiAdapter: Send + Sync {
    /// Start a validation job; returns the runner's external job id.
    async fn trigger_task(&self, input: CiTaskInput) -> Result<String, CiError>;

    async fn check_status(&self, external_id: &str) -> Result<CiTaskOutput, CiError>;

    async fn cancel_task(&self, external_id: &str) -> Result<(), CiError>;
}

/// Decodes raw bundle bytes into structured assets.
///
/// Archive unpacking (zip / tar.gz) lives behind this trait; the pipeline
/// only depends on the contract "bytes in, parsed bundle or schema error
/// out".
pub trait BundleDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8], format: BundleFormat) -> Result<ParsedBundle, GateError>;
}
