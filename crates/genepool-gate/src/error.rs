use genepool_canonical::CanonicalError;
use thiserror::Error;

/// Stable error codes persisted on the gate record. Status queries must
/// return the same codes after the process that ran the pipeline has
/// exited, so they are part of the external contract.
pub mod codes {
    pub const E_GATE_CANCELLED: &str = "E_GATE_CANCELLED";
    pub const E_SCHEMA_MISSING_FIELD: &str = "E_SCHEMA_MISSING_FIELD";
    pub const E_SCHEMA_INVALID_TYPE: &str = "E_SCHEMA_INVALID_TYPE";
    pub const E_HASH_INVALID_FORMAT: &str = "E_HASH_INVALID_FORMAT";
    pub const E_HASH_MISMATCH: &str = "E_HASH_MISMATCH";
    pub const E_POLICY_CRITICAL_RISK: &str = "E_POLICY_CRITICAL_RISK";
    pub const E_GATE_CI_JOB_FAILED: &str = "E_GATE_CI_JOB_FAILED";
    pub const E_GATE_CI_TIMEOUT: &str = "E_GATE_CI_TIMEOUT";
    pub const E_GATE_INTERNAL_ERROR: &str = "E_GATE_INTERNAL_ERROR";
}

/// Errors from the gate pipeline and its stages.
///
/// Every stage-local failure aborts the remainder of the run; the
/// orchestrator never retries a failed stage. The CI poll loop is the one
/// intentional bounded retry, against a single trigger.
#[derive(Error, Debug)]
pub enum GateError {
    #[error("gate cancelled")]
    Cancelled,

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid bundle structure: {0}")]
    InvalidBundle(String),

    #[error("content id must carry the sha256: prefix, got: {declared}")]
    HashFormat { declared: String },

    #[error("content id mismatch: expected {expected}, declared {declared}")]
    HashMismatch { expected: String, declared: String },

    #[error("critical security risk: {0}")]
    CriticalRisk(String),

    #[error("CI job failed to run: {0}")]
    CiJob(String),

    #[error("CI validation did not finish within {polls} polls")]
    CiTimeout { polls: u32 },

    #[error("gate store error: {0}")]
    Store(String),

    #[error("internal gate error: {0}")]
    Internal(String),
}

impl GateError {
    /// The stable code recorded on the persisted gate row.
    pub fn code(&self) -> &'static str {
        match self {
            GateError::Cancelled => codes::E_GATE_CANCELLED,
            GateError::MissingField(_) => codes::E_SCHEMA_MISSING_FIELD,
            GateError::InvalidBundle(_) => codes::E_SCHEMA_INVALID_TYPE,
            GateError::HashFormat { .. } => codes::E_HASH_INVALID_FORMAT,
            GateError::HashMismatch { .. } => codes::E_HASH_MISMATCH,
            GateError::CriticalRisk(_) => codes::E_POLICY_CRITICAL_RISK,
            GateError::CiJob(_) => codes::E_GATE_CI_JOB_FAILED,
            GateError::CiTimeout { .. } => codes::E_GATE_CI_TIMEOUT,
            GateError::Store(_) | GateError::Internal(_) => codes::E_GATE_INTERNAL_ERROR,
        }
    }
}

impl From<CanonicalError> for GateError {
    fn from(err: CanonicalError) -> Self {
        match err {
            CanonicalError::MissingPrefix { declared } => GateError::HashFormat { declared },
            CanonicalError::Mismatch { expected, declared } => {
                GateError::HashMismatch { expected, declared }
            }
            other => GateError::Internal(other.to_string()),
        }
    }
}
