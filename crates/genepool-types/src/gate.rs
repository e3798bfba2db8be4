use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decision::Decision;
use crate::ids::GateId;

/// State-machine state of one admission attempt.
///
/// Legal transitions move strictly forward:
///
/// ```text
/// received → schema_ok → policy_ok → validated
///          → promoted | candidate | rejected | quarantined | failed
/// ```
///
/// `failed` is reachable from any stage on an unhandled error; the four
/// decision states are reachable only from `validated`, except
/// `quarantined`, which the pipeline also enters directly when the
/// security stage detects critical risk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    Received,
    SchemaOk,
    PolicyOk,
    Validated,
    Promoted,
    Candidate,
    Rejected,
    Quarantined,
    Failed,
}

impl GateStatus {
    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GateStatus::Promoted
                | GateStatus::Candidate
                | GateStatus::Rejected
                | GateStatus::Quarantined
                | GateStatus::Failed
        )
    }

    /// Monotonic progress rank. A status update is legal only when the new
    /// rank is greater than or equal to the current one and the current
    /// status is not terminal.
    pub fn rank(&self) -> u8 {
        match self {
            GateStatus::Received => 0,
            GateStatus::SchemaOk => 1,
            GateStatus::PolicyOk => 2,
            GateStatus::Validated => 3,
            GateStatus::Promoted
            | GateStatus::Candidate
            | GateStatus::Rejected
            | GateStatus::Quarantined
            | GateStatus::Failed => 4,
        }
    }

    /// Whether moving from `self` to `next` respects forward-only progress.
    pub fn can_advance_to(&self, next: GateStatus) -> bool {
        !self.is_terminal() && next.rank() >= self.rank()
    }
}

impl std::fmt::Display for GateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GateStatus::Received => "received",
            GateStatus::SchemaOk => "schema_ok",
            GateStatus::PolicyOk => "policy_ok",
            GateStatus::Validated => "validated",
            GateStatus::Promoted => "promoted",
            GateStatus::Candidate => "candidate",
            GateStatus::Rejected => "rejected",
            GateStatus::Quarantined => "quarantined",
            GateStatus::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

impl From<Decision> for GateStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Promoted => GateStatus::Promoted,
            Decision::Candidate => GateStatus::Candidate,
            Decision::Rejected => GateStatus::Rejected,
            Decision::Quarantined => GateStatus::Quarantined,
        }
    }
}

/// The pipeline stage that last ran (or is about to run) for a gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStage {
    Parse,
    HashVerify,
    SecurityCheck,
    CiValidate,
    ScorePromote,
}

impl std::fmt::Display for GateStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GateStage::Parse => "parse",
            GateStage::HashVerify => "hash_verify",
            GateStage::SecurityCheck => "security_check",
            GateStage::CiValidate => "ci_validate",
            GateStage::ScorePromote => "score_promote",
        };
        write!(f, "{name}")
    }
}

/// Persisted, externally visible record of one admission attempt.
///
/// Created when a bundle is accepted for queueing, mutated only by the
/// pipeline at stage boundaries, immutable once `status` is terminal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GateRecord {
    pub gate_id: GateId,
    pub bundle_hash: String,
    pub status: GateStatus,
    pub stage: GateStage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GateRecord {
    /// Fresh record in the initial state.
    pub fn new(gate_id: GateId, bundle_hash: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            gate_id,
            bundle_hash: bundle_hash.into(),
            status: GateStatus::Received,
            stage: GateStage::Parse,
            error_code: None,
            error_message: None,
            decision: None,
            decision_reason: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_values_are_snake_case() {
        assert_eq!(
            serde_json::to_string(&GateStatus::SchemaOk).unwrap(),
            "\"schema_ok\""
        );
        let parsed: GateStatus = serde_json::from_str("\"policy_ok\"").unwrap();
        assert_eq!(parsed, GateStatus::PolicyOk);
    }

    #[test]
    fn terminal_statuses_are_terminal() {
        for status in [
            GateStatus::Promoted,
            GateStatus::Candidate,
            GateStatus::Rejected,
            GateStatus::Quarantined,
            GateStatus::Failed,
        ] {
            assert!(status.is_terminal());
            assert!(!status.can_advance_to(GateStatus::Received));
        }
        assert!(!GateStatus::Received.is_terminal());
    }

    #[test]
    fn rank_enforces_forward_progress() {
        assert!(GateStatus::Received.can_advance_to(GateStatus::SchemaOk));
        assert!(GateStatus::PolicyOk.can_advance_to(GateStatus::PolicyOk));
        assert!(GateStatus::PolicyOk.can_advance_to(GateStatus::Quarantined));
        assert!(!GateStatus::Validated.can_advance_to(GateStatus::Received));
    }

    #[test]
    fn decision_maps_onto_terminal_status() {
        assert_eq!(GateStatus::from(Decision::Promoted), GateStatus::Promoted);
        assert_eq!(
            GateStatus::from(Decision::Quarantined),
            GateStatus::Quarantined
        );
    }

    #[test]
    fn new_record_starts_at_received_parse() {
        let record = GateRecord::new(GateId::generate(), "sha256:beef");
        assert_eq!(record.status, GateStatus::Received);
        assert_eq!(record.stage, GateStage::Parse);
        assert!(record.decision.is_none());
    }
}
