use serde::{Deserialize, Serialize};

/// Terminal judgment for one admission attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Promoted for reuse without human review.
    Promoted,
    /// Passed technical checks, awaiting manual review.
    Candidate,
    Rejected,
    /// Unacceptable security risk; held out of the pool.
    Quarantined,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Decision::Promoted => "promoted",
            Decision::Candidate => "candidate",
            Decision::Rejected => "rejected",
            Decision::Quarantined => "quarantined",
        };
        write!(f, "{name}")
    }
}

/// The scorer's full verdict: the decision plus how it was reached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromotionDecision {
    pub decision: Decision,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub auto_promote: bool,
}

/// How the submitting node wants its contribution handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitMode {
    /// Never auto-promote; always hold for manual review.
    CandidateOnly,
    /// Allow auto-promotion when thresholds are met.
    AutoPromote,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_wire_values() {
        assert_eq!(
            serde_json::to_string(&Decision::Quarantined).unwrap(),
            "\"quarantined\""
        );
        let parsed: Decision = serde_json::from_str("\"promoted\"").unwrap();
        assert_eq!(parsed, Decision::Promoted);
    }

    #[test]
    fn submit_mode_wire_values() {
        assert_eq!(
            serde_json::to_string(&SubmitMode::CandidateOnly).unwrap(),
            "\"candidate_only\""
        );
        let parsed: SubmitMode = serde_json::from_str("\"auto_promote\"").unwrap();
        assert_eq!(parsed, SubmitMode::AutoPromote);
    }
}
