//! Stage 5: promotion scoring.
//!
//! Combines the security report, the CI outcome, and the gene's intrinsic
//! confidence into a terminal decision. Precedence is fixed: a failing CI
//! run rejects regardless of confidence, and critical risk quarantines,
//! re-asserted here even though the orchestrator short-circuits earlier.

use genepool_types::{
    Decision, GateId, ParsedBundle, PromotionDecision, RiskLevel, SecurityReport, SubmitMode,
    ValidationResult,
};
use tracing::debug;

use crate::cancel::CancelToken;
use crate::config::PromotionThresholds;
use crate::error::GateError;

pub fn run(
    gate_id: &GateId,
    bundle: &ParsedBundle,
    security_report: &SecurityReport,
    validation_result: &ValidationResult,
    submit_mode: Option<SubmitMode>,
    thresholds: &PromotionThresholds,
    cancel: &CancelToken,
) -> Result<PromotionDecision, GateError> {
    if cancel.is_cancelled() {
        return Err(GateError::Cancelled);
    }

    if !validation_result.passed() {
        return Ok(PromotionDecision {
            decision: Decision::Rejected,
            reason: "CI validation failed".into(),
            score: None,
            auto_promote: false,
        });
    }

    if security_report.risk_level == RiskLevel::Critical {
        return Ok(PromotionDecision {
            decision: Decision::Quarantined,
            reason: "Critical security risk detected".into(),
            score: None,
            auto_promote: false,
        });
    }

    // Composite score. Only the intrinsic term is populated today; the
    // usage-history and freshness terms are reserved extension points and
    // carry no weighting until they are computed.
    let score = bundle.gene.confidence;

    let eligible = score >= thresholds.confidence_min
        && security_report.risk_level == RiskLevel::Low
        && security_report.blast_radius_safe;

    let decision = if eligible && submit_mode != Some(SubmitMode::CandidateOnly) {
        PromotionDecision {
            decision: Decision::Promoted,
            reason: format!("Auto-promoted: high confidence ({score:.2}) and passed all checks"),
            score: Some(score),
            auto_promote: true,
        }
    } else {
        let reason = if score < thresholds.confidence_min {
            format!("Confidence ({score:.2}) below auto-promote threshold")
        } else {
            "Passed validation, waiting for manual review".to_string()
        };
        PromotionDecision {
            decision: Decision::Candidate,
            reason,
            score: Some(score),
            auto_promote: false,
        }
    };

    debug!(gate_id = %gate_id, decision = %decision.decision, score, "Promotion decision");
    Ok(decision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use genepool_types::{
        Gene, StepStatus, ValidationPlan, ValidationStatus, ValidationStep, ValidationTask,
    };

    fn bundle_with_confidence(confidence: f64) -> ParsedBundle {
        ParsedBundle {
            gene: Gene {
                gene_id: "sha256:abc".into(),
                summary: "fix".into(),
                signals: vec![],
                tags: vec![],
                preconditions: vec![],
                constraints: vec![],
                validation_plan: ValidationPlan {
                    tasks: vec![ValidationTask::named("build_linux")],
                    resource_limits: None,
                },
                confidence,
                metadata: serde_json::Map::new(),
            },
            capsule: None,
            event: None,
            artifacts: Default::default(),
        }
    }

    fn low_risk_report() -> SecurityReport {
        SecurityReport {
            validation_plan_safe: true,
            dangerous_commands: vec![],
            external_commands: vec![],
            blast_radius_safe: true,
            risk_level: RiskLevel::Low,
            notes: vec![],
        }
    }

    fn passing_result() -> ValidationResult {
        ValidationResult {
            status: ValidationStatus::Pass,
            steps: vec![ValidationStep {
                name: "build_linux".into(),
                status: StepStatus::Pass,
                duration_ms: None,
                output: None,
                error: None,
            }],
            artifacts: None,
            env_fingerprint: None,
        }
    }

    fn failing_result() -> ValidationResult {
        ValidationResult {
            status: ValidationStatus::Fail,
            steps: vec![],
            artifacts: None,
            env_fingerprint: None,
        }
    }

    fn decide(
        confidence: f64,
        report: SecurityReport,
        result: ValidationResult,
        mode: Option<SubmitMode>,
    ) -> PromotionDecision {
        run(
            &GateId::generate(),
            &bundle_with_confidence(confidence),
            &report,
            &result,
            mode,
            &PromotionThresholds::default(),
            &CancelToken::new(),
        )
        .unwrap()
    }

    #[test]
    fn ci_failure_rejects_regardless_of_confidence() {
        let decision = decide(0.99, low_risk_report(), failing_result(), None);
        assert_eq!(decision.decision, Decision::Rejected);
        assert!(!decision.auto_promote);
    }

    #[test]
    fn critical_risk_quarantines_even_on_ci_pass() {
        let mut report = low_risk_report();
        report.risk_level = RiskLevel::Critical;
        let decision = decide(0.99, report, passing_result(), None);
        assert_eq!(decision.decision, Decision::Quarantined);
    }

    #[test]
    fn high_confidence_low_risk_auto_promotes() {
        let decision = decide(0.95, low_risk_report(), passing_result(), None);
        assert_eq!(decision.decision, Decision::Promoted);
        assert!(decision.auto_promote);
        assert_eq!(decision.score, Some(0.95));
    }

    #[test]
    fn candidate_only_mode_blocks_auto_promotion() {
        let decision = decide(
            0.95,
            low_risk_report(),
            passing_result(),
            Some(SubmitMode::CandidateOnly),
        );
        assert_eq!(decision.decision, Decision::Candidate);
        assert!(decision.reason.contains("manual review"));
    }

    #[test]
    fn below_threshold_confidence_becomes_candidate() {
        let decision = decide(0.5, low_risk_report(), passing_result(), None);
        assert_eq!(decision.decision, Decision::Candidate);
        assert!(decision.reason.contains("below auto-promote threshold"));
    }

    #[test]
    fn medium_risk_blocks_auto_promotion() {
        let mut report = low_risk_report();
        report.risk_level = RiskLevel::Medium;
        let decision = decide(0.95, report, passing_result(), None);
        assert_eq!(decision.decision, Decision::Candidate);
    }

    #[test]
    fn unsafe_blast_radius_blocks_auto_promotion() {
        let mut report = low_risk_report();
        report.blast_radius_safe = false;
        let decision = decide(0.95, report, passing_result(), None);
        assert_eq!(decision.decision, Decision::Candidate);
    }
}
