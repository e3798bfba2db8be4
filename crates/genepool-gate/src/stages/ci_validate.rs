//! Stage 4: external CI validation.
//!
//! Triggers the runner once, then polls on a fixed interval up to a
//! bounded number of attempts: the one intentional retry loop in the
//! pipeline, and the dominant source of wall-clock latency. The
//! cancellation token is observed on every poll iteration, and a
//! cancellation is always forwarded to the runner via `cancel_task`
//! before it propagates.

use genepool_types::{
    GateId, ParsedBundle, StepStatus, ValidationResult, ValidationStatus, ValidationStep,
};
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::config::CiConfig;
use crate::error::GateError;
use crate::traits::{CiAdapter, CiTaskInput, CiTaskStatus, ObjectStore};

pub async fn run(
    gate_id: &GateId,
    bundle: &ParsedBundle,
    ci: &dyn CiAdapter,
    objects: &dyn ObjectStore,
    config: &CiConfig,
    cancel: &CancelToken,
) -> Result<ValidationResult, GateError> {
    if cancel.is_cancelled() {
        return Err(GateError::Cancelled);
    }

    let input = CiTaskInput {
        gate_id: gate_id.clone(),
        repo_ref: bundle
            .gene
            .metadata
            .get("repo_ref")
            .and_then(|v| v.as_str())
            .unwrap_or("main")
            .to_string(),
        patch_key: bundle.capsule.as_ref().map(|c| c.patch_object_key.clone()),
        validation_plan: bundle.gene.validation_plan.clone(),
    };

    let external_id = ci
        .trigger_task(input)
        .await
        .map_err(|err| GateError::CiJob(format!("trigger failed: {err}")))?;
    info!(gate_id = %gate_id, external_id = %external_id, "CI validation triggered");

    let mut polls = 0u32;
    loop {
        if cancel.is_cancelled() {
            if let Err(err) = ci.cancel_task(&external_id).await {
                warn!(
                    gate_id = %gate_id,
                    external_id = %external_id,
                    error = %err,
                    "Could not forward cancellation to CI runner"
                );
            }
            return Err(GateError::Cancelled);
        }

        let output = ci
            .check_status(&external_id)
            .await
            .map_err(|err| GateError::CiJob(format!("status check failed: {err}")))?;

        match output.status {
            CiTaskStatus::Running => {
                polls += 1;
                if polls >= config.max_polls {
                    return Err(GateError::CiTimeout { polls });
                }
                tokio::time::sleep(config.poll_interval).await;
            }
            CiTaskStatus::Pass => {
                debug!(gate_id = %gate_id, polls, "CI validation passed");
                return Ok(passing_result(bundle, objects, output.report_key.as_deref()).await);
            }
            CiTaskStatus::Fail | CiTaskStatus::Error => {
                debug!(gate_id = %gate_id, polls, "CI validation failed");
                return Ok(failing_result(bundle, output.error_message));
            }
        }
    }
}

/// Build the passing result, preferring the runner's own report when it
/// uploaded one; otherwise synthesize passing steps from the plan.
async fn passing_result(
    bundle: &ParsedBundle,
    objects: &dyn ObjectStore,
    report_key: Option<&str>,
) -> ValidationResult {
    if let Some(key) = report_key {
        match objects.get(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<ValidationResult>(&bytes) {
                Ok(report) => return report,
                Err(err) => {
                    warn!(report_key = key, error = %err, "Unreadable validation report, synthesizing")
                }
            },
            Ok(None) => warn!(report_key = key, "Validation report missing from object store"),
            Err(err) => warn!(report_key = key, error = %err, "Validation report fetch failed"),
        }
    }

    ValidationResult {
        status: ValidationStatus::Pass,
        steps: plan_steps(bundle, StepStatus::Pass, None),
        artifacts: None,
        env_fingerprint: None,
    }
}

fn failing_result(bundle: &ParsedBundle, error_message: Option<String>) -> ValidationResult {
    ValidationResult {
        status: ValidationStatus::Fail,
        steps: plan_steps(bundle, StepStatus::Fail, error_message),
        artifacts: None,
        env_fingerprint: None,
    }
}

fn plan_steps(
    bundle: &ParsedBundle,
    status: StepStatus,
    error: Option<String>,
) -> Vec<ValidationStep> {
    bundle
        .gene
        .validation_plan
        .tasks
        .iter()
        .map(|task| ValidationStep {
            name: task.name.clone(),
            status,
            duration_ms: None,
            output: None,
            error: error.clone(),
        })
        .collect()
}
