//! The gate pipeline orchestrator.
//!
//! Runs the five stages strictly in order on one [`GateContext`],
//! persisting status and stage at every boundary so status queries keep
//! answering after this process exits. Stage branching is explicit: the
//! orchestrator inspects each stage's typed output to decide the next
//! transition, including the critical-risk short-circuit past CI.

use std::sync::Arc;

use genepool_types::{
    Decision, GateStage, GateStatus, PromotionDecision, RiskLevel,
};
use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::config::GateConfig;
use crate::context::GateContext;
use crate::error::{codes, GateError};
use crate::stages;
use crate::traits::{BundleDecoder, CiAdapter, GateStore, ObjectStore};

/// The 5-stage admission pipeline.
pub struct GatePipeline {
    store: Arc<dyn GateStore>,
    objects: Arc<dyn ObjectStore>,
    ci: Arc<dyn CiAdapter>,
    decoder: Arc<dyn BundleDecoder>,
    config: GateConfig,
}

impl GatePipeline {
    pub fn new(
        store: Arc<dyn GateStore>,
        objects: Arc<dyn ObjectStore>,
        ci: Arc<dyn CiAdapter>,
        decoder: Arc<dyn BundleDecoder>,
        config: GateConfig,
    ) -> Self {
        Self {
            store,
            objects,
            ci,
            decoder,
            config,
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Execute all stages for one gate.
    ///
    /// On success the returned decision has also been persisted. On error
    /// the gate row ends `failed` (or `quarantined` when the error code
    /// signals critical risk) with the error's code and message recorded.
    /// The caller owns the running-registry entry and must release it on
    /// every exit path.
    pub async fn execute(
        &self,
        ctx: &mut GateContext,
        cancel: CancelToken,
    ) -> Result<PromotionDecision, GateError> {
        match self.run_stages(ctx, &cancel).await {
            Ok(decision) => Ok(decision),
            Err(err) => {
                self.finalize_error(ctx, &err).await;
                Err(err)
            }
        }
    }

    async fn run_stages(
        &self,
        ctx: &mut GateContext,
        cancel: &CancelToken,
    ) -> Result<PromotionDecision, GateError> {
        let gate_id = ctx.gate_id.clone();

        // Stage 1: parse.
        self.store
            .update_status(&gate_id, GateStatus::Received, Some(GateStage::Parse), None, None)
            .await?;
        let bundle = stages::parse::run(
            &gate_id,
            &ctx.submission,
            self.objects.as_ref(),
            self.decoder.as_ref(),
            cancel,
        )
        .await?;
        ctx.parsed_bundle = Some(bundle.clone());

        // Stage 2: hash verify.
        self.store
            .update_status(&gate_id, GateStatus::SchemaOk, Some(GateStage::HashVerify), None, None)
            .await?;
        ctx.verified_assets = Some(stages::hash_verify::run(&gate_id, &bundle, cancel)?);

        // Stage 3: security check.
        self.store
            .update_status(
                &gate_id,
                GateStatus::PolicyOk,
                Some(GateStage::SecurityCheck),
                None,
                None,
            )
            .await?;
        let report = stages::security::run(&gate_id, &bundle, &self.config.blast_radius, cancel)?;
        ctx.security_report = Some(report.clone());

        // Critical risk short-circuits straight to quarantine; the CI
        // stage never sees the bundle.
        if report.risk_level == RiskLevel::Critical {
            let decision = PromotionDecision {
                decision: Decision::Quarantined,
                reason: "Critical security risk detected".into(),
                score: None,
                auto_promote: false,
            };
            warn!(gate_id = %gate_id, "Critical risk, quarantining without CI validation");
            self.store
                .update_status(
                    &gate_id,
                    GateStatus::Quarantined,
                    Some(GateStage::SecurityCheck),
                    Some(codes::E_POLICY_CRITICAL_RISK),
                    Some(&decision.reason),
                )
                .await?;
            self.store
                .update_decision(&gate_id, decision.decision, &decision.reason)
                .await?;
            ctx.decision = Some(decision.clone());
            return Ok(decision);
        }

        // Stage 4: CI validate.
        self.store
            .update_status(
                &gate_id,
                GateStatus::PolicyOk,
                Some(GateStage::CiValidate),
                None,
                None,
            )
            .await?;
        let result = stages::ci_validate::run(
            &gate_id,
            &bundle,
            self.ci.as_ref(),
            self.objects.as_ref(),
            &self.config.ci,
            cancel,
        )
        .await?;
        ctx.validation_result = Some(result.clone());

        // Stage 5: score and promote.
        self.store
            .update_status(
                &gate_id,
                GateStatus::Validated,
                Some(GateStage::ScorePromote),
                None,
                None,
            )
            .await?;
        let decision = stages::score::run(
            &gate_id,
            &bundle,
            &report,
            &result,
            ctx.submission.submit_mode,
            &self.config.auto_promote,
            cancel,
        )?;

        // Finalize: terminal status plus the decision row.
        self.store
            .update_status(
                &gate_id,
                decision.decision.into(),
                Some(GateStage::ScorePromote),
                None,
                None,
            )
            .await?;
        self.store
            .update_decision(&gate_id, decision.decision, &decision.reason)
            .await?;
        ctx.decision = Some(decision.clone());

        info!(gate_id = %gate_id, decision = %decision.decision, "Gate pipeline complete");
        Ok(decision)
    }

    /// Record a stage failure on the gate row. Critical-risk errors
    /// quarantine; everything else fails. Store errors here are logged,
    /// not propagated; the original failure is what the caller must see.
    async fn finalize_error(&self, ctx: &GateContext, err: &GateError) {
        let status = if err.code() == codes::E_POLICY_CRITICAL_RISK {
            GateStatus::Quarantined
        } else {
            GateStatus::Failed
        };
        if let Err(store_err) = self
            .store
            .update_status(&ctx.gate_id, status, None, Some(err.code()), Some(&err.to_string()))
            .await
        {
            warn!(
                gate_id = %ctx.gate_id,
                error = %store_err,
                "Could not record gate failure"
            );
        }
    }
}
