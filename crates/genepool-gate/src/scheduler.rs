//! Bounded-concurrency admission scheduler.
//!
//! Owns the only shared mutable state in the gate core: the pending queue
//! and the table of running executions keyed by gate id, both behind one
//! lock so admit, cancel, and status queries stay atomic with respect to
//! each other. At most one execution runs per gate id, and the running
//! count never exceeds the configured cap.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use genepool_types::{GateId, GateStatus};
use tokio::sync::{Mutex, RwLock};
use tokio::time::interval;
use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::config::SchedulerConfig;
use crate::context::{GateContext, Submission};
use crate::error::{codes, GateError};
use crate::pipeline::GatePipeline;
use crate::traits::GateStore;

/// One pending admission. Lives only in the scheduler's queue; removed the
/// instant it is handed to the pipeline.
struct QueueItem {
    gate_id: GateId,
    context: GateContext,
    priority: i32,
    #[allow(dead_code)]
    queued_at: DateTime<Utc>,
}

struct SchedulerState {
    queue: Vec<QueueItem>,
    running: HashMap<GateId, CancelToken>,
}

/// Snapshot of queue depth and running count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueStatus {
    pub queue_size: usize,
    pub running_count: usize,
    pub max_concurrent: usize,
}

/// The admission scheduler.
pub struct GateScheduler {
    state: Mutex<SchedulerState>,
    pipeline: Arc<GatePipeline>,
    store: Arc<dyn GateStore>,
    config: SchedulerConfig,
    ticking: RwLock<bool>,
}

impl GateScheduler {
    pub fn new(
        pipeline: Arc<GatePipeline>,
        store: Arc<dyn GateStore>,
        config: SchedulerConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SchedulerState {
                queue: Vec::new(),
                running: HashMap::new(),
            }),
            pipeline,
            store,
            config,
            ticking: RwLock::new(false),
        })
    }

    /// Accept a submission: create the gate row, queue the work, and admit
    /// immediately if capacity allows.
    ///
    /// The queue orders by priority descending; the sort is stable, so
    /// equal priorities drain in arrival order and no submission starves.
    pub async fn enqueue(
        self: &Arc<Self>,
        submission: Submission,
        priority: i32,
    ) -> Result<GateId, GateError> {
        let gate_id = GateId::generate();
        self.store.insert_gate(&gate_id, &submission.bundle_hash).await?;

        let context = GateContext::new(gate_id.clone(), submission);
        {
            let mut state = self.state.lock().await;
            state.queue.push(QueueItem {
                gate_id: gate_id.clone(),
                context,
                priority,
                queued_at: Utc::now(),
            });
            state.queue.sort_by(|a, b| b.priority.cmp(&a.priority));
            info!(
                gate_id = %gate_id,
                priority,
                queue_size = state.queue.len(),
                "Enqueued gate"
            );
        }

        self.try_admit().await;
        Ok(gate_id)
    }

    /// Admit queued work while capacity remains.
    ///
    /// Called on every enqueue, on every completion, and from the periodic
    /// tick. The running-table insert happens under the lock, before the
    /// execution task spawns, so a burst of admissions can never overshoot
    /// the cap.
    pub fn try_admit(
        self: &Arc<Self>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
        loop {
            let (item, token) = {
                let mut state = self.state.lock().await;
                if state.running.len() >= self.config.max_concurrent_gates
                    || state.queue.is_empty()
                {
                    return;
                }
                let item = state.queue.remove(0);
                let token = CancelToken::new();
                state.running.insert(item.gate_id.clone(), token.clone());
                (item, token)
            };

            info!(gate_id = %item.gate_id, "Admitting gate for execution");
            let scheduler = Arc::clone(self);
            tokio::spawn(async move {
                let QueueItem {
                    gate_id,
                    mut context,
                    ..
                } = item;
                match scheduler.pipeline.execute(&mut context, token).await {
                    Ok(decision) => {
                        info!(gate_id = %gate_id, decision = %decision.decision, "Gate completed");
                    }
                    Err(err) => {
                        warn!(gate_id = %gate_id, code = err.code(), error = %err, "Gate failed");
                    }
                }
                scheduler.release(&gate_id).await;
            });
        }
        })
    }

    /// Release a finished execution and immediately admit the next item.
    /// This is the point that frees scheduler capacity, on every exit path.
    async fn release(self: &Arc<Self>, gate_id: &GateId) {
        {
            let mut state = self.state.lock().await;
            state.running.remove(gate_id);
        }
        self.try_admit().await;
    }

    /// Cancel a running execution.
    ///
    /// Signals the execution's token, frees its running slot, and marks
    /// the gate failed with a cancellation code. Returns `false` when no
    /// execution for the id is currently running; merely-queued and
    /// already-finished gates are left untouched.
    pub async fn cancel(&self, gate_id: &GateId) -> bool {
        let token = {
            let mut state = self.state.lock().await;
            match state.running.remove(gate_id) {
                Some(token) => token,
                None => return false,
            }
        };

        token.cancel();
        if let Err(err) = self
            .store
            .update_status(
                gate_id,
                GateStatus::Failed,
                None,
                Some(codes::E_GATE_CANCELLED),
                Some("Gate cancelled by operator"),
            )
            .await
        {
            // The execution may have finalized between our lookup and this
            // write; the token is signalled either way.
            warn!(gate_id = %gate_id, error = %err, "Cancellation status write failed");
        }
        info!(gate_id = %gate_id, "Gate cancelled");
        true
    }

    /// The gate store this scheduler persists through.
    pub fn store(&self) -> &Arc<dyn GateStore> {
        &self.store
    }

    pub async fn queue_status(&self) -> QueueStatus {
        let state = self.state.lock().await;
        QueueStatus {
            queue_size: state.queue.len(),
            running_count: state.running.len(),
            max_concurrent: self.config.max_concurrent_gates,
        }
    }

    /// Start the periodic admission tick. Runs until [`Self::stop`].
    pub async fn start(self: &Arc<Self>) {
        {
            let mut ticking = self.ticking.write().await;
            if *ticking {
                warn!("Scheduler tick already running");
                return;
            }
            *ticking = true;
        }

        info!(
            max_concurrent = self.config.max_concurrent_gates,
            "Scheduler started"
        );

        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = interval(scheduler.config.tick_interval);
            loop {
                tick.tick().await;
                if !*scheduler.ticking.read().await {
                    break;
                }
                scheduler.try_admit().await;
            }
            info!("Scheduler stopped");
        });
    }

    /// Stop the periodic tick. In-flight executions keep running.
    pub async fn stop(&self) {
        let mut ticking = self.ticking.write().await;
        *ticking = false;
    }

    /// Current queue order, for assertions.
    #[cfg(test)]
    pub(crate) async fn queued_order(&self) -> Vec<GateId> {
        let state = self.state.lock().await;
        state.queue.iter().map(|item| item.gate_id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CiConfig, GateConfig};
    use crate::mocks::{MockBundleDecoder, MockCiAdapter};
    use crate::store::{MemoryGateStore, MemoryObjectStore};
    use crate::traits::ObjectStore;
    use genepool_canonical::content_id_excluding;
    use genepool_types::{
        BundleFormat, Decision, Gene, NodeId, ParsedBundle, ValidationPlan, ValidationTask,
    };
    use std::time::Duration;

    fn sealed_bundle() -> ParsedBundle {
        let mut gene = Gene {
            gene_id: String::new(),
            summary: "fix".into(),
            signals: vec![],
            tags: vec![],
            preconditions: vec![],
            constraints: vec![],
            validation_plan: ValidationPlan {
                tasks: vec![ValidationTask::named("build_linux")],
                resource_limits: None,
            },
            confidence: 0.95,
            metadata: serde_json::Map::new(),
        };
        gene.gene_id = content_id_excluding(&gene, "gene_id").unwrap();
        ParsedBundle {
            gene,
            capsule: None,
            event: None,
            artifacts: Default::default(),
        }
    }

    fn submission() -> Submission {
        Submission {
            bundle_hash: "sha256:beef".into(),
            sender_id: NodeId::from("node_a"),
            bundle_key: "bundles/node_a/beef".into(),
            bundle_format: BundleFormat::Zip,
            project: None,
            namespace: None,
            submit_mode: None,
        }
    }

    async fn scheduler_with(
        ci: MockCiAdapter,
        max_concurrent: usize,
    ) -> (Arc<GateScheduler>, Arc<MemoryGateStore>) {
        let store = Arc::new(MemoryGateStore::new());
        let objects = Arc::new(MemoryObjectStore::new());
        objects.put("bundles/node_a/beef", b"{}".to_vec()).await.unwrap();

        let pipeline = Arc::new(GatePipeline::new(
            store.clone(),
            objects,
            Arc::new(ci),
            Arc::new(MockBundleDecoder::returning(sealed_bundle())),
            GateConfig {
                ci: CiConfig {
                    poll_interval: Duration::from_millis(5),
                    max_polls: 1000,
                },
                ..GateConfig::default()
            },
        ));
        let scheduler = GateScheduler::new(
            pipeline,
            store.clone(),
            SchedulerConfig {
                max_concurrent_gates: max_concurrent,
                tick_interval: Duration::from_millis(10),
            },
        );
        (scheduler, store)
    }

    async fn wait_for_terminal(store: &MemoryGateStore, gate_id: &GateId) -> GateStatus {
        for _ in 0..500 {
            let record = store.get_gate(gate_id).await.unwrap().unwrap();
            if record.status.is_terminal() {
                return record.status;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("gate {gate_id} never reached a terminal status");
    }

    #[tokio::test]
    async fn enqueue_runs_to_completion() {
        let (scheduler, store) = scheduler_with(MockCiAdapter::passing(), 2).await;
        let gate_id = scheduler.enqueue(submission(), 0).await.unwrap();

        let status = wait_for_terminal(&store, &gate_id).await;
        assert_eq!(status, GateStatus::Promoted);

        let record = store.get_gate(&gate_id).await.unwrap().unwrap();
        assert_eq!(record.decision, Some(Decision::Promoted));

        let status = scheduler.queue_status().await;
        assert_eq!(status.queue_size, 0);
        assert_eq!(status.running_count, 0);
    }

    #[tokio::test]
    async fn running_never_exceeds_the_cap() {
        let (scheduler, _store) = scheduler_with(MockCiAdapter::always_running(), 2).await;

        let mut ids = Vec::new();
        for _ in 0..6 {
            ids.push(scheduler.enqueue(submission(), 0).await.unwrap());
        }

        // Let admissions settle; executions are parked in the CI poll loop.
        tokio::time::sleep(Duration::from_millis(30)).await;
        let status = scheduler.queue_status().await;
        assert_eq!(status.running_count, 2);
        assert_eq!(status.queue_size, 4);

        // Freeing one slot admits exactly one more.
        assert!(scheduler.cancel(&ids[0]).await || scheduler.cancel(&ids[1]).await);
        tokio::time::sleep(Duration::from_millis(30)).await;
        let status = scheduler.queue_status().await;
        assert_eq!(status.running_count, 2);
        assert_eq!(status.queue_size, 3);
    }

    #[tokio::test]
    async fn priority_orders_admission_fifo_within_ties() {
        // Zero capacity: nothing is ever admitted, so the queue order is
        // exactly the order items would be handed to the pipeline.
        let (scheduler, _store) = scheduler_with(MockCiAdapter::passing(), 0).await;

        let p1a = scheduler.enqueue(submission(), 1).await.unwrap();
        let p5 = scheduler.enqueue(submission(), 5).await.unwrap();
        let p1b = scheduler.enqueue(submission(), 1).await.unwrap();
        let p3 = scheduler.enqueue(submission(), 3).await.unwrap();

        let order = scheduler.queued_order().await;
        assert_eq!(order, vec![p5, p3, p1a, p1b]);
    }

    #[tokio::test]
    async fn cancel_unknown_gate_returns_false() {
        let (scheduler, store) = scheduler_with(MockCiAdapter::passing(), 1).await;
        let gate_id = GateId::from("gate_missing");
        assert!(!scheduler.cancel(&gate_id).await);
        assert!(store.get_gate(&gate_id).await.unwrap().is_none());
    }

    async fn wait_for_idle(scheduler: &GateScheduler) {
        for _ in 0..500 {
            if scheduler.queue_status().await.running_count == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("scheduler never went idle");
    }

    #[tokio::test]
    async fn cancel_finished_gate_returns_false_and_leaves_status() {
        let (scheduler, store) = scheduler_with(MockCiAdapter::passing(), 1).await;
        let gate_id = scheduler.enqueue(submission(), 0).await.unwrap();
        wait_for_terminal(&store, &gate_id).await;
        // The terminal row lands before the running slot is released;
        // wait for the release too before asserting the no-op.
        wait_for_idle(&scheduler).await;

        assert!(!scheduler.cancel(&gate_id).await);
        let record = store.get_gate(&gate_id).await.unwrap().unwrap();
        assert_eq!(record.status, GateStatus::Promoted);
    }

    #[tokio::test]
    async fn cancel_running_gate_marks_it_failed() {
        let (scheduler, store) = scheduler_with(MockCiAdapter::always_running(), 1).await;
        let gate_id = scheduler.enqueue(submission(), 0).await.unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(scheduler.cancel(&gate_id).await);

        let status = wait_for_terminal(&store, &gate_id).await;
        assert_eq!(status, GateStatus::Failed);
        let record = store.get_gate(&gate_id).await.unwrap().unwrap();
        assert_eq!(record.error_code.as_deref(), Some("E_GATE_CANCELLED"));
    }

    #[tokio::test]
    async fn queue_drains_with_ticker_running() {
        let (scheduler, store) = scheduler_with(MockCiAdapter::passing(), 1).await;

        // Stuff the queue beyond capacity, then rely on completions plus
        // the tick to drain it.
        scheduler.start().await;
        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(scheduler.enqueue(submission(), 0).await.unwrap());
        }
        for gate_id in &ids {
            wait_for_terminal(&store, gate_id).await;
        }
        scheduler.stop().await;

        let status = scheduler.queue_status().await;
        assert_eq!(status.queue_size, 0);
        assert_eq!(status.running_count, 0);
    }
}
