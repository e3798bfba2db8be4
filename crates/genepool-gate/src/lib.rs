//! Admission gate for contributed fix artifacts.
//!
//! Untrusted nodes publish bundles (a gene, optionally a capsule and a
//! provenance event). The gate decides, per bundle, whether the
//! contribution is safe and trustworthy enough to reuse, automatically or
//! after human review, while enforcing content-address integrity, a
//! security policy allow-list, bounded external validation, and a bounded
//! concurrency discipline.
//!
//! ## 5-Stage Pipeline
//!
//! 1. **Parse** — decode the bundle, validate structure
//! 2. **Hash Verify** — re-derive every content id from canonical JSON
//! 3. **Security Check** — allow-list, dangerous/external command scan,
//!    blast-radius limits, risk scoring
//! 4. **CI Validate** — trigger and poll an external validation runner
//! 5. **Score & Promote** — combine confidence, risk, and CI outcome into
//!    a promotion decision
//!
//! Critical risk at stage 3 short-circuits straight to `quarantined`; the
//! CI stage never runs for such bundles.
//!
//! The [`GateScheduler`] owns the only shared mutable state: the pending
//! queue and the table of running executions with their cancellation
//! tokens. At most one execution runs per gate id, and the number of
//! concurrently running executions never exceeds the configured cap.

pub mod cancel;
pub mod config;
pub mod context;
pub mod decoder;
pub mod error;
pub mod mocks;
pub mod pipeline;
pub mod scheduler;
pub mod stages;
pub mod store;
pub mod traits;

pub use cancel::CancelToken;
pub use config::{BlastRadiusLimits, CiConfig, GateConfig, PromotionThresholds, SchedulerConfig};
pub use context::{GateContext, Submission};
pub use decoder::JsonBundleDecoder;
pub use error::{codes, GateError};
pub use mocks::{MockBundleDecoder, MockCiAdapter};
pub use pipeline::GatePipeline;
pub use scheduler::{GateScheduler, QueueStatus};
pub use store::{MemoryGateStore, MemoryObjectStore};
pub use traits::{
    BundleDecoder, CiAdapter, CiError, CiTaskInput, CiTaskOutput, CiTaskStatus, GateStore,
    ObjectStore,
};
