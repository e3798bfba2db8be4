//! Core type definitions for the Genepool hub.
//!
//! This crate provides all shared Genepool type definitions. No business
//! logic, just types. Every Genepool crate depends on this crate.
//!
//! The central object is the [`GateRecord`]: the persisted view of one
//! admission attempt for a contributed bundle, tracked through the gate
//! state machine:
//!
//! ```text
//! received → schema_ok → policy_ok → validated
//!          → promoted | candidate | rejected | quarantined | failed
//! ```

pub mod asset;
pub mod bundle;
pub mod decision;
pub mod gate;
pub mod ids;
pub mod plan;
pub mod report;

// Re-export primary types at crate root for ergonomic use.
pub use asset::{BlastRadius, Capsule, EvolutionEvent, Gene};
pub use bundle::{BundleArtifacts, BundleFormat, CanonicalHashes, ParsedBundle, VerifiedAssets};
pub use decision::{Decision, PromotionDecision, SubmitMode};
pub use gate::{GateRecord, GateStage, GateStatus};
pub use ids::{GateId, NodeId};
pub use plan::{ResourceLimits, ValidationPlan, ValidationTask};
pub use report::{
    RiskLevel, SecurityReport, StepStatus, ValidationResult, ValidationStatus, ValidationStep,
};
