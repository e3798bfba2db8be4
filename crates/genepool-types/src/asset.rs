use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::plan::ValidationPlan;

/// Abstract, reusable description of a fix pattern.
///
/// A gene is immutable once created: its `gene_id` is the SHA-256 content
/// hash of its canonical JSON form (with the id field itself excluded from
/// the preimage), so any mutation invalidates the id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    /// `sha256:<hex>` content id.
    pub gene_id: String,
    /// One-line human description of the fix pattern.
    pub summary: String,
    /// Failure signals this gene applies to (compiler errors, log lines).
    pub signals: Vec<String>,
    /// Applicability tags (platform, toolchain, subsystem).
    pub tags: Vec<String>,
    #[serde(default)]
    pub preconditions: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    /// How the gene proposes to validate itself.
    pub validation_plan: ValidationPlan,
    /// Contributor-declared confidence in [0, 1].
    pub confidence: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// A concrete patch bound to one gene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Capsule {
    /// `sha256:<hex>` content id.
    pub capsule_id: String,
    /// Owning gene.
    pub gene_id: String,
    pub confidence: f64,
    pub blast_radius: BlastRadius,
    /// Object-store key of the patch bytes.
    pub patch_object_key: String,
    /// Object-store key of the validation plan document.
    pub validation_plan_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_fingerprint: Option<Map<String, Value>>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Measured size of a proposed change, used as a coarse risk signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlastRadius {
    pub files: u32,
    pub lines: u32,
}

/// Record of one mutation attempt a node observed locally, carried in
/// bundles for provenance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvolutionEvent {
    pub event_id: String,
    pub gene_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capsule_id: Option<String>,
    pub timestamp_ms: i64,
    pub mutation_type: String,
    pub success: bool,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}
