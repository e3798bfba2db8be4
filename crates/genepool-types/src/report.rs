use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Derived risk classification for a contribution.
///
/// Variant order is the severity order, so thresholds can be compared
/// directly (`level >= RiskLevel::High`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        };
        write!(f, "{name}")
    }
}

/// Output of the security-check stage. Produced fresh per gate run and
/// projected into the gate record only through the final decision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SecurityReport {
    /// Whether every task in the validation plan is allow-listed.
    pub validation_plan_safe: bool,
    /// Command strings (or rogue task names) that matched a dangerous pattern.
    pub dangerous_commands: Vec<String>,
    /// Command strings that matched an external-network pattern.
    pub external_commands: Vec<String>,
    /// Whether the capsule's blast radius is within configured limits.
    pub blast_radius_safe: bool,
    pub risk_level: RiskLevel,
    pub notes: Vec<String>,
}

/// Overall outcome reported by the external validation runner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Pass,
    Fail,
}

/// Per-task outcome within a validation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pass,
    Fail,
    Skipped,
}

/// Output of the CI-validate stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub status: ValidationStatus,
    pub steps: Vec<ValidationStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_fingerprint: Option<Map<String, Value>>,
}

impl ValidationResult {
    pub fn passed(&self) -> bool {
        self.status == ValidationStatus::Pass
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationStep {
    pub name: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
