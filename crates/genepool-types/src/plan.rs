use serde::{Deserialize, Serialize};

/// Ordered list of validation tasks a gene declares for itself, plus the
/// resource envelope the runner may spend on them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationPlan {
    pub tasks: Vec<ValidationTask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_limits: Option<ResourceLimits>,
}

/// A single named validation task.
///
/// Task names are checked against the hub's allow-list of recognized task
/// identifiers; the optional command string is scanned by the security
/// policy engine before any runner sees it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationTask {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl ValidationTask {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: None,
            timeout_ms: None,
        }
    }
}

/// Resource limits for executing a validation plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}
