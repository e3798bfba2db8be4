use std::time::Duration;

/// Configuration for the gate pipeline and promotion scoring.
#[derive(Clone, Debug)]
pub struct GateConfig {
    /// Upper bound on concurrently running pipeline executions.
    pub max_concurrent_gates: usize,
    /// Wall-clock budget for one full pipeline run.
    pub gate_timeout: Duration,
    pub auto_promote: PromotionThresholds,
    pub blast_radius: BlastRadiusLimits,
    pub ci: CiConfig,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_concurrent_gates: 5,
            gate_timeout: Duration::from_secs(30 * 60),
            auto_promote: PromotionThresholds::default(),
            blast_radius: BlastRadiusLimits::default(),
            ci: CiConfig::default(),
        }
    }
}

/// Thresholds gating automatic promotion.
///
/// Only `confidence_min` feeds the current score; the streak and coverage
/// thresholds are reserved for the usage-history and freshness terms,
/// which are not computed yet.
#[derive(Clone, Debug)]
pub struct PromotionThresholds {
    /// Minimum score for auto-promotion (default: 0.85).
    pub confidence_min: f64,
    /// Reserved: consecutive successful reuses required.
    pub success_streak_min: u32,
    /// Reserved: distinct environments a capsule must have passed in.
    pub env_coverage_min: u32,
}

impl Default for PromotionThresholds {
    fn default() -> Self {
        Self {
            confidence_min: 0.85,
            success_streak_min: 3,
            env_coverage_min: 2,
        }
    }
}

/// Blast-radius ceilings a capsule may declare before it is flagged.
#[derive(Clone, Copy, Debug)]
pub struct BlastRadiusLimits {
    pub max_files: u32,
    pub max_lines: u32,
}

impl Default for BlastRadiusLimits {
    fn default() -> Self {
        Self {
            max_files: 100,
            max_lines: 10_000,
        }
    }
}

/// Polling discipline for the external CI runner.
#[derive(Clone, Copy, Debug)]
pub struct CiConfig {
    pub poll_interval: Duration,
    /// Poll budget; exhausting it fails the run with a CI-timeout error.
    pub max_polls: u32,
}

impl Default for CiConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_polls: 150,
        }
    }
}

/// Configuration for the admission scheduler.
#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
    pub max_concurrent_gates: usize,
    /// Interval of the periodic admission tick. Enqueue and completion
    /// also trigger immediate admission attempts.
    pub tick_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_gates: 5,
            tick_interval: Duration::from_secs(1),
        }
    }
}
