//! Stage 3: security policy engine.
//!
//! A pure function of the parsed bundle and the blast-radius limits: no
//! I/O, no state. Produces a fresh [`SecurityReport`] per run.
//!
//! External network access is weighted highest in the risk score: it is
//! the primary channel for supply-chain compromise from an untrusted
//! contribution.

use genepool_types::{GateId, ParsedBundle, RiskLevel, SecurityReport};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::config::BlastRadiusLimits;
use crate::error::GateError;

/// Task names the hub recognizes as safe to schedule.
const ALLOWED_VALIDATION_TASKS: &[&str] = &[
    "build_win64",
    "build_linux",
    "build_macos",
    "run_unit_tests",
    "run_integration_tests",
    "lint_ts",
    "lint_cpp",
    "format_check",
    "static_analysis",
];

lazy_static! {
    /// Shell chaining into interpreters, or redirection into device/root
    /// paths. Each matching pattern counts separately toward the risk
    /// score: a command that both chains and pipes is worse than one that
    /// only chains.
    static ref DANGEROUS_COMMAND_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i);\s*curl").unwrap(),
        Regex::new(r"(?i);\s*wget").unwrap(),
        Regex::new(r"(?i);\s*powershell").unwrap(),
        Regex::new(r"(?i);\s*pwsh").unwrap(),
        Regex::new(r"(?i);\s*bash").unwrap(),
        Regex::new(r"(?i);\s*sh\b").unwrap(),
        Regex::new(r"(?i);\s*cmd").unwrap(),
        Regex::new(r"(?i);\s*eval").unwrap(),
        Regex::new(r"(?i);\s*exec").unwrap(),
        Regex::new(r"(?i)\|\s*curl").unwrap(),
        Regex::new(r"(?i)\|\s*wget").unwrap(),
        Regex::new(r"(?i)\|\s*powershell").unwrap(),
        Regex::new(r"(?i)\|\s*pwsh").unwrap(),
        Regex::new(r"(?i)\|\s*bash").unwrap(),
        Regex::new(r"(?i)\|\s*sh\b").unwrap(),
        Regex::new(r"(?i)\|\s*cmd").unwrap(),
        Regex::new(r"(?i)\|\s*eval").unwrap(),
        Regex::new(r"(?i)\|\s*exec").unwrap(),
        Regex::new(r">\s*/").unwrap(),
        Regex::new(r">\s*\\").unwrap(),
    ];

    /// Network-fetch tools, remote-invocation cmdlets, and URL schemes.
    static ref EXTERNAL_CONNECTION_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)curl\s+").unwrap(),
        Regex::new(r"(?i)wget\s+").unwrap(),
        Regex::new(r"(?i)powershell\s+.*invoke-webrequest").unwrap(),
        Regex::new(r"(?i)pwsh\s+.*invoke-webrequest").unwrap(),
        Regex::new(r"(?i)https?://").unwrap(),
        Regex::new(r"(?i)ftp://").unwrap(),
    ];
}

pub fn run(
    gate_id: &GateId,
    bundle: &ParsedBundle,
    limits: &BlastRadiusLimits,
    cancel: &CancelToken,
) -> Result<SecurityReport, GateError> {
    if cancel.is_cancelled() {
        return Err(GateError::Cancelled);
    }
    let report = evaluate(bundle, limits);
    debug!(gate_id = %gate_id, risk = %report.risk_level, "Security check complete");
    Ok(report)
}

/// Evaluate the security policy against a parsed bundle.
pub fn evaluate(bundle: &ParsedBundle, limits: &BlastRadiusLimits) -> SecurityReport {
    let mut report = SecurityReport {
        validation_plan_safe: true,
        dangerous_commands: Vec::new(),
        external_commands: Vec::new(),
        blast_radius_safe: true,
        risk_level: RiskLevel::Low,
        notes: Vec::new(),
    };

    // Allow-list check: a rogue task name is both a policy violation and a
    // dangerous command.
    for task in &bundle.gene.validation_plan.tasks {
        if !ALLOWED_VALIDATION_TASKS.contains(&task.name.as_str()) {
            report.validation_plan_safe = false;
            report.dangerous_commands.push(task.name.clone());
            report
                .notes
                .push(format!("validation task \"{}\" not in allow-list", task.name));
        }
    }

    // Command scans. One entry per matching pattern, so a command that
    // trips several rules weighs more.
    for task in &bundle.gene.validation_plan.tasks {
        let Some(command) = &task.command else {
            continue;
        };
        for pattern in DANGEROUS_COMMAND_PATTERNS.iter() {
            if pattern.is_match(command) {
                report.dangerous_commands.push(command.clone());
            }
        }
        for pattern in EXTERNAL_CONNECTION_PATTERNS.iter() {
            if pattern.is_match(command) {
                report.external_commands.push(command.clone());
            }
        }
    }

    // Blast-radius ceilings.
    if let Some(capsule) = &bundle.capsule {
        let radius = &capsule.blast_radius;
        if radius.files > limits.max_files {
            report.blast_radius_safe = false;
            report.notes.push(format!(
                "blast radius files ({}) exceeds limit ({})",
                radius.files, limits.max_files
            ));
        }
        if radius.lines > limits.max_lines {
            report.blast_radius_safe = false;
            report.notes.push(format!(
                "blast radius lines ({}) exceeds limit ({})",
                radius.lines, limits.max_lines
            ));
        }
    }

    report.risk_level = risk_level(&report);
    report
}

/// Accumulate the weighted risk score and map it onto a level.
fn risk_level(report: &SecurityReport) -> RiskLevel {
    let mut score = 0u32;

    if !report.validation_plan_safe {
        score += 3;
    }
    score += (report.dangerous_commands.len() as u32 * 2).min(4);
    score += (report.external_commands.len() as u32 * 3).min(6);
    if !report.blast_radius_safe {
        score += 2;
    }

    match score {
        s if s >= 8 => RiskLevel::Critical,
        s if s >= 5 => RiskLevel::High,
        s if s >= 2 => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}
