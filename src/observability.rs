//! # Reconcile Observability
//!
//! One structured JSON line per reconcile invocation, prefixed with
//! `SNIPS_EVENT:` so log shippers can pick it out of `juju debug-log`.
//!
//! Emission is best-effort: a serialization failure is logged and otherwise
//! ignored, it never changes the unit status.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::domain::{LifecycleEvent, PipelineReport, ReconcilePhase};

/// Event prefix for log shippers to identify structured events
const EVENT_PREFIX: &str = "SNIPS_EVENT:";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileOutcome {
    Active,
    Halted,
}

/// Per-task entry in a reconcile event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDuration {
    pub task: String,
    pub duration_secs: f64,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileEvent {
    /// Timestamp in RFC3339 format
    pub timestamp: String,
    /// Lifecycle event that triggered the invocation
    pub event: String,
    /// Juju unit, when running under a dispatcher
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub outcome: ReconcileOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_task: Option<String>,
    /// Final status as shown to the operator
    pub status: String,
    pub duration_secs: f64,
    pub tasks: Vec<TaskDuration>,
}

impl ReconcileEvent {
    pub fn from_report(event: &LifecycleEvent, report: &PipelineReport, started: Instant) -> Self {
        let (outcome, failed_task) = match report.phase {
            ReconcilePhase::Halted(task) => (ReconcileOutcome::Halted, Some(task.name().to_string())),
            _ => (ReconcileOutcome::Active, None),
        };

        Self {
            timestamp: Utc::now().to_rfc3339(),
            event: event.name().to_string(),
            unit: std::env::var("JUJU_UNIT_NAME").ok(),
            outcome,
            failed_task,
            status: report.status.to_string(),
            duration_secs: started.elapsed().as_secs_f64(),
            tasks: report
                .results
                .iter()
                .map(|r| TaskDuration {
                    task: r.task.name().to_string(),
                    duration_secs: r.duration.as_secs_f64(),
                    success: r.success,
                })
                .collect(),
        }
    }
}

/// Print a structured event line
pub fn emit_event(event: &ReconcileEvent) {
    match serde_json::to_string(event) {
        Ok(json) => {
            println!("{}{}", EVENT_PREFIX, json);
        }
        Err(e) => {
            tracing::warn!("Failed to serialize reconcile event: {}", e);
        }
    }
}
