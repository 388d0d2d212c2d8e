//! Reconcile task types
//!
//! Defines the reconcile pipeline as an ordered list of tasks and the
//! per-invocation state machine they drive.

use std::time::Duration;

use super::status::UnitStatus;

/// Individual steps of a reconcile pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Pebble must answer before anything talks to it
    ConnectivityCheck,
    /// Reject a malformed external URL
    ExternalUrlValidation,
    /// Push the desired layer when it diverges from the running plan
    PlanUpdate,
}

impl Task {
    /// Human-readable name for the task
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConnectivityCheck => "Connectivity Check",
            Self::ExternalUrlValidation => "External URL Validation",
            Self::PlanUpdate => "Plan Update",
        }
    }

    /// Tasks in the order they must run
    pub fn pipeline(with_ingress: bool) -> Vec<Task> {
        let mut tasks = vec![Task::ConnectivityCheck];
        if with_ingress {
            tasks.push(Task::ExternalUrlValidation);
        }
        tasks.push(Task::PlanUpdate);
        tasks
    }
}

/// Where a reconcile invocation ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePhase {
    Succeeded,
    /// Halted at a task; that task's status stands
    Halted(Task),
}

/// What a single task reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Passed,
    /// The task failed and left this status behind
    Failed(UnitStatus),
}

/// Result of one task execution
#[derive(Debug)]
pub struct TaskResult {
    pub task: Task,
    pub success: bool,
    pub duration: Duration,
    pub message: Option<String>,
}

impl TaskResult {
    pub fn success(task: Task, duration: Duration) -> Self {
        Self {
            task,
            success: true,
            duration,
            message: None,
        }
    }

    pub fn failure(task: Task, duration: Duration, message: impl Into<String>) -> Self {
        Self {
            task,
            success: false,
            duration,
            message: Some(message.into()),
        }
    }
}

/// Summary of a full pipeline run
#[derive(Debug)]
pub struct PipelineReport {
    pub phase: ReconcilePhase,
    pub results: Vec<TaskResult>,
    pub status: UnitStatus,
}

impl PipelineReport {
    pub fn succeeded(&self) -> bool {
        self.phase == ReconcilePhase::Succeeded
    }

    pub fn failed_task(&self) -> Option<Task> {
        match self.phase {
            ReconcilePhase::Halted(task) => Some(task),
            _ => None,
        }
    }
}
