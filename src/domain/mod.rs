//! Domain layer - pure reconcile logic
//!
//! This module contains business logic with no external I/O.
//! Types and functions here can be unit tested without mocking.

pub mod event;
pub mod plan;
pub mod status;
pub mod task;
pub mod url;

// Re-export commonly used types
pub use event::LifecycleEvent;
pub use plan::{build_layer, EnvValue, Layer, PlanSnapshot, ServiceSpec, WorkloadSettings};
pub use status::UnitStatus;
pub use task::{PipelineReport, ReconcilePhase, Task, TaskOutcome, TaskResult};
pub use url::{internal_url, validate_external_url};
