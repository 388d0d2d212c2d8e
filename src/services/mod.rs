//! Service layer - orchestration logic
//!
//! Services coordinate domain logic with infrastructure.
//! They contain the "how" of operations.

pub mod plan_service;
pub mod reconcile_service;
pub mod secret_service;

// Re-export commonly used types
pub use plan_service::{PlanChange, PlanReconciler};
pub use reconcile_service::{ReconcileInputs, ReconcileService, ReconcileSettings};
pub use secret_service::{generate_hmac_key, SecretProvisioner};
