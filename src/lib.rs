//! Snips Kubernetes operator
//!
//! Reconciles the snips workload's Pebble layer on every Juju lifecycle
//! event. See [`services::ReconcileService::handle_event`] for the entry point.

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod observability;
pub mod services;

pub use error::OperatorError;
