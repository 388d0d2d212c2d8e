//! Centralized error types for the operator
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.

use thiserror::Error;

/// Top-level error type for a reconcile invocation
#[derive(Error, Debug)]
pub enum OperatorError {
    #[error("Supervisor error: {0}")]
    Supervisor(#[from] SupervisorError),

    #[error("Secret store error: {0}")]
    SecretStore(#[from] SecretStoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Hook tool error: {0}")]
    HookTool(#[from] HookToolError),
}

/// Pebble (workload supervisor) errors
#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Cannot connect to the workload supervisor: {message}")]
    Unreachable { message: String },

    #[error("Supervisor command failed: {command}: {message}")]
    CommandFailed { command: String, message: String },

    #[error("Failed to apply plan: {message}")]
    ApplyFailed { message: String },

    #[error("Invalid plan returned by supervisor: {message}")]
    InvalidPlan { message: String },
}

/// Secret store errors
#[derive(Error, Debug)]
pub enum SecretStoreError {
    #[error("Secret with label '{label}' not found")]
    NotFound { label: String },

    #[error("Secret store unavailable: {message}")]
    Unavailable { message: String },

    #[error("Secret '{label}' has no '{key}' field")]
    MissingKey { label: String, key: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Required configuration missing: {field}")]
    MissingField { field: String },

    #[error("Invalid configuration value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },
}

/// Juju hook tool errors
#[derive(Error, Debug)]
pub enum HookToolError {
    #[error("Failed to spawn {tool}: {message}")]
    Spawn { tool: String, message: String },

    #[error("{tool} exited with {code}: {stderr}")]
    Failed {
        tool: String,
        code: i32,
        stderr: String,
    },

    #[error("Unexpected output from {tool}: {message}")]
    Output { tool: String, message: String },
}
