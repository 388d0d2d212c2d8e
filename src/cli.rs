//! CLI definitions for snips-operator
//!
//! This module contains all CLI argument parsing structures using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "snips-operator",
    version,
    about = "Kubernetes operator for the snips workload",
    long_about = "Reconciles the snips Pebble layer on every Juju lifecycle event.\nProvisions the HMAC key, validates the external URL and sets the unit status."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Operator configuration file (YAML)
    #[arg(long, global = true, env = "SNIPS_OPERATOR_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Handle a lifecycle event and reconcile the workload
    Dispatch {
        /// Hook name (e.g. snips-pebble-ready, ingress-relation-changed)
        #[arg(env = "JUJU_DISPATCH_PATH")]
        event: Option<String>,
    },

    /// Print the desired Pebble layer without applying it
    Plan,

    /// Check whether a URL is usable as the external URL
    ValidateUrl {
        /// URL to check
        url: String,
    },
}
