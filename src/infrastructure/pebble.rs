//! Pebble supervisor client
//!
//! Talks to the workload container's Pebble daemon through the `pebble` CLI,
//! the same way the rest of the infrastructure layer shells out to tools.

use std::io::Write;
use tokio::process::Command;
use tracing::debug;

use super::Supervisor;
use crate::domain::{Layer, PlanSnapshot};
use crate::error::SupervisorError;

/// Client for one container's Pebble daemon
#[derive(Debug, Clone)]
pub struct PebbleClient {
    binary: String,
    socket: Option<String>,
}

impl Default for PebbleClient {
    fn default() -> Self {
        Self::new("pebble")
    }
}

impl PebbleClient {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            socket: None,
        }
    }

    /// Point the CLI at a specific socket (`PEBBLE_SOCKET`)
    pub fn with_socket(mut self, socket: impl Into<String>) -> Self {
        self.socket = Some(socket.into());
        self
    }

    async fn pebble(&self, args: &[&str]) -> Result<String, SupervisorError> {
        let command = format!("{} {}", self.binary, args.join(" "));
        debug!("Running: {}", command);

        let mut cmd = Command::new(&self.binary);
        cmd.args(args);
        if let Some(ref socket) = self.socket {
            cmd.env("PEBBLE_SOCKET", socket);
        }

        let output = cmd
            .output()
            .await
            .map_err(|e| SupervisorError::Unreachable {
                message: format!("failed to run {}: {}", self.binary, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SupervisorError::CommandFailed {
                command,
                message: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Daemon version from `pebble version` output.
///
/// The CLI exits 0 even when the daemon is down and reports `server -`.
fn server_version(output: &str) -> Option<&str> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            match fields.next() {
                Some("server") => fields.next(),
                _ => None,
            }
        })
        .find(|version| *version != "-")
}

impl Supervisor for PebbleClient {
    async fn can_connect(&self) -> bool {
        match self.pebble(&["version"]).await {
            Ok(stdout) => match server_version(&stdout) {
                Some(version) => {
                    debug!("Pebble daemon {} is up", version);
                    true
                }
                None => {
                    debug!("Pebble daemon not running");
                    false
                }
            },
            Err(e) => {
                debug!("Pebble not reachable: {}", e);
                false
            }
        }
    }

    async fn get_plan(&self) -> Result<PlanSnapshot, SupervisorError> {
        let stdout = self.pebble(&["plan"]).await?;
        PlanSnapshot::from_yaml(&stdout).map_err(|e| SupervisorError::InvalidPlan {
            message: e.to_string(),
        })
    }

    async fn add_layer(
        &self,
        name: &str,
        layer: &Layer,
        combine: bool,
    ) -> Result<(), SupervisorError> {
        let yaml = layer.to_yaml().map_err(|e| SupervisorError::InvalidPlan {
            message: e.to_string(),
        })?;

        let mut file = tempfile::Builder::new()
            .prefix("layer-")
            .suffix(".yaml")
            .tempfile()
            .map_err(|e| SupervisorError::CommandFailed {
                command: "create layer file".to_string(),
                message: e.to_string(),
            })?;
        file.write_all(yaml.as_bytes())
            .map_err(|e| SupervisorError::CommandFailed {
                command: "write layer file".to_string(),
                message: e.to_string(),
            })?;

        let path = file.path().to_string_lossy().to_string();
        let mut args = vec!["add", name, path.as_str()];
        if combine {
            args.push("--combine");
        }

        self.pebble(&args).await?;
        Ok(())
    }

    async fn replan(&self) -> Result<(), SupervisorError> {
        self.pebble(&["replan"])
            .await
            .map(|_| ())
            .map_err(|e| match e {
                SupervisorError::CommandFailed { message, .. } => {
                    SupervisorError::ApplyFailed { message }
                }
                other => other,
            })
    }
}
