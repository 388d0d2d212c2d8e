//! Juju hook tool runner
//!
//! `status-set`, `secret-get`, `relation-get` and friends are plain
//! executables on the hook's PATH. This wraps them with typed errors.

use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

use crate::error::HookToolError;

/// Runs hook tools, optionally from a fixed directory
#[derive(Debug, Clone, Default)]
pub struct HookTools {
    tools_dir: Option<PathBuf>,
}

impl HookTools {
    /// Use tools found on PATH
    pub fn new() -> Self {
        Self { tools_dir: None }
    }

    /// Use tools from a specific directory
    pub fn in_dir(path: impl Into<PathBuf>) -> Self {
        Self {
            tools_dir: Some(path.into()),
        }
    }

    fn program(&self, tool: &str) -> PathBuf {
        match &self.tools_dir {
            Some(dir) => dir.join(tool),
            None => PathBuf::from(tool),
        }
    }

    /// Run `tool` with `args` and return trimmed stdout
    pub async fn run(&self, tool: &str, args: &[&str]) -> Result<String, HookToolError> {
        debug!("Running hook tool: {} {}", tool, args.join(" "));

        let output = Command::new(self.program(tool))
            .args(args)
            .output()
            .await
            .map_err(|e| HookToolError::Spawn {
                tool: tool.to_string(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(HookToolError::Failed {
                tool: tool.to_string(),
                code: output.status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run `tool` and parse its `--format=json` output
    pub async fn run_json<T: serde::de::DeserializeOwned>(
        &self,
        tool: &str,
        args: &[&str],
    ) -> Result<T, HookToolError> {
        let stdout = self.run(tool, args).await?;
        serde_json::from_str(&stdout).map_err(|e| HookToolError::Output {
            tool: tool.to_string(),
            message: e.to_string(),
        })
    }
}
