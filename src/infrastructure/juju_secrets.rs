//! Juju application secrets via `secret-get` / `secret-add`

use std::collections::BTreeMap;
use std::io::Write;
use tracing::debug;

use super::hook_tools::HookTools;
use super::{SecretContent, SecretStore};
use crate::error::{HookToolError, SecretStoreError};

/// Secret store backed by the Juju controller
#[derive(Debug, Clone, Default)]
pub struct JujuSecretStore {
    tools: HookTools,
}

impl JujuSecretStore {
    pub fn new(tools: HookTools) -> Self {
        Self { tools }
    }
}

fn is_not_found(err: &HookToolError) -> bool {
    match err {
        HookToolError::Failed { stderr, .. } => stderr.contains("not found"),
        _ => false,
    }
}

fn unavailable(err: impl std::fmt::Display) -> SecretStoreError {
    SecretStoreError::Unavailable {
        message: err.to_string(),
    }
}

impl SecretStore for JujuSecretStore {
    async fn get_secret(&self, label: &str) -> Result<SecretContent, SecretStoreError> {
        let label_arg = format!("--label={}", label);
        match self
            .tools
            .run_json::<BTreeMap<String, String>>("secret-get", &[&label_arg, "--format=json"])
            .await
        {
            Ok(content) => Ok(content),
            Err(e) if is_not_found(&e) => Err(SecretStoreError::NotFound {
                label: label.to_string(),
            }),
            Err(e) => Err(unavailable(e)),
        }
    }

    async fn add_secret(
        &self,
        label: &str,
        content: SecretContent,
    ) -> Result<SecretContent, SecretStoreError> {
        // Values go through files so they never show up in the process list
        let mut files = Vec::with_capacity(content.len());
        let mut args = vec![
            "--owner=application".to_string(),
            format!("--label={}", label),
        ];

        for (key, value) in &content {
            let mut file = tempfile::NamedTempFile::new().map_err(unavailable)?;
            file.write_all(value.as_bytes()).map_err(unavailable)?;
            args.push(format!("{}#file={}", key, file.path().display()));
            files.push(file);
        }

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let uri = self
            .tools
            .run("secret-add", &args)
            .await
            .map_err(unavailable)?;
        debug!("Created secret {} ({})", label, uri);

        Ok(content)
    }
}
