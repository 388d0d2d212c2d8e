//! # Operator Configuration
//!
//! Layered configuration loading: Defaults → File → Environment → Charm options
//!
//! 1. **Defaults** - every field of [`OperatorConfig`] has one
//! 2. **File** (`--config` / `SNIPS_OPERATOR_CONFIG`) - YAML, all keys optional
//! 3. **Environment** - `SNIPS_INGRESS_URL`, `SNIPS_SECRET_BACKEND`
//! 4. **Charm options** - `debug` and `enable-guesser` from `config-get`, only
//!    when running inside a Juju hook (`JUJU_UNIT_NAME` set)
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! let config = config::load(Some(Path::new("operator.yaml"))).await?;
//! println!("Service: {}", config.service_name);
//! ```

mod charm;
mod operator;

pub use charm::CharmOptions;
pub use operator::{IngressMode, OperatorConfig, SecretBackendKind};

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::ConfigError;

/// Read a YAML config file
pub fn load_file(path: &Path) -> Result<OperatorConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.display().to_string(),
    })?;

    serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
        message: format!("{}: {}", path.display(), e),
    })
}

/// Apply `SNIPS_*` environment overrides
pub fn apply_env_overrides(config: &mut OperatorConfig) -> Result<(), ConfigError> {
    apply_overrides(config, |name| std::env::var(name).ok())
}

/// Apply overrides read through `lookup`; empty values are ignored
fn apply_overrides(
    config: &mut OperatorConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let var = |name: &str| lookup(name).filter(|value| !value.is_empty());

    if let Some(url) = var("SNIPS_INGRESS_URL") {
        debug!("Using static ingress URL from SNIPS_INGRESS_URL");
        config.ingress = IngressMode::Static;
        config.ingress_url = Some(url);
    }

    if let Some(backend) = var("SNIPS_SECRET_BACKEND") {
        config.secret_backend = backend.parse()?;
    }

    Ok(())
}

/// Load the full configuration for this invocation
pub async fn load(path: Option<&Path>) -> Result<OperatorConfig> {
    let mut config = match path {
        Some(path) => {
            info!("Loading operator configuration from: {}", path.display());
            load_file(path).with_context(|| {
                format!(
                    "Failed to load operator configuration: {}. Ensure the file exists and is valid YAML.",
                    path.display()
                )
            })?
        }
        None => OperatorConfig::default(),
    };

    apply_env_overrides(&mut config).context("Invalid environment override")?;

    if std::env::var("JUJU_UNIT_NAME").is_ok() {
        match CharmOptions::fetch(&config.hook_tools()).await {
            Ok(options) => options.apply(&mut config),
            Err(e) => warn!("Could not read charm config, using defaults: {}", e),
        }
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}
