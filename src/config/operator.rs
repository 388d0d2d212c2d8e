//! Operator configuration file.

use serde::{Deserialize, Serialize};

use crate::domain::WorkloadSettings;
use crate::error::ConfigError;
use crate::infrastructure::HookTools;
use crate::services::ReconcileSettings;

/// Where the HMAC key is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SecretBackendKind {
    #[default]
    Juju,
    Kubernetes,
}

impl std::str::FromStr for SecretBackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "juju" => Ok(Self::Juju),
            "kubernetes" | "k8s" => Ok(Self::Kubernetes),
            other => Err(ConfigError::InvalidValue {
                field: "secret_backend".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Where the external URL comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IngressMode {
    /// Read the ingress relation's application data
    #[default]
    Relation,
    /// Use `ingress_url` as is
    Static,
}

/// Complete operator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// Workload container name (prefix of the pebble-ready hook)
    #[serde(default = "default_snips")]
    pub container_name: String,

    /// Pebble service name
    #[serde(default = "default_snips")]
    pub service_name: String,

    /// Pebble layer label
    #[serde(default = "default_snips")]
    pub layer_name: String,

    /// Workload start command
    #[serde(default = "default_command")]
    pub command: String,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,

    /// Label of the HMAC key secret
    #[serde(default = "default_secret_label")]
    pub secret_label: String,

    /// Host for the internal URL (default: this host's FQDN)
    #[serde(default)]
    pub internal_host: Option<String>,

    /// Value of SNIPS_DEBUG
    #[serde(default = "default_true")]
    pub debug: bool,

    /// Value of SNIPS_ENABLEGUESSER; omitted from the environment when unset
    #[serde(default)]
    pub enable_guesser: Option<bool>,

    #[serde(default)]
    pub secret_backend: SecretBackendKind,

    /// Namespace for the kubernetes secret backend
    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default = "default_pebble_binary")]
    pub pebble_binary: String,

    #[serde(default)]
    pub pebble_socket: Option<String>,

    /// Directory holding the Juju hook tools (default: PATH)
    #[serde(default)]
    pub hook_tools_dir: Option<String>,

    /// Validate the external URL before updating the plan
    #[serde(default = "default_true")]
    pub ingress_enabled: bool,

    #[serde(default)]
    pub ingress: IngressMode,

    /// Relation endpoint providing ingress
    #[serde(default = "default_ingress_relation")]
    pub ingress_relation: String,

    /// URL used in static ingress mode
    #[serde(default)]
    pub ingress_url: Option<String>,
}

fn default_snips() -> String {
    "snips".to_string()
}

fn default_command() -> String {
    "/usr/bin/snips.sh".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_ssh_port() -> u16 {
    2222
}

fn default_secret_label() -> String {
    "hmac-key".to_string()
}

fn default_true() -> bool {
    true
}

fn default_namespace() -> String {
    std::env::var("JUJU_MODEL_NAME").unwrap_or_else(|_| "default".to_string())
}

fn default_pebble_binary() -> String {
    "pebble".to_string()
}

fn default_ingress_relation() -> String {
    "ingress".to_string()
}

/// Cluster DNS name of a Juju Kubernetes unit pod (`snips/0` -> `snips-0.snips-endpoints...`)
fn unit_fqdn(unit: &str, model: &str) -> Option<String> {
    let (app, number) = unit.split_once('/')?;
    if app.is_empty() || number.is_empty() || model.is_empty() {
        return None;
    }
    Some(format!(
        "{}-{}.{}-endpoints.{}.svc.cluster.local",
        app, number, app, model
    ))
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            container_name: default_snips(),
            service_name: default_snips(),
            layer_name: default_snips(),
            command: default_command(),
            http_port: default_http_port(),
            ssh_port: default_ssh_port(),
            secret_label: default_secret_label(),
            internal_host: None,
            debug: default_true(),
            enable_guesser: None,
            secret_backend: SecretBackendKind::default(),
            namespace: default_namespace(),
            pebble_binary: default_pebble_binary(),
            pebble_socket: None,
            hook_tools_dir: None,
            ingress_enabled: default_true(),
            ingress: IngressMode::default(),
            ingress_relation: default_ingress_relation(),
            ingress_url: None,
        }
    }
}

impl OperatorConfig {
    /// Validate configuration values
    ///
    /// The ingress URL is deliberately not checked here: a bad URL is a
    /// Blocked status at reconcile time, not a startup failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("container_name", &self.container_name),
            ("service_name", &self.service_name),
            ("layer_name", &self.layer_name),
            ("command", &self.command),
            ("secret_label", &self.secret_label),
            ("pebble_binary", &self.pebble_binary),
            ("ingress_relation", &self.ingress_relation),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                });
            }
        }

        if self.http_port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "http_port".to_string(),
                value: "0".to_string(),
            });
        }

        if self.secret_backend == SecretBackendKind::Kubernetes && self.namespace.trim().is_empty()
        {
            return Err(ConfigError::MissingField {
                field: "namespace".to_string(),
            });
        }

        Ok(())
    }

    /// Host for the internal URL
    ///
    /// Priority:
    /// 1. `internal_host` from the config file
    /// 2. the unit pod's cluster DNS name, when running under Juju
    /// 3. this machine's hostname
    pub fn resolve_internal_host(&self) -> String {
        if let Some(ref host) = self.internal_host {
            return host.clone();
        }

        let unit = std::env::var("JUJU_UNIT_NAME").ok();
        let model = std::env::var("JUJU_MODEL_NAME").ok();
        if let Some(fqdn) = unit
            .zip(model)
            .and_then(|(unit, model)| unit_fqdn(&unit, &model))
        {
            return fqdn;
        }

        hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "localhost".to_string())
    }

    pub fn hook_tools(&self) -> HookTools {
        match self.hook_tools_dir {
            Some(ref dir) => HookTools::in_dir(dir),
            None => HookTools::new(),
        }
    }

    pub fn workload_settings(&self) -> WorkloadSettings {
        WorkloadSettings {
            service_name: self.service_name.clone(),
            command: self.command.clone(),
            debug: self.debug,
            enable_guesser: self.enable_guesser,
        }
    }

    pub fn reconcile_settings(&self) -> ReconcileSettings {
        ReconcileSettings {
            layer_name: self.layer_name.clone(),
            secret_label: self.secret_label.clone(),
            internal_host: self.resolve_internal_host(),
            http_port: self.http_port,
            ingress_enabled: self.ingress_enabled,
            workload: self.workload_settings(),
        }
    }
}
