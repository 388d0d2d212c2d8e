//! Pebble process plan types and the desired-state builder
//!
//! A [`Layer`] is what the operator wants the supervisor to run; a
//! [`PlanSnapshot`] is what the supervisor reports it is running. Both share
//! [`ServiceSpec`] so they can be compared structurally.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const ENV_DEBUG: &str = "SNIPS_DEBUG";
pub const ENV_HMAC_KEY: &str = "SNIPS_HMACKEY";
pub const ENV_HTTP_EXTERNAL: &str = "SNIPS_HTTP_EXTERNAL";
pub const ENV_ENABLE_GUESSER: &str = "SNIPS_ENABLEGUESSER";

/// Environment variable value as written in a layer
///
/// Pebble keeps environment values as strings, so a layer's `true` comes back
/// as `"true"` in the plan. Equality compares the rendered form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl EnvValue {
    pub fn render(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Str(s) => s.clone(),
        }
    }
}

impl PartialEq for EnvValue {
    fn eq(&self, other: &Self) -> bool {
        self.render() == other.render()
    }
}

impl Eq for EnvValue {}

impl fmt::Display for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<bool> for EnvValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for EnvValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

/// How a layer's service definition combines with earlier layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Override {
    Replace,
    Merge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Startup {
    Enabled,
    Disabled,
}

/// One service entry in a layer or plan
///
/// Fields Pebble adds that the operator never sets (checks, backoff, ...) are
/// ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    #[serde(rename = "override", default, skip_serializing_if = "Option::is_none")]
    pub override_policy: Option<Override>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub summary: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub command: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup: Option<Startup>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, EnvValue>,
}

/// Named overlay submitted to the supervisor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub summary: String,
    pub description: String,
    pub services: BTreeMap<String, ServiceSpec>,
}

impl Layer {
    /// Serialize to the YAML accepted by `pebble add`
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Active plan as reported by the supervisor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSnapshot {
    #[serde(default)]
    pub services: BTreeMap<String, ServiceSpec>,
}

impl PlanSnapshot {
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    pub fn to_yaml(&self) -> String {
        serde_yaml::to_string(self).unwrap_or_else(|e| format!("<unserializable plan: {}>", e))
    }

    /// True when the layer's services are missing from or differ from this plan
    pub fn diverges_from(&self, layer: &Layer, service_name: &str) -> bool {
        !self.services.contains_key(service_name) || layer.services != self.services
    }
}

/// Fixed parts of the Snips service definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadSettings {
    pub service_name: String,
    pub command: String,
    pub debug: bool,
    /// Emitted as `SNIPS_ENABLEGUESSER` only when set
    pub enable_guesser: Option<bool>,
}

impl Default for WorkloadSettings {
    fn default() -> Self {
        Self {
            service_name: "snips".to_string(),
            command: "/usr/bin/snips.sh".to_string(),
            debug: true,
            enable_guesser: None,
        }
    }
}

/// Build the desired Snips layer.
///
/// Deterministic in its inputs. The external URL key is omitted entirely when
/// there is no ingress URL.
pub fn build_layer(settings: &WorkloadSettings, hmac_key: &str, external_url: Option<&str>) -> Layer {
    let mut environment = BTreeMap::new();
    environment.insert(ENV_DEBUG.to_string(), EnvValue::Bool(settings.debug));
    environment.insert(ENV_HMAC_KEY.to_string(), EnvValue::from(hmac_key));

    if let Some(url) = external_url {
        environment.insert(ENV_HTTP_EXTERNAL.to_string(), EnvValue::from(url));
    }

    if let Some(enabled) = settings.enable_guesser {
        environment.insert(ENV_ENABLE_GUESSER.to_string(), EnvValue::Bool(enabled));
    }

    let service = ServiceSpec {
        override_policy: Some(Override::Replace),
        summary: settings.service_name.clone(),
        command: settings.command.clone(),
        startup: Some(Startup::Enabled),
        environment,
    };

    let mut services = BTreeMap::new();
    services.insert(settings.service_name.clone(), service);

    Layer {
        summary: format!("{} layer", settings.service_name),
        description: format!("pebble config layer for {}", settings.service_name),
        services,
    }
}
