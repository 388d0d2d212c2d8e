//! Lifecycle events delivered by the Juju dispatcher

use std::fmt;

/// Event that triggered this invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// `<container>-pebble-ready`
    WorkloadReady,
    ConfigChanged,
    IngressReady,
    IngressRevoked,
    UpdateStatus,
    Install,
    Upgrade,
    Other(String),
}

impl LifecycleEvent {
    /// Parse a hook name such as `snips-pebble-ready` or `ingress-relation-broken`
    pub fn from_hook_name(hook: &str, container_name: &str, ingress_endpoint: &str) -> Self {
        let hook = hook.trim();

        if hook == format!("{}-pebble-ready", container_name) {
            return Self::WorkloadReady;
        }

        if let Some(suffix) = hook
            .strip_prefix(ingress_endpoint)
            .and_then(|rest| rest.strip_prefix("-relation-"))
        {
            return match suffix {
                "broken" | "departed" => Self::IngressRevoked,
                _ => Self::IngressReady,
            };
        }

        match hook {
            "config-changed" => Self::ConfigChanged,
            "update-status" => Self::UpdateStatus,
            "install" => Self::Install,
            "upgrade-charm" => Self::Upgrade,
            other => Self::Other(other.to_string()),
        }
    }

    /// Parse `JUJU_DISPATCH_PATH` (e.g. `hooks/config-changed`)
    pub fn from_dispatch_path(path: &str, container_name: &str, ingress_endpoint: &str) -> Self {
        let hook = path.rsplit('/').next().unwrap_or(path);
        Self::from_hook_name(hook, container_name, ingress_endpoint)
    }

    pub fn name(&self) -> &str {
        match self {
            Self::WorkloadReady => "workload-ready",
            Self::ConfigChanged => "config-changed",
            Self::IngressReady => "ingress-ready",
            Self::IngressRevoked => "ingress-revoked",
            Self::UpdateStatus => "update-status",
            Self::Install => "install",
            Self::Upgrade => "upgrade-charm",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
