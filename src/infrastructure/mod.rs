//! Infrastructure layer - external I/O adapters
//!
//! This module contains all code that interacts with external systems:
//! - Pebble (workload supervisor) via the `pebble` CLI
//! - Juju hook tools (status, secrets, relations, config)
//! - Kubernetes API (Secret-backed secret store)
//!
//! Each collaborator sits behind a trait so services can run against
//! in-memory fakes in tests.

// Implementations are driven from a single-threaded dispatcher, so the
// futures never need to be Send.
#![allow(async_fn_in_trait)]

pub mod hook_tools;
pub mod ingress;
pub mod juju_secrets;
pub mod kube_secrets;
pub mod pebble;
pub mod status;

#[cfg(test)]
pub mod testing;

use std::collections::BTreeMap;

use crate::domain::{Layer, PlanSnapshot, UnitStatus};
use crate::error::{HookToolError, SecretStoreError, SupervisorError};

// Re-export commonly used types
pub use hook_tools::HookTools;
pub use ingress::{RelationIngress, StaticIngress};
pub use juju_secrets::JujuSecretStore;
pub use kube_secrets::KubeSecretStore;
pub use pebble::PebbleClient;
pub use status::JujuStatus;

/// Key/value content of one secret
pub type SecretContent = BTreeMap<String, String>;

/// Process supervisor running inside the workload container
pub trait Supervisor {
    async fn can_connect(&self) -> bool;

    async fn get_plan(&self) -> Result<PlanSnapshot, SupervisorError>;

    async fn add_layer(&self, name: &str, layer: &Layer, combine: bool)
        -> Result<(), SupervisorError>;

    /// Apply the combined plan; fails with [`SupervisorError::ApplyFailed`]
    async fn replan(&self) -> Result<(), SupervisorError>;
}

/// Application-scoped secret storage
pub trait SecretStore {
    /// Fails with [`SecretStoreError::NotFound`] when no secret has `label`
    async fn get_secret(&self, label: &str) -> Result<SecretContent, SecretStoreError>;

    async fn add_secret(
        &self,
        label: &str,
        content: SecretContent,
    ) -> Result<SecretContent, SecretStoreError>;
}

/// Source of the externally reachable URL
pub trait IngressSource {
    async fn url(&self) -> Option<String>;
}

pub trait StatusSink {
    async fn set_status(&self, status: &UnitStatus) -> Result<(), HookToolError>;
}

/// Secret store selected by configuration
pub enum SecretBackend {
    Juju(JujuSecretStore),
    Kubernetes(KubeSecretStore),
}

impl SecretStore for SecretBackend {
    async fn get_secret(&self, label: &str) -> Result<SecretContent, SecretStoreError> {
        match self {
            Self::Juju(store) => store.get_secret(label).await,
            Self::Kubernetes(store) => store.get_secret(label).await,
        }
    }

    async fn add_secret(
        &self,
        label: &str,
        content: SecretContent,
    ) -> Result<SecretContent, SecretStoreError> {
        match self {
            Self::Juju(store) => store.add_secret(label, content).await,
            Self::Kubernetes(store) => store.add_secret(label, content).await,
        }
    }
}

/// Ingress source selected by configuration
pub enum IngressBackend {
    Relation(RelationIngress),
    Static(StaticIngress),
}

impl IngressSource for IngressBackend {
    async fn url(&self) -> Option<String> {
        match self {
            Self::Relation(source) => source.url().await,
            Self::Static(source) => source.url().await,
        }
    }
}
