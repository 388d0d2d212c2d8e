//! In-memory collaborators for unit tests

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use super::{IngressSource, SecretContent, SecretStore, StatusSink, Supervisor};
use crate::domain::{Layer, PlanSnapshot, UnitStatus};
use crate::error::{HookToolError, SecretStoreError, SupervisorError};

/// Pebble stand-in that merges layers into its plan on replan
#[derive(Default)]
pub struct FakeSupervisor {
    pub reachable: Cell<bool>,
    pub fail_replan: Cell<bool>,
    pub plan: RefCell<PlanSnapshot>,
    pending: RefCell<Option<Layer>>,
    pub connect_calls: Cell<usize>,
    pub get_plan_calls: Cell<usize>,
    pub add_layer_calls: Cell<usize>,
    pub replan_calls: Cell<usize>,
    pub last_layer: RefCell<Option<(String, Layer, bool)>>,
}

impl FakeSupervisor {
    pub fn reachable() -> Self {
        let fake = Self::default();
        fake.reachable.set(true);
        fake
    }

    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn with_plan(plan: PlanSnapshot) -> Self {
        let fake = Self::reachable();
        *fake.plan.borrow_mut() = plan;
        fake
    }
}

impl Supervisor for FakeSupervisor {
    async fn can_connect(&self) -> bool {
        self.connect_calls.set(self.connect_calls.get() + 1);
        self.reachable.get()
    }

    async fn get_plan(&self) -> Result<PlanSnapshot, SupervisorError> {
        self.get_plan_calls.set(self.get_plan_calls.get() + 1);
        Ok(self.plan.borrow().clone())
    }

    async fn add_layer(
        &self,
        name: &str,
        layer: &Layer,
        combine: bool,
    ) -> Result<(), SupervisorError> {
        self.add_layer_calls.set(self.add_layer_calls.get() + 1);
        *self.last_layer.borrow_mut() = Some((name.to_string(), layer.clone(), combine));
        *self.pending.borrow_mut() = Some(layer.clone());
        Ok(())
    }

    async fn replan(&self) -> Result<(), SupervisorError> {
        self.replan_calls.set(self.replan_calls.get() + 1);
        if self.fail_replan.get() {
            return Err(SupervisorError::ApplyFailed {
                message: "cannot start service: exited quickly with code 1".to_string(),
            });
        }
        if let Some(layer) = self.pending.borrow_mut().take() {
            self.plan.borrow_mut().services.extend(layer.services);
        }
        Ok(())
    }
}

/// Secret store kept in a map, with failure injection
#[derive(Default)]
pub struct MemorySecretStore {
    pub secrets: RefCell<BTreeMap<String, SecretContent>>,
    pub unavailable: Cell<bool>,
    pub get_calls: Cell<usize>,
    pub add_calls: Cell<usize>,
}

impl MemorySecretStore {
    pub fn with_secret(label: &str, key: &str, value: &str) -> Self {
        let store = Self::default();
        store.secrets.borrow_mut().insert(
            label.to_string(),
            BTreeMap::from([(key.to_string(), value.to_string())]),
        );
        store
    }
}

impl SecretStore for MemorySecretStore {
    async fn get_secret(&self, label: &str) -> Result<SecretContent, SecretStoreError> {
        self.get_calls.set(self.get_calls.get() + 1);
        if self.unavailable.get() {
            return Err(SecretStoreError::Unavailable {
                message: "controller unreachable".to_string(),
            });
        }
        self.secrets
            .borrow()
            .get(label)
            .cloned()
            .ok_or_else(|| SecretStoreError::NotFound {
                label: label.to_string(),
            })
    }

    async fn add_secret(
        &self,
        label: &str,
        content: SecretContent,
    ) -> Result<SecretContent, SecretStoreError> {
        self.add_calls.set(self.add_calls.get() + 1);
        self.secrets
            .borrow_mut()
            .insert(label.to_string(), content.clone());
        Ok(content)
    }
}

/// Records every status written
#[derive(Default)]
pub struct RecordingStatus {
    pub history: RefCell<Vec<UnitStatus>>,
}

impl RecordingStatus {
    pub fn last(&self) -> Option<UnitStatus> {
        self.history.borrow().last().cloned()
    }
}

impl StatusSink for RecordingStatus {
    async fn set_status(&self, status: &UnitStatus) -> Result<(), HookToolError> {
        self.history.borrow_mut().push(status.clone());
        Ok(())
    }
}

/// Ingress whose URL can change between invocations
#[derive(Default)]
pub struct MutableIngress {
    pub url: RefCell<Option<String>>,
}

impl MutableIngress {
    pub fn new(url: Option<&str>) -> Self {
        Self {
            url: RefCell::new(url.map(str::to_string)),
        }
    }
}

impl IngressSource for MutableIngress {
    async fn url(&self) -> Option<String> {
        self.url.borrow().clone()
    }
}
