//! Reconcile service - the common exit hook run for every lifecycle event
//!
//! Each invocation recomputes the desired state from scratch, runs the task
//! pipeline in order and stops at the first failing task. Nothing is kept in
//! memory between invocations; retries come from the next event.

use std::time::Instant;
use tracing::{error, info, warn};

use crate::domain::{
    build_layer, internal_url, validate_external_url, Layer, LifecycleEvent, PipelineReport,
    ReconcilePhase, Task, TaskOutcome, TaskResult, UnitStatus, WorkloadSettings,
};
use crate::error::OperatorError;
use crate::infrastructure::{IngressSource, SecretStore, StatusSink, Supervisor};
use crate::observability::{emit_event, ReconcileEvent};
use crate::services::plan_service::{PlanChange, PlanReconciler};
use crate::services::secret_service::SecretProvisioner;

pub const WAITING_FOR_POD: &str = "Waiting for pod startup to complete";

/// Static inputs of the reconcile loop
#[derive(Debug, Clone)]
pub struct ReconcileSettings {
    pub layer_name: String,
    pub secret_label: String,
    /// Host used for the internal URL when there is no ingress
    pub internal_host: String,
    pub http_port: u16,
    /// Run the external URL check
    pub ingress_enabled: bool,
    pub workload: WorkloadSettings,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            layer_name: "snips".to_string(),
            secret_label: "hmac-key".to_string(),
            internal_host: "localhost".to_string(),
            http_port: 8080,
            ingress_enabled: true,
            workload: WorkloadSettings::default(),
        }
    }
}

/// Inputs gathered at the start of one invocation
#[derive(Debug, Clone)]
pub struct ReconcileInputs {
    /// URL published by the ingress provider, if any
    pub ingress_url: Option<String>,
    /// Ingress URL, or the internal URL when there is none
    pub external_url: Option<String>,
    pub desired: Layer,
}

/// Drives the task pipeline against the external collaborators
pub struct ReconcileService<P, K, I, T> {
    supervisor: P,
    secrets: K,
    ingress: I,
    status: T,
    settings: ReconcileSettings,
}

impl<P, K, I, T> ReconcileService<P, K, I, T>
where
    P: Supervisor,
    K: SecretStore,
    I: IngressSource,
    T: StatusSink,
{
    pub fn new(supervisor: P, secrets: K, ingress: I, status: T, settings: ReconcileSettings) -> Self {
        Self {
            supervisor,
            secrets,
            ingress,
            status,
            settings,
        }
    }

    pub fn supervisor(&self) -> &P {
        &self.supervisor
    }

    pub fn secrets(&self) -> &K {
        &self.secrets
    }

    pub fn ingress(&self) -> &I {
        &self.ingress
    }

    pub fn status(&self) -> &T {
        &self.status
    }

    /// Entry point for every lifecycle event.
    ///
    /// Only a secret store or status sink failure is returned as `Err`; every
    /// other problem ends up in the unit status.
    pub async fn handle_event(&self, event: &LifecycleEvent) -> Result<PipelineReport, OperatorError> {
        let started = Instant::now();
        info!("Handling {}", event);

        let inputs = self.gather_inputs().await?;
        log_ingress_transition(event, inputs.ingress_url.as_deref());

        let tasks = Task::pipeline(self.settings.ingress_enabled);
        let report = self.run_pipeline(&tasks, &inputs).await?;

        emit_event(&ReconcileEvent::from_report(event, &report, started));
        Ok(report)
    }

    /// Collect the secret and URLs and build the desired layer
    pub async fn gather_inputs(&self) -> Result<ReconcileInputs, OperatorError> {
        let hmac_key = SecretProvisioner::new(&self.secrets)
            .get_or_create(&self.settings.secret_label)
            .await?;

        let ingress_url = self.ingress.url().await;
        let external_url = ingress_url
            .clone()
            .or_else(|| Some(internal_url(&self.settings.internal_host, self.settings.http_port)));

        let desired = build_layer(&self.settings.workload, &hmac_key, ingress_url.as_deref());

        Ok(ReconcileInputs {
            ingress_url,
            external_url,
            desired,
        })
    }

    /// Run `tasks` in order, halting at the first failure.
    ///
    /// The failing task's status is written as is; when every task passes the
    /// unit goes active.
    pub async fn run_pipeline(
        &self,
        tasks: &[Task],
        inputs: &ReconcileInputs,
    ) -> Result<PipelineReport, OperatorError> {
        let mut results = Vec::with_capacity(tasks.len());

        for task in tasks {
            info!("Starting: {}", task.name());

            let start = Instant::now();
            let outcome = self.execute_task(*task, inputs).await;
            let duration = start.elapsed();

            match outcome {
                TaskOutcome::Passed => {
                    results.push(TaskResult::success(*task, duration));
                }
                TaskOutcome::Failed(status) => {
                    info!("{} failed: {}", task.name(), status);
                    results.push(TaskResult::failure(*task, duration, status.message()));
                    self.status.set_status(&status).await?;

                    return Ok(PipelineReport {
                        phase: ReconcilePhase::Halted(*task),
                        results,
                        status,
                    });
                }
            }
        }

        let status = UnitStatus::Active;
        self.status.set_status(&status).await?;

        Ok(PipelineReport {
            phase: ReconcilePhase::Succeeded,
            results,
            status,
        })
    }

    async fn execute_task(&self, task: Task, inputs: &ReconcileInputs) -> TaskOutcome {
        match task {
            Task::ConnectivityCheck => self.check_connectivity().await,
            Task::ExternalUrlValidation => check_external_url(inputs.external_url.as_deref()),
            Task::PlanUpdate => self.update_plan(&inputs.desired).await,
        }
    }

    async fn check_connectivity(&self) -> TaskOutcome {
        if self.supervisor.can_connect().await {
            TaskOutcome::Passed
        } else {
            TaskOutcome::Failed(UnitStatus::Maintenance(WAITING_FOR_POD.to_string()))
        }
    }

    async fn update_plan(&self, desired: &Layer) -> TaskOutcome {
        let reconciler = PlanReconciler::new(
            &self.supervisor,
            &self.settings.layer_name,
            &self.settings.workload.service_name,
        );

        match reconciler.reconcile(desired).await {
            Ok(PlanChange::Applied) | Ok(PlanChange::Unchanged) => TaskOutcome::Passed,
            Ok(PlanChange::Failed(_)) => TaskOutcome::Failed(UnitStatus::Blocked(format!(
                "Failed to start '{}', see juju debug-log",
                self.settings.workload.service_name
            ))),
            Err(e) => {
                warn!("Lost contact with pebble while updating the plan: {}", e);
                TaskOutcome::Failed(UnitStatus::Maintenance(WAITING_FOR_POD.to_string()))
            }
        }
    }
}

fn check_external_url(external_url: Option<&str>) -> TaskOutcome {
    match external_url {
        Some(url) if !validate_external_url(url) => {
            error!("Invalid external url: '{}'", url);
            TaskOutcome::Failed(UnitStatus::Blocked(format!("Invalid external url: '{}'", url)))
        }
        _ => TaskOutcome::Passed,
    }
}

fn log_ingress_transition(event: &LifecycleEvent, ingress_url: Option<&str>) {
    match event {
        LifecycleEvent::IngressReady => match ingress_url {
            Some(url) => info!("Ingress ready at {}", url),
            None => info!("Ingress relation changed but no URL published yet"),
        },
        LifecycleEvent::IngressRevoked => info!("Ingress revoked; falling back to the internal URL"),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::{ENV_DEBUG, ENV_HMAC_KEY, ENV_HTTP_EXTERNAL};
    use crate::domain::EnvValue;
    use crate::infrastructure::testing::{
        FakeSupervisor, MemorySecretStore, MutableIngress, RecordingStatus,
    };

    type TestService =
        ReconcileService<FakeSupervisor, MemorySecretStore, MutableIngress, RecordingStatus>;

    fn service(supervisor: FakeSupervisor, ingress_url: Option<&str>) -> TestService {
        ReconcileService::new(
            supervisor,
            MemorySecretStore::default(),
            MutableIngress::new(ingress_url),
            RecordingStatus::default(),
            ReconcileSettings {
                internal_host: "snips-0.snips-endpoints.dev.svc.cluster.local".to_string(),
                ..ReconcileSettings::default()
            },
        )
    }

    #[tokio::test]
    async fn test_fresh_unit_goes_active() {
        let svc = service(FakeSupervisor::reachable(), None);

        let report = svc.handle_event(&LifecycleEvent::WorkloadReady).await.unwrap();

        assert!(report.succeeded());
        assert_eq!(svc.status().last(), Some(UnitStatus::Active));
        assert_eq!(svc.status().history.borrow().len(), 1);

        let plan = svc.supervisor().plan.borrow().clone();
        let env = &plan.services["snips"].environment;
        assert_eq!(env[ENV_DEBUG], EnvValue::Bool(true));
        let key = env[ENV_HMAC_KEY].render();
        assert_eq!(key.len(), 24);
        assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(!env.contains_key(ENV_HTTP_EXTERNAL));
    }

    #[tokio::test]
    async fn test_repeated_events_apply_once() {
        let svc = service(FakeSupervisor::reachable(), Some("https://snips.example.com"));

        for event in [
            LifecycleEvent::WorkloadReady,
            LifecycleEvent::ConfigChanged,
            LifecycleEvent::UpdateStatus,
            LifecycleEvent::IngressReady,
        ] {
            let report = svc.handle_event(&event).await.unwrap();
            assert!(report.succeeded());
            assert_eq!(svc.status().last(), Some(UnitStatus::Active));
        }

        assert_eq!(svc.supervisor().add_layer_calls.get(), 1);
        assert_eq!(svc.supervisor().replan_calls.get(), 1);
        assert_eq!(svc.secrets().add_calls.get(), 1);
    }

    #[tokio::test]
    async fn test_invalid_ingress_url_blocks_without_apply() {
        let svc = service(FakeSupervisor::reachable(), Some("not-a-url"));

        let report = svc.handle_event(&LifecycleEvent::IngressReady).await.unwrap();

        assert_eq!(report.failed_task(), Some(Task::ExternalUrlValidation));
        match svc.status().last() {
            Some(UnitStatus::Blocked(msg)) => assert!(msg.contains("not-a-url")),
            other => panic!("expected blocked status, got {:?}", other),
        }
        assert_eq!(svc.supervisor().add_layer_calls.get(), 0);
        assert_eq!(svc.supervisor().replan_calls.get(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_supervisor_short_circuits() {
        let svc = service(FakeSupervisor::unreachable(), Some("not-a-url"));

        let report = svc.handle_event(&LifecycleEvent::WorkloadReady).await.unwrap();

        assert_eq!(report.failed_task(), Some(Task::ConnectivityCheck));
        assert_eq!(report.results.len(), 1);
        assert_eq!(
            svc.status().last(),
            Some(UnitStatus::Maintenance(WAITING_FOR_POD.to_string()))
        );
        assert_eq!(svc.supervisor().connect_calls.get(), 1);
        assert_eq!(svc.supervisor().get_plan_calls.get(), 0);
        assert_eq!(svc.supervisor().add_layer_calls.get(), 0);
    }

    #[tokio::test]
    async fn test_replan_failure_blocks() {
        let supervisor = FakeSupervisor::reachable();
        supervisor.fail_replan.set(true);
        let svc = service(supervisor, None);

        let report = svc.handle_event(&LifecycleEvent::WorkloadReady).await.unwrap();

        assert_eq!(report.failed_task(), Some(Task::PlanUpdate));
        assert!(matches!(svc.status().last(), Some(UnitStatus::Blocked(_))));
    }

    #[tokio::test]
    async fn test_secret_store_failure_is_fatal() {
        let svc = service(FakeSupervisor::reachable(), None);
        svc.secrets().unavailable.set(true);

        let err = svc.handle_event(&LifecycleEvent::WorkloadReady).await.unwrap_err();

        assert!(matches!(err, OperatorError::SecretStore(_)));
        assert!(svc.status().history.borrow().is_empty());
        assert_eq!(svc.supervisor().add_layer_calls.get(), 0);
    }

    #[tokio::test]
    async fn test_ingress_revoked_removes_external_url() {
        let svc = service(FakeSupervisor::reachable(), Some("https://snips.example.com"));
        svc.handle_event(&LifecycleEvent::IngressReady).await.unwrap();
        assert!(svc.supervisor().plan.borrow().services["snips"]
            .environment
            .contains_key(ENV_HTTP_EXTERNAL));

        *svc.ingress().url.borrow_mut() = None;
        let report = svc.handle_event(&LifecycleEvent::IngressRevoked).await.unwrap();

        assert!(report.succeeded());
        assert!(!svc.supervisor().plan.borrow().services["snips"]
            .environment
            .contains_key(ENV_HTTP_EXTERNAL));
        assert_eq!(svc.supervisor().replan_calls.get(), 2);
    }

    #[tokio::test]
    async fn test_pipeline_without_url_check() {
        let svc = service(FakeSupervisor::reachable(), Some("not-a-url"));
        let inputs = svc.gather_inputs().await.unwrap();

        let report = svc
            .run_pipeline(&Task::pipeline(false), &inputs)
            .await
            .unwrap();

        assert!(report.succeeded());
        assert_eq!(report.results.len(), 2);
    }

    #[test]
    fn test_check_external_url() {
        assert_eq!(check_external_url(None), TaskOutcome::Passed);
        assert_eq!(
            check_external_url(Some("http://snips-0:8080")),
            TaskOutcome::Passed
        );
        assert_eq!(
            check_external_url(Some("ftp://x")),
            TaskOutcome::Failed(UnitStatus::Blocked("Invalid external url: 'ftp://x'".to_string()))
        );
    }
}
