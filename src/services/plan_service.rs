//! Plan reconciliation - converge the supervisor's plan on the desired layer

use tracing::{error, info};

use crate::domain::Layer;
use crate::error::SupervisorError;
use crate::infrastructure::Supervisor;

/// What a reconcile attempt did to the plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanChange {
    /// Layer added and replan succeeded
    Applied,
    /// Running plan already matched; nothing submitted
    Unchanged,
    /// Layer added but replan was rejected
    Failed(String),
}

impl PlanChange {
    /// Whether the reconcile step succeeded (a no-op counts as success)
    pub fn succeeded(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// Compares desired and observed plans and applies on divergence
pub struct PlanReconciler<'a, S> {
    supervisor: &'a S,
    layer_name: &'a str,
    service_name: &'a str,
}

impl<'a, S: Supervisor> PlanReconciler<'a, S> {
    pub fn new(supervisor: &'a S, layer_name: &'a str, service_name: &'a str) -> Self {
        Self {
            supervisor,
            layer_name,
            service_name,
        }
    }

    /// Push `desired` if the running plan differs from it.
    ///
    /// A rejected replan is logged with the current plan and reported as
    /// [`PlanChange::Failed`]; only failures to talk to the supervisor at
    /// all come back as `Err`.
    pub async fn reconcile(&self, desired: &Layer) -> Result<PlanChange, SupervisorError> {
        let observed = self.supervisor.get_plan().await?;

        if !observed.diverges_from(desired, self.service_name) {
            info!("Plan for '{}' is up to date", self.service_name);
            return Ok(PlanChange::Unchanged);
        }

        info!("Plan for '{}' diverged, adding layer '{}'", self.service_name, self.layer_name);
        self.supervisor
            .add_layer(self.layer_name, desired, true)
            .await?;

        match self.supervisor.replan().await {
            Ok(()) => {
                info!("Replanned '{}'", self.service_name);
                Ok(PlanChange::Applied)
            }
            Err(e) => {
                let snapshot = match self.supervisor.get_plan().await {
                    Ok(plan) => plan.to_yaml(),
                    Err(plan_err) => format!("<unavailable: {}>", plan_err),
                };
                error!("Failed to replan; pebble plan: {}; {}", snapshot, e);
                Ok(PlanChange::Failed(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{build_layer, PlanSnapshot, WorkloadSettings};
    use crate::infrastructure::testing::FakeSupervisor;

    fn desired() -> Layer {
        build_layer(&WorkloadSettings::default(), "D10S", None)
    }

    #[tokio::test]
    async fn test_missing_service_is_applied_once() {
        let supervisor = FakeSupervisor::reachable();
        let reconciler = PlanReconciler::new(&supervisor, "snips", "snips");

        let change = reconciler.reconcile(&desired()).await.unwrap();

        assert_eq!(change, PlanChange::Applied);
        assert_eq!(supervisor.add_layer_calls.get(), 1);
        assert_eq!(supervisor.replan_calls.get(), 1);

        let (name, layer, combine) = supervisor.last_layer.borrow().clone().unwrap();
        assert_eq!(name, "snips");
        assert_eq!(layer, desired());
        assert!(combine);
    }

    #[tokio::test]
    async fn test_matching_plan_is_noop() {
        let supervisor = FakeSupervisor::with_plan(PlanSnapshot {
            services: desired().services,
        });
        let reconciler = PlanReconciler::new(&supervisor, "snips", "snips");

        let change = reconciler.reconcile(&desired()).await.unwrap();

        assert_eq!(change, PlanChange::Unchanged);
        assert!(change.succeeded());
        assert_eq!(supervisor.add_layer_calls.get(), 0);
        assert_eq!(supervisor.replan_calls.get(), 0);
    }

    #[tokio::test]
    async fn test_changed_environment_is_applied() {
        let supervisor = FakeSupervisor::with_plan(PlanSnapshot {
            services: build_layer(&WorkloadSettings::default(), "OLD", None).services,
        });
        let reconciler = PlanReconciler::new(&supervisor, "snips", "snips");

        assert_eq!(
            reconciler.reconcile(&desired()).await.unwrap(),
            PlanChange::Applied
        );
        assert_eq!(supervisor.plan.borrow().services, desired().services);
    }

    #[tokio::test]
    async fn test_replan_failure_is_reported_not_raised() {
        let supervisor = FakeSupervisor::reachable();
        supervisor.fail_replan.set(true);
        let reconciler = PlanReconciler::new(&supervisor, "snips", "snips");

        let change = reconciler.reconcile(&desired()).await.unwrap();

        assert!(matches!(change, PlanChange::Failed(ref msg) if msg.contains("exited quickly")));
        assert!(!change.succeeded());
        // one read to compare, one to log the snapshot
        assert_eq!(supervisor.get_plan_calls.get(), 2);
    }
}
