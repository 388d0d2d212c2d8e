//! Unit status reporting via `status-set`

use tracing::debug;

use super::hook_tools::HookTools;
use super::StatusSink;
use crate::domain::UnitStatus;
use crate::error::HookToolError;

/// Status sink writing to the Juju agent
#[derive(Debug, Clone, Default)]
pub struct JujuStatus {
    tools: HookTools,
}

impl JujuStatus {
    pub fn new(tools: HookTools) -> Self {
        Self { tools }
    }
}

impl StatusSink for JujuStatus {
    async fn set_status(&self, status: &UnitStatus) -> Result<(), HookToolError> {
        debug!("Setting unit status: {}", status);
        self.tools
            .run("status-set", &[status.name(), status.message()])
            .await
            .map(|_| ())
    }
}
