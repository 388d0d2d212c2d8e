//! Ingress URL sources
//!
//! The ingress provider (e.g. traefik) publishes the public URL in its
//! application databag under the `ingress` key as a small YAML document:
//!
//! ```yaml
//! url: https://snips.example.com/
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::hook_tools::HookTools;
use super::IngressSource;
use crate::error::HookToolError;

#[derive(Debug, Deserialize)]
struct IngressData {
    url: Option<String>,
}

/// Extract the URL from the provider's application databag
fn url_from_databag(databag: &BTreeMap<String, String>) -> Option<String> {
    let raw = databag.get("ingress")?;
    match serde_yaml::from_str::<IngressData>(raw) {
        Ok(data) => data.url.filter(|url| !url.is_empty()),
        Err(e) => {
            // Surface the raw value so the URL check can report it
            warn!("Ingress data is not a mapping ({}); using it verbatim", e);
            Some(raw.trim().to_string())
        }
    }
}

/// Reads the URL from the ingress relation with hook tools
#[derive(Debug, Clone)]
pub struct RelationIngress {
    tools: HookTools,
    endpoint: String,
}

impl RelationIngress {
    pub fn new(tools: HookTools, endpoint: impl Into<String>) -> Self {
        Self {
            tools,
            endpoint: endpoint.into(),
        }
    }

    async fn lookup(&self) -> Result<Option<String>, HookToolError> {
        let relation_ids: Vec<String> = self
            .tools
            .run_json("relation-ids", &[&self.endpoint, "--format=json"])
            .await?;

        let Some(relation_id) = relation_ids.first() else {
            debug!("No {} relation", self.endpoint);
            return Ok(None);
        };

        let units: Vec<String> = self
            .tools
            .run_json("relation-list", &["-r", relation_id, "--format=json"])
            .await?;

        let Some(remote_app) = units
            .first()
            .and_then(|unit| unit.split('/').next())
            .map(str::to_string)
        else {
            debug!("Relation {} has no remote units yet", relation_id);
            return Ok(None);
        };

        let databag: BTreeMap<String, String> = self
            .tools
            .run_json(
                "relation-get",
                &["-r", relation_id, "--app", "--format=json", "-", &remote_app],
            )
            .await?;

        Ok(url_from_databag(&databag))
    }
}

impl IngressSource for RelationIngress {
    async fn url(&self) -> Option<String> {
        match self.lookup().await {
            Ok(url) => url,
            Err(e) => {
                warn!("Failed to read {} relation data: {}", self.endpoint, e);
                None
            }
        }
    }
}

/// Fixed ingress URL, typically passed by the dispatcher or in tests
#[derive(Debug, Clone, Default)]
pub struct StaticIngress {
    url: Option<String>,
}

impl StaticIngress {
    pub fn new(url: Option<String>) -> Self {
        Self { url }
    }
}

impl IngressSource for StaticIngress {
    async fn url(&self) -> Option<String> {
        self.url.clone()
    }
}
