//! Kubernetes `Secret` backed secret store
//!
//! Alternative to Juju secrets for models running on controllers without
//! secret support. Each label maps to one `Secret` in the model namespace.

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::{
    api::{Api, PostParams},
    Client, Config,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::{SecretContent, SecretStore};
use crate::error::SecretStoreError;

const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
const MANAGED_BY: &str = "snips-operator";

/// Secret store over the Kubernetes API
#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
    namespace: String,
    name_prefix: String,
}

impl KubeSecretStore {
    pub fn new(client: Client, namespace: impl Into<String>, name_prefix: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            name_prefix: name_prefix.into(),
        }
    }

    /// Build a store from the in-cluster config or kubeconfig
    pub async fn infer(
        namespace: impl Into<String>,
        name_prefix: impl Into<String>,
    ) -> Result<Self, SecretStoreError> {
        let config = Config::infer()
            .await
            .map_err(|e| SecretStoreError::Unavailable {
                message: format!("failed to infer kubeconfig: {}", e),
            })?;
        let client = Client::try_from(config).map_err(|e| SecretStoreError::Unavailable {
            message: format!("failed to create Kubernetes client: {}", e),
        })?;
        Ok(Self::new(client, namespace, name_prefix))
    }

    fn secret_name(&self, label: &str) -> String {
        secret_name(&self.name_prefix, label)
    }

    fn api(&self) -> Api<Secret> {
        Api::namespaced(self.client.clone(), &self.namespace)
    }
}

fn secret_name(prefix: &str, label: &str) -> String {
    if prefix.is_empty() {
        label.to_string()
    } else {
        format!("{}-{}", prefix, label)
    }
}

fn decode(label: &str, secret: Secret) -> Result<SecretContent, SecretStoreError> {
    let mut content = BTreeMap::new();
    for (key, value) in secret.data.unwrap_or_default() {
        let value = String::from_utf8(value.0).map_err(|_| SecretStoreError::Unavailable {
            message: format!("secret '{}' key '{}' is not valid UTF-8", label, key),
        })?;
        content.insert(key, value);
    }
    Ok(content)
}

fn unavailable(err: kube::Error) -> SecretStoreError {
    SecretStoreError::Unavailable {
        message: err.to_string(),
    }
}

impl SecretStore for KubeSecretStore {
    async fn get_secret(&self, label: &str) -> Result<SecretContent, SecretStoreError> {
        let name = self.secret_name(label);
        debug!("Reading Secret {}/{}", self.namespace, name);

        match self.api().get_opt(&name).await.map_err(unavailable)? {
            Some(secret) => decode(label, secret),
            None => Err(SecretStoreError::NotFound {
                label: label.to_string(),
            }),
        }
    }

    async fn add_secret(
        &self,
        label: &str,
        content: SecretContent,
    ) -> Result<SecretContent, SecretStoreError> {
        let name = self.secret_name(label);
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some(name.clone()),
                labels: Some(BTreeMap::from([(
                    MANAGED_BY_LABEL.to_string(),
                    MANAGED_BY.to_string(),
                )])),
                ..Default::default()
            },
            string_data: Some(content.clone()),
            ..Default::default()
        };

        match self.api().create(&PostParams::default(), &secret).await {
            Ok(_) => {
                info!("Created Secret {}/{}", self.namespace, name);
                Ok(content)
            }
            // Another unit won the race; its value is the one to use
            Err(kube::Error::Api(resp)) if resp.code == 409 => self.get_secret(label).await,
            Err(e) => Err(unavailable(e)),
        }
    }
}
