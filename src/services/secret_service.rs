//! Secret provisioning - get-or-create of the HMAC signing key
//!
//! The key is generated once per deployment and read back from the store on
//! every later invocation.

use rand::distributions::{Alphanumeric, DistString};
use rand::rngs::OsRng;
use tracing::info;

use crate::error::SecretStoreError;
use crate::infrastructure::SecretStore;

/// Length of a generated HMAC key
pub const HMAC_KEY_LENGTH: usize = 24;

/// Generate a random alphanumeric key from the OS CSPRNG
pub fn generate_hmac_key() -> String {
    Alphanumeric.sample_string(&mut OsRng, HMAC_KEY_LENGTH)
}

/// Lazily creates and returns named secrets
pub struct SecretProvisioner<'a, S> {
    store: &'a S,
}

impl<'a, S: SecretStore> SecretProvisioner<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Return the secret value stored under `label`, creating it if absent.
    ///
    /// The value lives in the secret's content under a key equal to the
    /// label. Store failures other than "not found" are returned as is.
    pub async fn get_or_create(&self, label: &str) -> Result<String, SecretStoreError> {
        let content = match self.store.get_secret(label).await {
            Ok(content) => content,
            Err(SecretStoreError::NotFound { .. }) => {
                info!("Secret '{}' not found, generating a new one", label);
                let content = [(label.to_string(), generate_hmac_key())].into_iter().collect();
                self.store.add_secret(label, content).await?
            }
            Err(e) => return Err(e),
        };

        content
            .get(label)
            .cloned()
            .ok_or_else(|| SecretStoreError::MissingKey {
                label: label.to_string(),
                key: label.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::testing::MemorySecretStore;

    #[test]
    fn test_generated_key_format() {
        let key = generate_hmac_key();
        assert_eq!(key.len(), HMAC_KEY_LENGTH);
        assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generated_keys_differ() {
        assert_ne!(generate_hmac_key(), generate_hmac_key());
    }

    #[tokio::test]
    async fn test_get_or_create_is_stable() {
        let store = MemorySecretStore::default();
        let provisioner = SecretProvisioner::new(&store);

        let first = provisioner.get_or_create("hmac-key").await.unwrap();
        let second = provisioner.get_or_create("hmac-key").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 24);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(store.get_calls.get(), 2);
        assert_eq!(store.add_calls.get(), 1);
    }

    #[tokio::test]
    async fn test_existing_secret_is_returned_unchanged() {
        let store = MemorySecretStore::with_secret("hmac-key", "hmac-key", "D10S");
        let provisioner = SecretProvisioner::new(&store);

        assert_eq!(provisioner.get_or_create("hmac-key").await.unwrap(), "D10S");
        assert_eq!(store.get_calls.get(), 1);
        assert_eq!(store.add_calls.get(), 0);
    }

    #[tokio::test]
    async fn test_store_unavailable_propagates() {
        let store = MemorySecretStore::default();
        store.unavailable.set(true);
        let provisioner = SecretProvisioner::new(&store);

        let err = provisioner.get_or_create("hmac-key").await.unwrap_err();
        assert!(matches!(err, SecretStoreError::Unavailable { .. }));
        assert_eq!(store.add_calls.get(), 0);
    }

    #[tokio::test]
    async fn test_secret_without_expected_key() {
        let store = MemorySecretStore::with_secret("hmac-key", "other", "x");
        let provisioner = SecretProvisioner::new(&store);

        let err = provisioner.get_or_create("hmac-key").await.unwrap_err();
        assert!(matches!(err, SecretStoreError::MissingKey { .. }));
    }
}
