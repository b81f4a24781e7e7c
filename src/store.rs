//! Concurrent metadata store over a remote table.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::MetadataStoreConfig;
use crate::error::{MetadataStoreError, Result};
use crate::gate::ReadinessGate;
use crate::interfaces::{ConcurrentMetadataStore, TableClient, UpdateCondition};
use crate::provision::TableProvisioner;

/// Key/value metadata store backed by a DynamoDB table.
///
/// The store owns one [`TableClient`] for its entire lifetime. Construction
/// spawns a single provisioning task that creates the backing table if
/// absent; every operation waits on the readiness gate (bounded, never
/// raising) before touching the table. Atomicity of `put_if_absent` and
/// `replace` is the backing store's conditional-write atomicity; no
/// client-side locking is added.
pub struct DynamoDbMetadataStore {
    table: Arc<dyn TableClient>,
    gate: Arc<ReadinessGate>,
    readiness_timeout: Duration,
}

impl DynamoDbMetadataStore {
    /// Create the store and kick off table provisioning in the background.
    ///
    /// Must be called from within a tokio runtime; provisioning runs on a
    /// spawned task and never reports back to this constructor.
    pub fn new(table: Arc<dyn TableClient>, config: &MetadataStoreConfig) -> Self {
        let gate = Arc::new(ReadinessGate::new());
        TableProvisioner::new(Arc::clone(&table), config, Arc::clone(&gate)).spawn();

        Self {
            table,
            gate,
            readiness_timeout: config.readiness_timeout(),
        }
    }

    async fn await_active(&self) {
        self.gate.await_ready(self.readiness_timeout).await;
    }

    fn require_non_empty(name: &'static str, argument: &str) -> Result<()> {
        if argument.is_empty() {
            return Err(MetadataStoreError::InvalidArgument(name));
        }
        Ok(())
    }
}

#[async_trait]
impl ConcurrentMetadataStore for DynamoDbMetadataStore {
    async fn put(&self, key: &str, value: &str) -> Result<()> {
        Self::require_non_empty("key", key)?;
        Self::require_non_empty("value", value)?;

        self.await_active().await;

        self.table.put_item(key, value).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Self::require_non_empty("key", key)?;

        self.await_active().await;

        self.table.get_item(key).await
    }

    async fn put_if_absent(&self, key: &str, value: &str) -> Result<Option<String>> {
        Self::require_non_empty("key", key)?;
        Self::require_non_empty("value", value)?;

        self.await_active().await;

        match self
            .table
            .update_item(key, value, UpdateCondition::KeyNotExists)
            .await
        {
            Ok(_) => Ok(None),
            Err(MetadataStoreError::ConditionFailed) => {
                // Lost the race; report the winner's value from a fresh read.
                debug!(key, "entry already present, returning current value");
                self.table.get_item(key).await
            }
            Err(e) => Err(e),
        }
    }

    async fn replace(&self, key: &str, old_value: &str, new_value: &str) -> Result<bool> {
        Self::require_non_empty("key", key)?;
        Self::require_non_empty("old_value", old_value)?;
        Self::require_non_empty("new_value", new_value)?;

        self.await_active().await;

        match self
            .table
            .update_item(key, new_value, UpdateCondition::ValueEquals(old_value))
            .await
        {
            Ok(updated) => Ok(updated.is_some()),
            Err(MetadataStoreError::ConditionFailed) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn remove(&self, key: &str) -> Result<Option<String>> {
        Self::require_non_empty("key", key)?;

        self.await_active().await;

        self.table.delete_item(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTableClient;

    fn test_config() -> MetadataStoreConfig {
        MetadataStoreConfig {
            activation_delay_secs: 0,
            readiness_timeout_secs: 5,
            ..MetadataStoreConfig::default()
        }
    }

    fn ready_store() -> (DynamoDbMetadataStore, Arc<MockTableClient>) {
        let table = Arc::new(MockTableClient::new());
        let store = DynamoDbMetadataStore::new(table.clone(), &test_config());
        (store, table)
    }

    #[tokio::test]
    async fn put_then_get_returns_value() {
        let (store, _) = ready_store();

        store.put("stream-a", "42").await.unwrap();
        assert_eq!(store.get("stream-a").await.unwrap().as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn put_overwrites_existing_value() {
        let (store, _) = ready_store();

        store.put("stream-a", "42").await.unwrap();
        store.put("stream-a", "43").await.unwrap();
        assert_eq!(store.get("stream-a").await.unwrap().as_deref(), Some("43"));
    }

    #[tokio::test]
    async fn get_missing_key_is_none() {
        let (store, _) = ready_store();
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_if_absent_wins_on_empty_slot() {
        let (store, _) = ready_store();

        assert_eq!(store.put_if_absent("k", "a").await.unwrap(), None);
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn put_if_absent_returns_existing_value() {
        let (store, _) = ready_store();

        store.put_if_absent("k", "a").await.unwrap();
        let previous = store.put_if_absent("k", "b").await.unwrap();
        assert_eq!(previous.as_deref(), Some("a"));
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn concurrent_put_if_absent_has_one_winner() {
        let (store, _) = ready_store();

        let (first, second) = futures::join!(
            store.put_if_absent("k", "a"),
            store.put_if_absent("k", "b"),
        );
        let first = first.unwrap();
        let second = second.unwrap();

        assert!(
            first.is_none() ^ second.is_none(),
            "exactly one caller must win: {first:?} / {second:?}"
        );
        let stored = store.get("k").await.unwrap().unwrap();
        match (first, second) {
            (None, Some(observed)) | (Some(observed), None) => {
                assert_eq!(observed, stored);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn replace_applies_only_on_matching_old_value() {
        let (store, _) = ready_store();

        store.put("k", "v1").await.unwrap();
        assert!(store.replace("k", "v1", "v2").await.unwrap());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));

        assert!(!store.replace("k", "wrong", "v3").await.unwrap());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn replace_on_missing_key_is_false() {
        let (store, _) = ready_store();
        assert!(!store.replace("missing", "a", "b").await.unwrap());
    }

    #[tokio::test]
    async fn remove_returns_prior_value() {
        let (store, _) = ready_store();

        store.put("k", "v").await.unwrap();
        assert_eq!(store.remove("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(store.get("k").await.unwrap(), None);
        assert_eq!(store.remove("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn empty_arguments_fail_fast_without_io() {
        let (store, table) = ready_store();

        assert!(matches!(
            store.put("", "v").await,
            Err(MetadataStoreError::InvalidArgument("key"))
        ));
        assert!(matches!(
            store.put("k", "").await,
            Err(MetadataStoreError::InvalidArgument("value"))
        ));
        assert!(matches!(
            store.get("").await,
            Err(MetadataStoreError::InvalidArgument("key"))
        ));
        assert!(matches!(
            store.put_if_absent("", "v").await,
            Err(MetadataStoreError::InvalidArgument("key"))
        ));
        assert!(matches!(
            store.put_if_absent("k", "").await,
            Err(MetadataStoreError::InvalidArgument("value"))
        ));
        assert!(matches!(
            store.replace("", "a", "b").await,
            Err(MetadataStoreError::InvalidArgument("key"))
        ));
        assert!(matches!(
            store.replace("k", "", "b").await,
            Err(MetadataStoreError::InvalidArgument("old_value"))
        ));
        assert!(matches!(
            store.replace("k", "a", "").await,
            Err(MetadataStoreError::InvalidArgument("new_value"))
        ));
        assert!(matches!(
            store.remove("").await,
            Err(MetadataStoreError::InvalidArgument("key"))
        ));

        assert_eq!(table.data_calls(), 0);
    }

    #[tokio::test]
    async fn operations_wait_for_provisioning() {
        // Table is created during construction; the first operation must
        // block on the gate until it reports active.
        let table = Arc::new(MockTableClient::absent(2));
        let store = DynamoDbMetadataStore::new(table.clone(), &test_config());

        store.put("stream-a", "1").await.unwrap();
        assert_eq!(table.create_calls(), 1);
        assert_eq!(store.get("stream-a").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn operations_proceed_after_gate_timeout() {
        // Provisioning that never finishes must not block operations past
        // the readiness bound; the table error surfaces instead.
        let table = Arc::new(MockTableClient::absent(usize::MAX).with_failing_create());
        let config = MetadataStoreConfig {
            readiness_timeout_secs: 0,
            ..test_config()
        };
        let store = DynamoDbMetadataStore::new(table.clone(), &config);

        let result = store.put("k", "v").await;
        assert!(matches!(result, Err(MetadataStoreError::TableNotFound(_))));
    }
}
