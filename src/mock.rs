//! In-memory table client for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::error::{MetadataStoreError, Result};
use crate::interfaces::{TableClient, TableDescriptor, TableStatus, UpdateCondition};

const MOCK_TABLE: &str = "MockMetadataStore";

enum TableState {
    Absent,
    Creating { remaining: usize },
    Active,
}

/// Mock table client with a scriptable provisioning lifecycle.
///
/// Starts either active ([`MockTableClient::new`]) or absent
/// ([`MockTableClient::absent`]); an absent table transitions to active a
/// configurable number of describes after `create_table`. Item operations
/// fail with `TableNotFound` until the table is active. Call counters let
/// tests assert on creation attempts and the absence of item I/O.
#[derive(Default)]
pub struct MockTableClient {
    items: RwLock<HashMap<String, String>>,
    state: Mutex<TableState>,
    creating_describes: usize,
    fail_create: bool,
    describe_calls: AtomicUsize,
    create_calls: AtomicUsize,
    data_calls: AtomicUsize,
}

impl Default for TableState {
    fn default() -> Self {
        TableState::Active
    }
}

impl MockTableClient {
    /// An already-active table.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table that does not exist yet. After `create_table`, describe
    /// reports `Creating` for `creating_describes` calls before turning
    /// `Active`.
    pub fn absent(creating_describes: usize) -> Self {
        Self {
            state: Mutex::new(TableState::Absent),
            creating_describes,
            ..Self::default()
        }
    }

    /// Make `create_table` fail with a backing-store error.
    pub fn with_failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// Number of describe calls observed.
    pub fn describe_calls(&self) -> usize {
        self.describe_calls.load(Ordering::SeqCst)
    }

    /// Number of create-table calls observed.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of item-level calls (get/put/update/delete) observed.
    pub fn data_calls(&self) -> usize {
        self.data_calls.load(Ordering::SeqCst)
    }

    async fn ensure_active(&self) -> Result<()> {
        self.data_calls.fetch_add(1, Ordering::SeqCst);
        match *self.state.lock().await {
            TableState::Active => Ok(()),
            _ => Err(MetadataStoreError::TableNotFound(MOCK_TABLE.to_string())),
        }
    }
}

#[async_trait]
impl TableClient for MockTableClient {
    async fn describe(&self) -> Result<TableStatus> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().await;
        match *state {
            TableState::Absent => Err(MetadataStoreError::TableNotFound(MOCK_TABLE.to_string())),
            TableState::Creating { remaining } if remaining > 0 => {
                *state = TableState::Creating {
                    remaining: remaining - 1,
                };
                Ok(TableStatus::Creating)
            }
            TableState::Creating { .. } => {
                *state = TableState::Active;
                Ok(TableStatus::Active)
            }
            TableState::Active => Ok(TableStatus::Active),
        }
    }

    async fn create_table(&self, _descriptor: &TableDescriptor) -> Result<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create {
            return Err(MetadataStoreError::BackingStore(
                "create table rejected".to_string(),
            ));
        }
        let mut state = self.state.lock().await;
        if let TableState::Absent = *state {
            *state = TableState::Creating {
                remaining: self.creating_describes,
            };
        }
        Ok(())
    }

    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.ensure_active().await?;
        Ok(self.items.read().await.get(key).cloned())
    }

    async fn put_item(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_active().await?;
        self.items
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn update_item(
        &self,
        key: &str,
        value: &str,
        condition: UpdateCondition<'_>,
    ) -> Result<Option<String>> {
        self.ensure_active().await?;
        // The check and the write happen under one lock, mirroring the
        // atomicity of a DynamoDB conditional update.
        let mut items = self.items.write().await;
        match condition {
            UpdateCondition::KeyNotExists => {
                if items.contains_key(key) {
                    return Err(MetadataStoreError::ConditionFailed);
                }
            }
            UpdateCondition::ValueEquals(expected) => match items.get(key) {
                Some(current) if current == expected => {}
                _ => return Err(MetadataStoreError::ConditionFailed),
            },
        }
        items.insert(key.to_string(), value.to_string());
        Ok(Some(value.to_string()))
    }

    async fn delete_item(&self, key: &str) -> Result<Option<String>> {
        self.ensure_active().await?;
        Ok(self.items.write().await.remove(key))
    }
}
