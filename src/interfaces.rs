//! Store and table client contracts.

use async_trait::async_trait;

use crate::error::Result;

/// Name of the hash key attribute in the backing table.
pub const KEY_ATTRIBUTE: &str = "KEY";

/// Name of the value attribute in the backing table.
pub const VALUE_ATTRIBUTE: &str = "VALUE";

/// Interface for a concurrent key/value metadata store.
///
/// Keys and values are non-empty strings; every operation rejects empty
/// arguments with [`MetadataStoreError::InvalidArgument`] before performing
/// any I/O. Atomicity of `put_if_absent` and `replace` is guaranteed by the
/// backing store's conditional-write feature, not by this layer: concurrent
/// `put_if_absent` calls for the same key have exactly one winner.
///
/// # Implementations
///
/// - [`DynamoDbMetadataStore`](crate::store::DynamoDbMetadataStore)
///
/// [`MetadataStoreError::InvalidArgument`]: crate::error::MetadataStoreError::InvalidArgument
#[async_trait]
pub trait ConcurrentMetadataStore: Send + Sync {
    /// Unconditional upsert of `value` under `key`.
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Point lookup. Returns `None` if no entry exists.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Conditional insert that only succeeds when no entry exists under
    /// `key`. Returns `None` on a successful insert; if an entry already
    /// exists, returns its current value from a fresh read instead of
    /// raising.
    async fn put_if_absent(&self, key: &str, value: &str) -> Result<Option<String>>;

    /// Conditional update that succeeds only if the stored value equals
    /// `old_value` at the time of the write. Returns `true` iff the update
    /// was applied; a condition mismatch is a negative result, not an error.
    async fn replace(&self, key: &str, old_value: &str, new_value: &str) -> Result<bool>;

    /// Delete the entry under `key`, returning the prior value if one
    /// existed.
    async fn remove(&self, key: &str) -> Result<Option<String>>;
}

/// Lifecycle status of the backing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Creating,
    Active,
    Updating,
    Deleting,
    /// A status this layer does not model (e.g. archival states).
    Unknown,
}

/// Describes the backing table for creation.
#[derive(Debug, Clone)]
pub struct TableDescriptor {
    /// Table name.
    pub name: String,
    /// Provisioned read capacity units.
    pub read_capacity: i64,
    /// Provisioned write capacity units.
    pub write_capacity: i64,
}

/// Server-checked predicate for a conditional update.
#[derive(Debug, Clone, Copy)]
pub enum UpdateCondition<'a> {
    /// The item must not exist.
    KeyNotExists,
    /// The stored value must equal the given string.
    ValueEquals(&'a str),
}

/// Interface to the remote key/value table.
///
/// One handle is constructed at store-construction time and shared read/write
/// across all operations and tasks for the life of the store, without
/// client-side locks.
///
/// # Implementations
///
/// - [`DynamoTableClient`](crate::dynamo::DynamoTableClient): AWS SDK client
/// - `MockTableClient`: in-memory table for testing
#[async_trait]
pub trait TableClient: Send + Sync {
    /// Describe the table. Returns its status, or
    /// [`MetadataStoreError::TableNotFound`] if it does not exist.
    ///
    /// [`MetadataStoreError::TableNotFound`]: crate::error::MetadataStoreError::TableNotFound
    async fn describe(&self) -> Result<TableStatus>;

    /// Submit a create-table request with a single string hash key attribute
    /// `KEY`. Creation by a concurrent instance counts as success.
    async fn create_table(&self, descriptor: &TableDescriptor) -> Result<()>;

    /// Point lookup of the `VALUE` attribute under `key`.
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Unconditional upsert.
    async fn put_item(&self, key: &str, value: &str) -> Result<()>;

    /// Conditional update of the `VALUE` attribute. Returns the updated value
    /// when the write was applied, or
    /// [`MetadataStoreError::ConditionFailed`] when the predicate did not
    /// hold.
    ///
    /// [`MetadataStoreError::ConditionFailed`]: crate::error::MetadataStoreError::ConditionFailed
    async fn update_item(
        &self,
        key: &str,
        value: &str,
        condition: UpdateCondition<'_>,
    ) -> Result<Option<String>>;

    /// Delete the item under `key`, returning the old `VALUE` attribute if
    /// the item existed.
    async fn delete_item(&self, key: &str) -> Result<Option<String>>;
}
