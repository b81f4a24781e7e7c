//! Error taxonomy for metadata store operations.

use crate::interfaces::TableStatus;

/// Result type for metadata store operations.
pub type Result<T> = std::result::Result<T, MetadataStoreError>;

/// Errors that can occur during metadata store operations.
///
/// Condition-failed errors never escape the public store API: `put_if_absent`
/// and `replace` translate them into a negative result. Everything the
/// backing store raises beyond that is surfaced verbatim as `BackingStore`,
/// with no retry or reinterpretation at this layer.
#[derive(Debug, thiserror::Error)]
pub enum MetadataStoreError {
    /// An empty key or value was passed to a store operation. Raised
    /// synchronously, before any table I/O.
    #[error("'{0}' must not be empty")]
    InvalidArgument(&'static str),

    /// The backing table does not exist.
    #[error("table '{0}' not found")]
    TableNotFound(String),

    /// The backing table exists but is not yet usable. Only produced while
    /// waiting for table activation during provisioning.
    #[error("table '{table}' is not active: {status:?}")]
    TableNotActive { table: String, status: TableStatus },

    /// A conditional write was rejected because the server-checked predicate
    /// on the current stored state did not hold.
    #[error("conditional check failed")]
    ConditionFailed,

    /// Any other failure from the backing store (network, throttling,
    /// permissions). Propagated unchanged to the caller.
    #[error("DynamoDB error: {0}")]
    BackingStore(String),
}
