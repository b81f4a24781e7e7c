//! DynamoDB-backed concurrent metadata store.
//!
//! A flat key/value store with compare-and-swap semantics, used to persist
//! "last processed" watermarks between polling cycles. The backing table is
//! provisioned asynchronously at store construction; every operation waits on
//! a one-shot readiness gate (bounded, never raising) before touching the
//! table. All mutual exclusion is delegated to DynamoDB's conditional-write
//! primitives; no client-side locking is layered on top.

pub mod config;
pub mod error;
pub mod gate;
pub mod interfaces;
pub mod provision;
pub mod store;

#[cfg(feature = "dynamo")]
pub mod dynamo;

pub mod mock;

pub use config::{MetadataStoreConfig, DEFAULT_TABLE_NAME};
pub use error::{MetadataStoreError, Result};
pub use interfaces::{
    ConcurrentMetadataStore, TableClient, TableDescriptor, TableStatus, UpdateCondition,
};
pub use store::DynamoDbMetadataStore;

#[cfg(feature = "dynamo")]
pub use dynamo::DynamoTableClient;
