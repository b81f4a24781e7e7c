//! Metadata store configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::interfaces::TableDescriptor;

/// Default name for the metadata table in DynamoDB.
pub const DEFAULT_TABLE_NAME: &str = "SpringIntegrationMetadataStore";

/// Default provisioned read capacity units.
pub const DEFAULT_READ_CAPACITY: i64 = 10_000;

/// Default provisioned write capacity units.
pub const DEFAULT_WRITE_CAPACITY: i64 = 10_000;

/// Metadata store configuration.
///
/// Set before the store is first used; there is no runtime reconfiguration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetadataStoreConfig {
    /// Backing table name.
    pub table: String,
    /// Provisioned read capacity units used when creating the table.
    pub read_capacity: i64,
    /// Provisioned write capacity units used when creating the table.
    pub write_capacity: i64,
    /// Maximum describe attempts while waiting for a created table to
    /// become active.
    pub activation_attempts: usize,
    /// Fixed delay between activation attempts, in seconds.
    pub activation_delay_secs: u64,
    /// How long each store operation waits on the readiness gate before
    /// proceeding, in seconds.
    pub readiness_timeout_secs: u64,
}

impl Default for MetadataStoreConfig {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE_NAME.to_string(),
            read_capacity: DEFAULT_READ_CAPACITY,
            write_capacity: DEFAULT_WRITE_CAPACITY,
            activation_attempts: 25,
            activation_delay_secs: 1,
            readiness_timeout_secs: 10,
        }
    }
}

impl MetadataStoreConfig {
    /// Configuration for the named table, defaults otherwise.
    pub fn for_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Descriptor used for table creation.
    pub fn descriptor(&self) -> TableDescriptor {
        TableDescriptor {
            name: self.table.clone(),
            read_capacity: self.read_capacity,
            write_capacity: self.write_capacity,
        }
    }

    /// Delay between table-activation describe attempts.
    pub fn activation_delay(&self) -> Duration {
        Duration::from_secs(self.activation_delay_secs)
    }

    /// Bound on the per-operation readiness wait.
    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_secs(self.readiness_timeout_secs)
    }
}
