//! Asynchronous table provisioning.

use std::sync::Arc;
use std::time::Duration;

use backon::{ConstantBuilder, Retryable};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::MetadataStoreConfig;
use crate::error::{MetadataStoreError, Result};
use crate::gate::ReadinessGate;
use crate::interfaces::{TableClient, TableDescriptor, TableStatus};

/// Ensures the backing table exists and is usable, then signals the
/// readiness gate.
///
/// Runs once per store instance, fire-and-forget relative to the
/// constructing thread: nothing here throws back to the caller. Every exit
/// path, including describe/create/wait failures, is logged and still
/// signals the gate so store operations are never blocked past their bound.
pub struct TableProvisioner {
    table: Arc<dyn TableClient>,
    descriptor: TableDescriptor,
    activation_attempts: usize,
    activation_delay: Duration,
    gate: Arc<ReadinessGate>,
}

impl TableProvisioner {
    pub fn new(
        table: Arc<dyn TableClient>,
        config: &MetadataStoreConfig,
        gate: Arc<ReadinessGate>,
    ) -> Self {
        Self {
            table,
            descriptor: config.descriptor(),
            activation_attempts: config.activation_attempts,
            activation_delay: config.activation_delay(),
            gate,
        }
    }

    /// Run provisioning on a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    /// Run provisioning to completion. The gate is signaled exactly once, on
    /// every path.
    pub async fn run(self) {
        self.ensure_table().await;
        self.gate.signal();
    }

    async fn ensure_table(&self) {
        match self.table.describe().await {
            Ok(status) => {
                debug!(table = %self.descriptor.name, ?status, "metadata table present");
                return;
            }
            Err(MetadataStoreError::TableNotFound(_)) => {
                info!(table = %self.descriptor.name, "no metadata table; creating one");
            }
            Err(e) => {
                error!(table = %self.descriptor.name, error = %e, "cannot describe metadata table");
                return;
            }
        }

        if let Err(e) = self.table.create_table(&self.descriptor).await {
            error!(table = %self.descriptor.name, error = %e, "cannot create metadata table");
            return;
        }

        match self.wait_until_active().await {
            Ok(()) => info!(table = %self.descriptor.name, "metadata table active"),
            Err(e) => {
                error!(
                    table = %self.descriptor.name,
                    error = %e,
                    attempts = self.activation_attempts,
                    "metadata table did not become active"
                );
            }
        }
    }

    /// Poll describe until the table reports `Active`, with a fixed delay
    /// and a hard attempt cap. `TableNotFound` is retried too: describe can
    /// lag the create on an eventually consistent control plane.
    async fn wait_until_active(&self) -> Result<()> {
        let describe = || async {
            match self.table.describe().await {
                Ok(TableStatus::Active) => Ok(()),
                Ok(status) => Err(MetadataStoreError::TableNotActive {
                    table: self.descriptor.name.clone(),
                    status,
                }),
                Err(e) => Err(e),
            }
        };

        describe
            .retry(
                ConstantBuilder::default()
                    .with_delay(self.activation_delay)
                    .with_max_times(self.activation_attempts.saturating_sub(1)),
            )
            .when(|e| {
                matches!(
                    e,
                    MetadataStoreError::TableNotActive { .. }
                        | MetadataStoreError::TableNotFound(_)
                )
            })
            .await
    }
}
