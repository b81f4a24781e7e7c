//! DynamoDB table client implementation.
//!
//! Item schema:
//! - Hash key: `KEY` (String)
//! - Value: `VALUE` (String)

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, KeySchemaElement, KeyType, ProvisionedThroughput,
    ReturnValue, ScalarAttributeType,
};
use aws_sdk_dynamodb::Client;
use tracing::{debug, info};

use crate::config::MetadataStoreConfig;
use crate::error::{MetadataStoreError, Result};
use crate::interfaces::{
    TableClient, TableDescriptor, TableStatus, UpdateCondition, KEY_ATTRIBUTE, VALUE_ATTRIBUTE,
};
use crate::store::DynamoDbMetadataStore;

/// DynamoDB implementation of [`TableClient`].
pub struct DynamoTableClient {
    client: Client,
    table_name: String,
}

impl DynamoTableClient {
    /// Create a new DynamoDB table client from the ambient AWS credential
    /// chain. `endpoint_url` overrides the endpoint for DynamoDB
    /// Local/LocalStack.
    pub async fn new(table_name: impl Into<String>, endpoint_url: Option<&str>) -> Result<Self> {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;

        let client = if let Some(endpoint) = endpoint_url {
            let dynamo_config = aws_sdk_dynamodb::config::Builder::from(&config)
                .endpoint_url(endpoint)
                .build();
            Client::from_conf(dynamo_config)
        } else {
            Client::new(&config)
        };

        let table_name = table_name.into();
        info!(table = %table_name, "Connected to DynamoDB for metadata");

        Ok(Self { client, table_name })
    }

    /// Wrap an existing SDK client.
    pub fn from_client(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    fn key_attribute(key: &str) -> AttributeValue {
        AttributeValue::S(key.to_string())
    }

    fn backing(context: &str, error: impl std::fmt::Display) -> MetadataStoreError {
        MetadataStoreError::BackingStore(format!("{context} failed: {error}"))
    }
}

/// Extract the string `VALUE` attribute from a returned item, if any.
fn string_value(attributes: Option<HashMap<String, AttributeValue>>) -> Option<String> {
    attributes
        .and_then(|mut attrs| attrs.remove(VALUE_ATTRIBUTE))
        .and_then(|value| match value {
            AttributeValue::S(s) => Some(s),
            _ => None,
        })
}

#[async_trait]
impl TableClient for DynamoTableClient {
    async fn describe(&self) -> Result<TableStatus> {
        let output = self
            .client
            .describe_table()
            .table_name(&self.table_name)
            .send()
            .await
            .map_err(|e| {
                let service = e.into_service_error();
                if service.is_resource_not_found_exception() {
                    MetadataStoreError::TableNotFound(self.table_name.clone())
                } else {
                    Self::backing("describe_table", service)
                }
            })?;

        let status = match output.table.and_then(|t| t.table_status) {
            Some(aws_sdk_dynamodb::types::TableStatus::Active) => TableStatus::Active,
            Some(aws_sdk_dynamodb::types::TableStatus::Creating) => TableStatus::Creating,
            Some(aws_sdk_dynamodb::types::TableStatus::Updating) => TableStatus::Updating,
            Some(aws_sdk_dynamodb::types::TableStatus::Deleting) => TableStatus::Deleting,
            _ => TableStatus::Unknown,
        };

        debug!(table = %self.table_name, ?status, "Described DynamoDB table");
        Ok(status)
    }

    async fn create_table(&self, descriptor: &TableDescriptor) -> Result<()> {
        let key_definition = AttributeDefinition::builder()
            .attribute_name(KEY_ATTRIBUTE)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(|e| Self::backing("create_table", e))?;
        let key_schema = KeySchemaElement::builder()
            .attribute_name(KEY_ATTRIBUTE)
            .key_type(KeyType::Hash)
            .build()
            .map_err(|e| Self::backing("create_table", e))?;
        let throughput = ProvisionedThroughput::builder()
            .read_capacity_units(descriptor.read_capacity)
            .write_capacity_units(descriptor.write_capacity)
            .build()
            .map_err(|e| Self::backing("create_table", e))?;

        let result = self
            .client
            .create_table()
            .table_name(&descriptor.name)
            .attribute_definitions(key_definition)
            .key_schema(key_schema)
            .provisioned_throughput(throughput)
            .send()
            .await;

        match result {
            Ok(_) => {
                info!(table = %descriptor.name, "Submitted DynamoDB table creation");
                Ok(())
            }
            Err(e) => {
                let service = e.into_service_error();
                // A concurrent instance created the table first.
                if service.is_resource_in_use_exception() {
                    debug!(table = %descriptor.name, "Table already being created");
                    Ok(())
                } else {
                    Err(Self::backing("create_table", service))
                }
            }
        }
    }

    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(KEY_ATTRIBUTE, Self::key_attribute(key))
            .send()
            .await
            .map_err(|e| Self::backing("get_item", e.into_service_error()))?;

        Ok(string_value(output.item))
    }

    async fn put_item(&self, key: &str, value: &str) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .item(KEY_ATTRIBUTE, Self::key_attribute(key))
            .item(VALUE_ATTRIBUTE, AttributeValue::S(value.to_string()))
            .send()
            .await
            .map_err(|e| Self::backing("put_item", e.into_service_error()))?;

        debug!(key, table = %self.table_name, "Stored metadata in DynamoDB");
        Ok(())
    }

    async fn update_item(
        &self,
        key: &str,
        value: &str,
        condition: UpdateCondition<'_>,
    ) -> Result<Option<String>> {
        let request = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key(KEY_ATTRIBUTE, Self::key_attribute(key))
            .update_expression("SET #v = :value")
            .expression_attribute_names("#v", VALUE_ATTRIBUTE)
            .expression_attribute_values(":value", AttributeValue::S(value.to_string()))
            .return_values(ReturnValue::UpdatedNew);

        let request = match condition {
            UpdateCondition::KeyNotExists => request
                .condition_expression("attribute_not_exists(#k)")
                .expression_attribute_names("#k", KEY_ATTRIBUTE),
            UpdateCondition::ValueEquals(expected) => request
                .condition_expression("#v = :expected")
                .expression_attribute_values(":expected", AttributeValue::S(expected.to_string())),
        };

        let output = request.send().await.map_err(|e| {
            let service = e.into_service_error();
            if service.is_conditional_check_failed_exception() {
                MetadataStoreError::ConditionFailed
            } else {
                Self::backing("update_item", service)
            }
        })?;

        Ok(string_value(output.attributes))
    }

    async fn delete_item(&self, key: &str) -> Result<Option<String>> {
        let output = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .key(KEY_ATTRIBUTE, Self::key_attribute(key))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(|e| Self::backing("delete_item", e.into_service_error()))?;

        Ok(string_value(output.attributes))
    }
}

impl DynamoDbMetadataStore {
    /// Connect to DynamoDB and construct the store, kicking off table
    /// provisioning in the background.
    pub async fn connect(
        config: MetadataStoreConfig,
        endpoint_url: Option<&str>,
    ) -> Result<Self> {
        let client = DynamoTableClient::new(config.table.as_str(), endpoint_url).await?;
        Ok(Self::new(Arc::new(client), &config))
    }
}
