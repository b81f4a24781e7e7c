//! DynamoDB storage integration tests.
//!
//! Run with: cargo test --test storage_dynamo -- --ignored --nocapture
//!
//! Requires: DYNAMODB_URL env var or DynamoDB Local/LocalStack on
//! localhost:8000, plus dummy AWS credentials in the environment.
//!
//! Note: Tests use unique table names to avoid conflicts between runs.

use dynamodb_metastore::{
    ConcurrentMetadataStore, DynamoDbMetadataStore, MetadataStoreConfig,
};

fn dynamodb_url() -> String {
    std::env::var("DYNAMODB_URL").unwrap_or_else(|_| "http://localhost:8000".to_string())
}

fn test_table() -> String {
    format!(
        "metastore_test_{}",
        &uuid::Uuid::new_v4().to_string().replace('-', "")[..8]
    )
}

async fn connect() -> DynamoDbMetadataStore {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let config = MetadataStoreConfig {
        // Local emulators activate tables near-instantly.
        activation_delay_secs: 1,
        ..MetadataStoreConfig::for_table(test_table())
    };

    DynamoDbMetadataStore::connect(config, Some(&dynamodb_url()))
        .await
        .expect("Failed to connect to DynamoDB")
}

#[tokio::test]
#[ignore = "requires running DynamoDB instance"]
async fn test_dynamo_metadata_store() {
    println!("=== DynamoDB MetadataStore Tests ===");
    println!("Connecting to: {}", dynamodb_url());

    let store = connect().await;

    store.put("stream", "100").await.expect("put failed");
    assert_eq!(store.get("stream").await.unwrap().as_deref(), Some("100"));

    assert_eq!(store.put_if_absent("stream", "200").await.unwrap().as_deref(), Some("100"));
    assert_eq!(store.put_if_absent("fresh", "1").await.unwrap(), None);

    assert!(store.replace("stream", "100", "101").await.unwrap());
    assert!(!store.replace("stream", "100", "102").await.unwrap());
    assert_eq!(store.get("stream").await.unwrap().as_deref(), Some("101"));

    assert_eq!(store.remove("stream").await.unwrap().as_deref(), Some("101"));
    assert_eq!(store.get("stream").await.unwrap(), None);
    assert_eq!(store.remove("stream").await.unwrap(), None);

    println!("=== All DynamoDB MetadataStore tests PASSED ===");
}

#[tokio::test]
#[ignore = "requires running DynamoDB instance"]
async fn test_dynamo_concurrent_put_if_absent() {
    println!("=== DynamoDB concurrent putIfAbsent ===");

    let store = connect().await;

    let (a, b) = futures::join!(
        store.put_if_absent("race", "a"),
        store.put_if_absent("race", "b"),
    );
    let a = a.unwrap();
    let b = b.unwrap();

    assert!(a.is_none() ^ b.is_none(), "exactly one winner: {a:?} / {b:?}");
    let stored = store.get("race").await.unwrap().unwrap();
    assert_eq!(a.or(b).unwrap(), stored);

    println!("=== DynamoDB concurrency test PASSED ===");
}
