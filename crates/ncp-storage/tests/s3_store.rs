//! Live S3 checks. Need AWS credentials and `NCP_TEST_BUCKET`.

use ncp_storage::client::build_client;
use ncp_storage::store::Store;

async fn live_store() -> Store {
    let bucket = std::env::var("NCP_TEST_BUCKET").expect("NCP_TEST_BUCKET must be set");
    Store::s3(build_client().await, bucket)
}

#[tokio::test]
#[ignore]
async fn put_get_delete_round_trip() {
    let store = live_store().await;
    let key = format!("tests/{}.json", uuid::Uuid::new_v4());

    store
        .put(&key, b"{\"ok\":true}".to_vec(), Some("application/json"))
        .await
        .expect("put should succeed");
    let body = store.get(&key).await.expect("get should succeed");
    assert_eq!(body, b"{\"ok\":true}");

    store.delete(&key).await.expect("delete should succeed");
    let err = store.get(&key).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
#[ignore]
async fn ping_reaches_bucket() {
    let store = live_store().await;
    store.ping().await.expect("bucket should be reachable");
    assert_eq!(store.backend_name(), "s3");
}
