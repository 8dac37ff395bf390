// Round trip against a real bucket. Runs only when GBAAS_TEST_BUCKET and
// GBAAS_TEST_REGION are set (e.g. via .env) and AWS credentials are available.

use gh_bucket::upload::S3Store;
use gh_bucket_core::contract::ObjectStore;
use std::time::Duration;

fn test_bucket() -> Option<(String, String)> {
    dotenvy::dotenv().ok();
    match (
        std::env::var("GBAAS_TEST_BUCKET"),
        std::env::var("GBAAS_TEST_REGION"),
    ) {
        (Ok(bucket), Ok(region)) => Some((bucket, region)),
        _ => None,
    }
}

#[tokio::test]
async fn test_put_object_overwrites_existing_key() {
    let Some((bucket, region)) = test_bucket() else {
        eprintln!("GBAAS_TEST_BUCKET/GBAAS_TEST_REGION not set, skipping");
        return;
    };
    let store = S3Store::connect(&region, Duration::from_secs(60)).await;
    let key = format!("test/{}.json", std::process::id());

    for body in [b"[1]".to_vec(), b"[2]".to_vec()] {
        let result = store.put_object(&bucket, &key, body).await;
        assert!(
            result.is_ok(),
            "Expected successful put, but got error: {:?}",
            result.err()
        );
    }
}
