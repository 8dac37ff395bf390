#![doc = "S3 implementation of the core ObjectStore contract."]
//
//! # Object store integration (CLI <-> Core)
//!
//! This module wires the [`ObjectStore`] trait of `gh-bucket-core` to Amazon S3 via
//! `aws-sdk-s3`. Credentials come from the default AWS provider chain (environment,
//! profile, instance/task role); only the region is configured explicitly.
//!
//! - Every put is an unconditional overwrite; there is no versioning or conditional write.
//! - Every put is bounded by a timeout.
//! - The body's SHA-256 is attached as `x-amz-meta-sha256` for later verification.

use async_trait::async_trait;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use gh_bucket_core::contract::ObjectStore;
use gh_bucket_core::error::PublishError;
use sha2::{Digest, Sha256};
use std::time::Duration;

pub struct S3Store {
    client: Client,
    timeout: Duration,
}

impl S3Store {
    pub async fn connect(region: &str, timeout: Duration) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.to_owned()))
            .load()
            .await;
        tracing::info!(region, ?timeout, "Initialized S3 client");
        Self {
            client: Client::new(&sdk_config),
            timeout,
        }
    }
}

pub fn content_type(key: &str) -> &'static str {
    if key.ends_with(".json") {
        "application/json"
    } else if key.ends_with(".zip") {
        "application/zip"
    } else {
        "application/octet-stream"
    }
}

pub fn sha256_hex(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    format!("{:x}", hasher.finalize())
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> Result<(), PublishError> {
        let digest = sha256_hex(&body);
        let size = body.len();
        tracing::debug!(bucket, key, size, sha256 = %digest, "Uploading object");

        let request = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type(key))
            .metadata("sha256", digest)
            .body(ByteStream::from(body))
            .send();

        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(_)) => {
                tracing::info!(bucket, key, size, "Successfully uploaded object");
                Ok(())
            }
            Ok(Err(e)) => {
                let message = DisplayErrorContext(&e).to_string();
                tracing::error!(bucket, key, error = %message, "S3 error uploading object");
                Err(PublishError::Store {
                    bucket: bucket.to_owned(),
                    key: key.to_owned(),
                    message,
                })
            }
            Err(_) => {
                tracing::error!(bucket, key, timeout = ?self.timeout, "S3 upload timed out");
                Err(PublishError::Timeout {
                    bucket: bucket.to_owned(),
                    key: key.to_owned(),
                    timeout: self.timeout,
                })
            }
        }
    }
}
