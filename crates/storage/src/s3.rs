//! S3-backed blob store.

use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;

use crate::{BlobStore, StorageError};

/// Blob store backed by a single S3 bucket.
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3BlobStore {
    /// Create a store from an already-configured S3 client.
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Create a store using ambient AWS configuration (environment,
    /// profile, or instance role).
    pub async fn from_env(bucket: impl Into<String>) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;
        Self::new(aws_sdk_s3::Client::new(&config), bucket)
    }
}

#[async_trait::async_trait]
impl BlobStore for S3BlobStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("put {key}: {e}")))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match &e {
                SdkError::ServiceError(ctx) if ctx.err().is_no_such_key() => {
                    StorageError::NotFound(key.to_string())
                }
                _ => StorageError::Backend(format!("get {key}: {e}")),
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Backend(format!("get {key}: {e}")))?;
        Ok(data.into_bytes().to_vec())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                if let Some(service_err) = err.as_service_error() {
                    if service_err.is_not_found() {
                        return Ok(false);
                    }
                }
                // HEAD on a missing key surfaces as 403 when the caller
                // lacks ListBucket; treat it as absent, like 404.
                if let SdkError::ServiceError(ctx) = &err {
                    if ctx.raw().status().as_u16() == 403 {
                        return Ok(false);
                    }
                }
                Err(StorageError::Backend(format!("head {key}: {err}")))
            }
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://{}.s3.amazonaws.com/{}", self.bucket, key)
    }
}
