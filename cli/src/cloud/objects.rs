//! Object storage API extensions for CloudClient

use cloud_api::models::storage::SetBucketAclRequest;
use reqwest::header;

use crate::cloud::client::CloudClient;
use crate::errors::SkyliftError;

/// Per-object headers applied on upload
#[derive(Debug, Clone)]
pub struct PutObjectOptions {
    /// MIME type of the object
    pub content_type: String,

    /// Cache-Control header served with the object
    pub cache_control: String,

    /// Expires header served with the object
    pub expires: String,

    /// Content-Encoding header, for pre-compressed objects
    pub content_encoding: Option<String>,
}

impl CloudClient {
    /// Create a bucket if it does not already exist
    pub async fn ensure_bucket(&self, bucket: &str) -> Result<(), SkyliftError> {
        let _: serde_json::Value = self
            .put(&format!("/storage/buckets/{}", bucket), &serde_json::json!({}))
            .await?;
        Ok(())
    }

    /// Mark every object in a bucket world readable
    pub async fn set_bucket_public(&self, bucket: &str) -> Result<(), SkyliftError> {
        let request = SetBucketAclRequest {
            acl: "public-read".to_string(),
        };
        let _: serde_json::Value = self
            .put(&format!("/storage/buckets/{}/acl", bucket), &request)
            .await?;
        Ok(())
    }

    /// Upload an object under the given key
    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        options: &PutObjectOptions,
    ) -> Result<(), SkyliftError> {
        let mut headers = vec![
            (header::CONTENT_TYPE, options.content_type.clone()),
            (header::CACHE_CONTROL, options.cache_control.clone()),
            (header::EXPIRES, options.expires.clone()),
        ];
        if let Some(encoding) = &options.content_encoding {
            headers.push((header::CONTENT_ENCODING, encoding.clone()));
        }

        self.put_bytes(
            &format!("/storage/buckets/{}/objects/{}", bucket, key),
            body,
            &headers,
        )
        .await
    }
}
