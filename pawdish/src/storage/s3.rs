//! S3-compatible bucket backend (Cloudflare R2, AWS S3, MinIO).

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::{Client, primitives::ByteStream};
use bytes::Bytes;

use super::{ObjectStorage, Result, StorageError, join_url, validate_key};
use crate::config::StorageBackendConfig;

pub struct S3Storage {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3Storage {
    pub fn new(client: Client, bucket: String, public_base_url: String) -> Self {
        Self {
            client,
            bucket,
            public_base_url,
        }
    }

    /// Build a client from the `s3` storage config. Static credentials are used when both halves
    /// are configured, otherwise the default AWS credential chain.
    pub async fn from_config(config: &StorageBackendConfig) -> Result<Self> {
        let StorageBackendConfig::S3 {
            bucket,
            endpoint,
            region,
            access_key_id,
            secret_access_key,
            public_base_url,
        } = config
        else {
            return Err(StorageError::Backend("not an s3 storage config".to_string()));
        };

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.clone()));
        if let (Some(key_id), Some(secret)) = (access_key_id, secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(key_id, secret, None, None, "pawdish-config"));
        }
        let shared = loader.load().await;

        let mut s3_config = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = endpoint {
            // R2 and MinIO address buckets by path, not by subdomain
            s3_config = s3_config.endpoint_url(endpoint).force_path_style(true);
        }

        tracing::info!(bucket = %bucket, endpoint = ?endpoint, "Using S3-compatible object storage");
        Ok(Self::new(
            Client::from_conf(s3_config.build()),
            bucket.clone(),
            public_base_url.clone(),
        ))
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<()> {
        validate_key(key)?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("put {key}: {}", aws_sdk_s3::error::DisplayErrorContext(&e))))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("delete {key}: {}", aws_sdk_s3::error::DisplayErrorContext(&e))))?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.public_base_url, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    async fn storage(server: &MockServer) -> S3Storage {
        S3Storage::from_config(&StorageBackendConfig::S3 {
            bucket: "media".to_string(),
            endpoint: Some(server.uri()),
            region: "auto".to_string(),
            access_key_id: Some("test-key".to_string()),
            secret_access_key: Some("test-secret".to_string()),
            public_base_url: "https://media.example.com".to_string(),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_put_uses_path_style_bucket_and_content_type() {
        crate::http::install_crypto_provider();
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/media/recipes/2026/01/a.jpg"))
            .and(header("content-type", "image/jpeg"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let storage = storage(&server).await;
        storage
            .put("recipes/2026/01/a.jpg", Bytes::from_static(b"jpeg"), "image/jpeg")
            .await
            .unwrap();
        assert_eq!(
            storage.public_url("recipes/2026/01/a.jpg"),
            "https://media.example.com/recipes/2026/01/a.jpg"
        );
    }

    #[tokio::test]
    async fn test_backend_failures_become_backend_errors() {
        crate::http::install_crypto_provider();
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(403).set_body_string(
                "<Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>",
            ))
            .mount(&server)
            .await;

        let err = storage(&server).await.delete("uploads/x.jpg").await.unwrap_err();
        assert!(matches!(err, StorageError::Backend(_)));
    }
}
