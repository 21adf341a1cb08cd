//! S3-compatible object storage backend.
//!
//! Works against AWS S3 proper and path-style compatibles such as MinIO.
//! Upload credentials are true presigned PUT URLs, so clients talk to the
//! bucket directly and the application never proxies file bytes.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::retry::{RetryConfig, RetryMode};
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

use verdant_core::config::storage::ObjectStorageConfig;
use verdant_core::error::{AppError, ErrorKind};
use verdant_core::result::AppResult;
use verdant_core::traits::storage::{
    expiry_timestamp, ByteStream, FileStat, StorageProvider, UploadCredential,
};

/// Object storage backend over the AWS S3 API.
#[derive(Debug, Clone)]
pub struct ObjectStorageProvider {
    client: Client,
    bucket: String,
    region: String,
    endpoint_url: Option<String>,
    artifact_url_ttl: Duration,
}

impl ObjectStorageProvider {
    /// Build a client from configuration.
    ///
    /// With explicit access keys a static credentials provider is used;
    /// without them the ambient AWS chain (env, profile, instance role)
    /// applies. A custom endpoint switches to path-style addressing,
    /// which MinIO and most compatibles require.
    pub async fn new(
        config: &ObjectStorageConfig,
        artifact_url_ttl: Duration,
    ) -> AppResult<Self> {
        if config.bucket.is_empty() {
            return Err(AppError::configuration(
                "Object storage is enabled but no bucket is configured",
            ));
        }

        let endpoint_url = if config.endpoint.is_empty() {
            None
        } else {
            Some(config.endpoint.clone())
        };

        let retry_config = RetryConfig::standard()
            .with_max_attempts(5)
            .with_retry_mode(RetryMode::Adaptive);

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .retry_config(retry_config);

        if config.access_key.is_empty() {
            let ambient = aws_config::defaults(BehaviorVersion::latest()).load().await;
            if let Some(provider) = ambient.credentials_provider() {
                builder = builder.credentials_provider(provider);
            }
        } else {
            let credentials = Credentials::new(
                config.access_key.clone(),
                config.secret_key.clone(),
                None,
                None,
                "verdant-config",
            );
            builder = builder.credentials_provider(credentials);
        }

        if let Some(ref endpoint) = endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let client = Client::from_conf(builder.build());

        info!(
            bucket = %config.bucket,
            region = %config.region,
            endpoint = endpoint_url.as_deref().unwrap_or("aws"),
            "Initialized object storage backend"
        );

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            endpoint_url,
            artifact_url_ttl,
        })
    }

    fn presigning_config(expires_in: Duration) -> AppResult<PresigningConfig> {
        PresigningConfig::builder()
            .expires_in(expires_in)
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Invalid presigning duration", e)
            })
    }
}

#[async_trait]
impl StorageProvider for ObjectStorageProvider {
    fn provider_type(&self) -> &'static str {
        "object_storage"
    }

    async fn health_check(&self) -> AppResult<bool> {
        match self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!(bucket = %self.bucket, error = %e, "Object storage health check failed");
                Ok(false)
            }
        }
    }

    async fn generate_upload_url(
        &self,
        key: &str,
        mime_type: &str,
        expires_in: Duration,
    ) -> AppResult<UploadCredential> {
        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(mime_type)
            .presigned(Self::presigning_config(expires_in)?)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to presign upload for {key}"),
                    e,
                )
            })?;

        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), mime_type.to_string());

        Ok(UploadCredential {
            url: presigned.uri().to_string(),
            method: "PUT".to_string(),
            headers,
            expires_at: expiry_timestamp(expires_in)?,
        })
    }

    async fn generate_download_url(&self, key: &str, expires_in: Duration) -> AppResult<String> {
        let stat = self.verify_file_exists(key).await?;
        if !stat.exists {
            return Err(AppError::not_found(format!("Object {key} does not exist")));
        }

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(Self::presigning_config(expires_in)?)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to presign download for {key}"),
                    e,
                )
            })?;

        Ok(presigned.uri().to_string())
    }

    async fn verify_file_exists(&self, key: &str) -> AppResult<FileStat> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(head) => Ok(FileStat {
                exists: true,
                size: head.content_length().map(|len| len as u64),
                etag: head.e_tag().map(|t| t.trim_matches('"').to_string()),
                mime_type: head.content_type().map(str::to_string),
            }),
            Err(e) => match &e {
                SdkError::ServiceError(service_err) => match service_err.err() {
                    HeadObjectError::NotFound(_) => Ok(FileStat::missing()),
                    _ => Err(AppError::with_source(
                        ErrorKind::Storage,
                        format!("Failed to stat object {key}"),
                        e,
                    )),
                },
                _ => Err(AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to stat object {key}"),
                    e,
                )),
            },
        }
    }

    async fn delete_file(&self, key: &str) -> AppResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to delete object {key}"),
                    e,
                )
            })?;

        info!(bucket = %self.bucket, key = %key, "Deleted object");
        Ok(())
    }

    async fn copy_file(&self, from: &str, to: &str) -> AppResult<()> {
        // The copy source must be URL-encoded per the S3 API.
        let copy_source = format!("{}/{}", self.bucket, urlencoding::encode(from));

        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(&copy_source)
            .key(to)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to copy object {from} to {to}"),
                    e,
                )
            })?;

        info!(bucket = %self.bucket, from = %from, to = %to, "Copied object");
        Ok(())
    }

    async fn get_file_stream(&self, key: &str) -> AppResult<ByteStream> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match &e {
                SdkError::ServiceError(service_err)
                    if matches!(service_err.err(), GetObjectError::NoSuchKey(_)) =>
                {
                    AppError::not_found(format!("Object {key} does not exist"))
                }
                _ => AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read object {key}"),
                    e,
                ),
            })?;

        Ok(Box::pin(ReaderStream::new(response.body.into_async_read())))
    }

    async fn upload_file(&self, key: &str, data: Bytes, mime_type: &str) -> AppResult<String> {
        let size = data.len();
        let body = aws_sdk_s3::primitives::ByteStream::from(data);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(mime_type)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to upload object {key}"),
                    e,
                )
            })?;

        info!(bucket = %self.bucket, key = %key, size_bytes = size, "Uploaded object");

        // The bucket is private, so hand back a signed read URL with the
        // long artifact lifetime instead of a public one.
        self.generate_download_url(key, self.artifact_url_ttl).await
    }

    fn public_url(&self, key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            )
        }
    }
}
