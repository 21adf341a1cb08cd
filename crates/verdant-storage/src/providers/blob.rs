//! Blob storage SaaS backend.
//!
//! The service exposes a plain REST surface (PUT/HEAD/GET/DELETE on
//! `{base_url}/{key}`) authenticated with a bearer token, and serves
//! stored objects from a permanent public URL. It has no presigning, so
//! upload credentials point at the application's own upload proxy
//! endpoint instead of the backend.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{info, warn};

use verdant_core::config::storage::BlobStorageConfig;
use verdant_core::error::{AppError, ErrorKind};
use verdant_core::result::AppResult;
use verdant_core::traits::storage::{
    expiry_timestamp, ByteStream, FileStat, StorageProvider, UploadCredential,
};

use crate::token::UploadToken;

#[derive(Debug, Deserialize)]
struct BlobUploadResponse {
    url: String,
}

/// Blob storage backend over the SaaS REST API.
#[derive(Debug, Clone)]
pub struct BlobStorageProvider {
    http: Client,
    base_url: String,
    public_base_url: String,
    token: String,
    upload_proxy_url: String,
}

impl BlobStorageProvider {
    /// Build a client from configuration.
    pub fn new(config: &BlobStorageConfig) -> AppResult<Self> {
        if config.base_url.is_empty() {
            return Err(AppError::configuration(
                "Blob storage is enabled but no base URL is configured",
            ));
        }
        if config.token.is_empty() {
            return Err(AppError::configuration(
                "Blob storage is enabled but no API token is configured",
            ));
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    "Failed to create blob storage HTTP client",
                    e,
                )
            })?;

        let public_base_url = if config.public_base_url.is_empty() {
            config.base_url.clone()
        } else {
            config.public_base_url.clone()
        };

        info!(base_url = %config.base_url, "Initialized blob storage backend");

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            upload_proxy_url: config.upload_proxy_url.clone(),
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    fn request_error(action: &str, key: &str, e: reqwest::Error) -> AppError {
        AppError::with_source(
            ErrorKind::ExternalService,
            format!("Blob store {action} failed for {key}"),
            e,
        )
    }

    fn unexpected_status(action: &str, key: &str, status: StatusCode) -> AppError {
        AppError::external_service(format!("Blob store {action} for {key} returned {status}"))
    }
}

#[async_trait]
impl StorageProvider for BlobStorageProvider {
    fn provider_type(&self) -> &'static str {
        "blob_storage"
    }

    async fn health_check(&self) -> AppResult<bool> {
        match self
            .http
            .head(&self.base_url)
            .bearer_auth(&self.token)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                warn!(error = %e, "Blob storage health check failed");
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
        let expires_at = expiry_timestamp(expires_in)?;
        let token = UploadToken::new(key, mime_type, expires_at).encode()?;

        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), mime_type.to_string());

        Ok(UploadCredential {
            url: format!("{}?token={token}", self.upload_proxy_url),
            method: "PUT".to_string(),
            headers,
            expires_at,
        })
    }

    async fn generate_download_url(&self, key: &str, _expires_in: Duration) -> AppResult<String> {
        let stat = self.verify_file_exists(key).await?;
        if !stat.exists {
            return Err(AppError::not_found(format!("Object {key} does not exist")));
        }
        // The backend has no URL signing; stored objects are served from
        // their permanent public URL.
        Ok(self.public_url(key))
    }

    async fn verify_file_exists(&self, key: &str) -> AppResult<FileStat> {
        let response = self
            .http
            .head(self.object_url(key))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Self::request_error("stat", key, e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(FileStat::missing()),
            status if status.is_success() => {
                let headers = response.headers();
                let size = headers
                    .get(reqwest::header::CONTENT_LENGTH)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok());
                let etag = headers
                    .get(reqwest::header::ETAG)
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v.trim_matches('"').to_string());
                let mime_type = headers
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                Ok(FileStat {
                    exists: true,
                    size,
                    etag,
                    mime_type,
                })
            }
            status => Err(Self::unexpected_status("stat", key, status)),
        }
    }

    async fn delete_file(&self, key: &str) -> AppResult<()> {
        let response = self
            .http
            .delete(self.object_url(key))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Self::request_error("delete", key, e))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                Err(AppError::not_found(format!("Object {key} does not exist")))
            }
            status if status.is_success() => {
                info!(key = %key, "Deleted blob");
                Ok(())
            }
            status => Err(Self::unexpected_status("delete", key, status)),
        }
    }

    async fn copy_file(&self, from: &str, to: &str) -> AppResult<()> {
        let url = format!(
            "{}?from={}",
            self.object_url(to),
            urlencoding::encode(from)
        );
        let response = self
            .http
            .put(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Self::request_error("copy", from, e))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                Err(AppError::not_found(format!("Object {from} does not exist")))
            }
            status if status.is_success() => {
                info!(from = %from, to = %to, "Copied blob");
                Ok(())
            }
            status => Err(Self::unexpected_status("copy", from, status)),
        }
    }

    async fn get_file_stream(&self, key: &str) -> AppResult<ByteStream> {
        let response = self
            .http
            .get(self.object_url(key))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| Self::request_error("read", key, e))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                Err(AppError::not_found(format!("Object {key} does not exist")))
            }
            status if status.is_success() => {
                let stream = response
                    .bytes_stream()
                    .map(|chunk| chunk.map_err(std::io::Error::other));
                Ok(Box::pin(stream))
            }
            status => Err(Self::unexpected_status("read", key, status)),
        }
    }

    async fn upload_file(&self, key: &str, data: Bytes, mime_type: &str) -> AppResult<String> {
        let size = data.len();
        let response = self
            .http
            .put(self.object_url(key))
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, mime_type)
            .body(data)
            .send()
            .await
            .map_err(|e| Self::request_error("upload", key, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::unexpected_status("upload", key, status));
        }

        let parsed: BlobUploadResponse = response.json().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ExternalService,
                format!("Blob store returned an unexpected upload response for {key}"),
                e,
            )
        })?;

        info!(key = %key, size_bytes = size, "Uploaded blob");
        Ok(parsed.url)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}
