//! File lifecycle: upload provisioning, completion, download, deletion.

use std::time::Duration;

use bytes::Bytes;
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use verdant_core::config::storage::StorageConfig;
use verdant_core::error::{AppError, ErrorKind};
use verdant_core::result::AppResult;
use verdant_core::traits::storage::{ByteStream, UploadCredential};
use verdant_database::repositories::{ContentRepository, FilePayloadRepository};
use verdant_entity::audit::action::AuditAction;
use verdant_entity::content::model::CreateContentNode;
use verdant_entity::content::{ContentKind, ContentNode};
use verdant_entity::file::model::CreateFilePayload;
use verdant_entity::file::{EXTERNAL_PROVIDERS_KEY, FilePayload};
use verdant_storage::{ProviderRegistry, UploadToken};

use crate::audit::AuditService;
use crate::content::{ContentService, PathService};
use crate::context::RequestContext;
use crate::file::thumbnail::generate_thumbnail;

/// External provider sub-key cleared by the maintenance call.
const GOOGLE_DRIVE_PROVIDER: &str = "googleDrive";

/// Longest sanitized file name kept in a storage key.
const MAX_FILE_NAME_LENGTH: usize = 120;

/// Request to provision a file upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFileUpload {
    /// Parent node (None for root level).
    pub parent_id: Option<Uuid>,
    /// Original file name; also becomes the node title.
    pub file_name: String,
    /// MIME type the client declares for the bytes.
    pub mime_type: String,
    /// Declared size in bytes.
    pub file_size: i64,
}

/// A provisioned upload: the node, its pending payload, and the
/// credential the client sends the bytes with.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedUpload {
    /// The file node, already placed in the tree.
    pub node: ContentNode,
    /// The payload row, still `pending`.
    pub payload: FilePayload,
    /// Where and how to send the bytes.
    pub credential: UploadCredential,
}

/// Manages file nodes and their stored bytes.
///
/// Tree placement is delegated to [`ContentService`]; this service owns
/// everything that touches a storage backend.
#[derive(Debug, Clone)]
pub struct FileService {
    content_service: ContentService,
    content: ContentRepository,
    files: FilePayloadRepository,
    paths: PathService,
    registry: ProviderRegistry,
    audit: AuditService,
    config: StorageConfig,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(
        content_service: ContentService,
        content: ContentRepository,
        files: FilePayloadRepository,
        paths: PathService,
        registry: ProviderRegistry,
        audit: AuditService,
        config: StorageConfig,
    ) -> Self {
        Self {
            content_service,
            content,
            files,
            paths,
            registry,
            audit,
            config,
        }
    }

    /// Provisions an upload: creates a file node with a pending payload
    /// and returns an upload credential for the default backend.
    ///
    /// The bytes are not trusted until `complete_upload` verifies them
    /// against the backend.
    pub async fn create_upload(
        &self,
        ctx: &RequestContext,
        req: CreateFileUpload,
    ) -> AppResult<CreatedUpload> {
        ctx.require_writer()?;

        let file_name = req.file_name.trim();
        if file_name.is_empty() {
            return Err(AppError::validation("File name cannot be empty"));
        }
        let mime_type = req.mime_type.trim();
        if mime_type.is_empty() {
            return Err(AppError::validation("MIME type cannot be empty"));
        }
        if req.file_size <= 0 {
            return Err(AppError::validation("File size must be positive"));
        }
        if req.file_size as u64 > self.config.max_upload_size_bytes {
            return Err(AppError::limit(format!(
                "File exceeds the maximum upload size of {} bytes",
                self.config.max_upload_size_bytes
            )));
        }

        if let Some(parent_id) = req.parent_id {
            let parent = self.content_service.owned_live_node(ctx, parent_id).await?;
            if !parent.kind.can_have_children() {
                return Err(AppError::validation("File nodes cannot have children"));
            }
        }

        let slug = self
            .content_service
            .generate_unique_slug(file_name, ctx.user_id, None)
            .await?;
        let display_order = self
            .content
            .next_display_order(ctx.user_id, req.parent_id)
            .await?;
        let computed = self.paths.compute_child_path(req.parent_id, &slug).await?;

        // Keys are scoped by a fresh upload id, never reused, so a
        // re-uploaded name cannot collide with an old object.
        let upload_id = Uuid::new_v4();
        let storage_key = format!("files/{upload_id}/{}", sanitize_file_name(file_name));

        let provider_kind = self.registry.default_kind();
        let provider = self.registry.get_default()?;

        let (node, payload) = self
            .files
            .create_with_node(
                &CreateContentNode {
                    owner_id: ctx.user_id,
                    parent_id: req.parent_id,
                    kind: ContentKind::File,
                    title: file_name.to_string(),
                    slug,
                    display_order,
                    body: None,
                },
                &CreateFilePayload {
                    storage_provider: provider_kind,
                    storage_key: storage_key.clone(),
                    mime_type: mime_type.to_string(),
                    file_size: req.file_size,
                },
                &computed.path,
                &computed.segments,
                computed.depth,
            )
            .await?;

        let credential = provider
            .generate_upload_url(
                &storage_key,
                mime_type,
                Duration::from_secs(self.config.upload_url_ttl_seconds),
            )
            .await?;

        info!(
            user_id = %ctx.user_id,
            node_id = %node.id,
            provider = %provider_kind,
            key = %storage_key,
            size = req.file_size,
            "File upload provisioned"
        );

        Ok(CreatedUpload {
            node,
            payload,
            credential,
        })
    }

    /// Accepts proxied upload bytes for backends without presigned PUTs.
    ///
    /// Unauthenticated by design: the token is the capability, and every
    /// claim in it is re-checked against the pending payload row before
    /// any byte reaches the backend.
    pub async fn proxy_upload(&self, raw_token: &str, data: Bytes) -> AppResult<String> {
        let token = UploadToken::decode(raw_token)?;
        if token.is_expired() {
            return Err(AppError::unauthorized("Upload token has expired"));
        }

        let payload = self
            .files
            .find_by_storage_key(&token.key)
            .await?
            .ok_or_else(|| AppError::not_found("No pending upload for this token"))?;
        if payload.is_ready() {
            return Err(AppError::validation("Upload already completed"));
        }
        if token.mime_type != payload.mime_type {
            return Err(AppError::validation(
                "Upload token does not match the pending upload",
            ));
        }
        if data.is_empty() {
            return Err(AppError::validation("Upload body is empty"));
        }
        if data.len() as u64 > self.config.max_upload_size_bytes {
            return Err(AppError::limit(format!(
                "File exceeds the maximum upload size of {} bytes",
                self.config.max_upload_size_bytes
            )));
        }

        let provider = self.registry.get(payload.storage_provider)?;
        let url = provider
            .upload_file(&payload.storage_key, data, &payload.mime_type)
            .await?;

        info!(key = %payload.storage_key, "Proxied upload stored");

        Ok(url)
    }

    /// Completes an upload: verifies the bytes exist on the backend,
    /// marks the payload ready with the size the backend reports, and
    /// attaches a thumbnail for images.
    ///
    /// Idempotent: completing an already-ready payload returns it as is.
    pub async fn complete_upload(
        &self,
        ctx: &RequestContext,
        content_id: Uuid,
    ) -> AppResult<FilePayload> {
        ctx.require_writer()?;

        let payload = self.owned_file_payload(ctx, content_id).await?;
        if payload.is_ready() {
            return Ok(payload);
        }

        let provider = self.registry.get(payload.storage_provider)?;
        let stat = provider.verify_file_exists(&payload.storage_key).await?;
        if !stat.exists {
            return Err(AppError::validation("No uploaded bytes found for this file"));
        }

        let file_size = stat.size.map(|s| s as i64).unwrap_or(payload.file_size);
        let mut ready = self.files.mark_ready(payload.id, file_size).await?;

        if ready.is_image() {
            // Best effort: a failed thumbnail never fails the upload.
            match self.attach_thumbnail(&ready).await {
                Ok(with_thumbnail) => ready = with_thumbnail,
                Err(e) => {
                    warn!(
                        node_id = %content_id,
                        error = %e,
                        "Thumbnail generation failed"
                    );
                }
            }
        }

        info!(
            user_id = %ctx.user_id,
            node_id = %content_id,
            size = ready.file_size,
            "File upload completed"
        );

        Ok(ready)
    }

    /// Returns a time-limited download URL for a ready file.
    pub async fn download_url(&self, ctx: &RequestContext, content_id: Uuid) -> AppResult<String> {
        let payload = self.owned_file_payload(ctx, content_id).await?;
        if !payload.is_ready() {
            return Err(AppError::validation("File is not ready for download"));
        }

        let provider = self.registry.get(payload.storage_provider)?;
        provider
            .generate_download_url(
                &payload.storage_key,
                Duration::from_secs(self.config.download_url_ttl_seconds),
            )
            .await
    }

    /// Opens a ready file as a byte stream, with its payload for
    /// response headers.
    pub async fn stream_file(
        &self,
        ctx: &RequestContext,
        content_id: Uuid,
    ) -> AppResult<(FilePayload, ByteStream)> {
        let payload = self.owned_file_payload(ctx, content_id).await?;
        if !payload.is_ready() {
            return Err(AppError::validation("File is not ready for download"));
        }

        let provider = self.registry.get(payload.storage_provider)?;
        let stream = provider.get_file_stream(&payload.storage_key).await?;
        Ok((payload, stream))
    }

    /// The payload backing a file node.
    pub async fn payload_for(
        &self,
        ctx: &RequestContext,
        content_id: Uuid,
    ) -> AppResult<FilePayload> {
        self.owned_file_payload(ctx, content_id).await
    }

    /// Soft-deletes a file node after releasing its stored bytes.
    ///
    /// Backend deletes tolerate a missing key, so retrying after a
    /// partial failure converges.
    pub async fn delete_file(&self, ctx: &RequestContext, content_id: Uuid) -> AppResult<u64> {
        ctx.require_writer()?;

        let node = self.content_service.owned_live_node(ctx, content_id).await?;
        if node.kind != ContentKind::File {
            return Err(AppError::validation("Content node is not a file"));
        }

        if let Some(payload) = self.files.find_by_content_id(content_id).await? {
            self.release_stored_bytes(&payload).await?;
        }

        self.content_service.delete(ctx, content_id).await
    }

    /// Permanently removes a trashed subtree: releases every payload's
    /// stored bytes, then hard-deletes the rows.
    pub async fn purge_trashed(&self, ctx: &RequestContext, content_id: Uuid) -> AppResult<u64> {
        ctx.require_writer()?;

        let node = self
            .content
            .find_by_id(content_id)
            .await?
            .ok_or_else(|| AppError::not_found("Content node not found"))?;
        if node.owner_id != ctx.user_id {
            return Err(AppError::forbidden("You do not own this content"));
        }
        if node.deleted_at.is_none() {
            return Err(AppError::validation("Only trashed content can be purged"));
        }

        let payloads = self.files.find_in_subtree(content_id).await?;
        for payload in &payloads {
            self.release_stored_bytes(payload).await?;
        }

        if !self.content.hard_delete(content_id).await? {
            return Err(AppError::not_found("Content node not found"));
        }

        self.audit
            .record(
                ctx,
                AuditAction::ContentDelete,
                None,
                Some(content_id),
                Some(serde_json::json!({
                    "purged": true,
                    "payloads": payloads.len(),
                })),
            )
            .await?;
        info!(
            user_id = %ctx.user_id,
            node_id = %content_id,
            payloads = payloads.len(),
            "Trashed subtree purged"
        );

        Ok(payloads.len() as u64)
    }

    /// Removes the legacy Google Drive link from a file's metadata.
    ///
    /// Idempotent: a payload without the link is returned unchanged.
    pub async fn clear_external_link(
        &self,
        ctx: &RequestContext,
        content_id: Uuid,
    ) -> AppResult<FilePayload> {
        ctx.require_writer()?;

        let payload = self.owned_file_payload(ctx, content_id).await?;

        let mut metadata = payload.storage_metadata.clone();
        let (removed, providers_empty) = match metadata
            .get_mut(EXTERNAL_PROVIDERS_KEY)
            .and_then(|v| v.as_object_mut())
        {
            Some(providers) => (
                providers.remove(GOOGLE_DRIVE_PROVIDER).is_some(),
                providers.is_empty(),
            ),
            None => (false, false),
        };
        if !removed {
            return Ok(payload);
        }
        if providers_empty {
            if let Some(map) = metadata.as_object_mut() {
                map.remove(EXTERNAL_PROVIDERS_KEY);
            }
        }

        let updated = self.files.update_metadata(payload.id, &metadata).await?;

        self.audit
            .record(ctx, AuditAction::ClearExternalLink, None, Some(content_id), None)
            .await?;
        info!(user_id = %ctx.user_id, node_id = %content_id, "External link cleared");

        Ok(updated)
    }

    /// Fetches the payload for a live, owned file node.
    async fn owned_file_payload(
        &self,
        ctx: &RequestContext,
        content_id: Uuid,
    ) -> AppResult<FilePayload> {
        let node = self.content_service.owned_live_node(ctx, content_id).await?;
        if node.kind != ContentKind::File {
            return Err(AppError::validation("Content node is not a file"));
        }
        self.files
            .find_by_content_id(content_id)
            .await?
            .ok_or_else(|| AppError::not_found("File payload not found"))
    }

    /// Generates a JPEG thumbnail for an image payload and records its
    /// key and URL in the payload metadata.
    async fn attach_thumbnail(&self, payload: &FilePayload) -> AppResult<FilePayload> {
        let provider = self.registry.get(payload.storage_provider)?;

        let mut stream = provider.get_file_stream(&payload.storage_key).await?;
        let mut data = Vec::new();
        while let Some(chunk) = stream.try_next().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to read stored file", e)
        })? {
            data.extend_from_slice(&chunk);
        }

        let dimension = self.config.thumbnail_max_dimension;
        let thumbnail = generate_thumbnail(Bytes::from(data), dimension).await?;

        let thumbnail_key = format!("thumbs/{}/{dimension}.jpg", payload.content_id);
        let url = provider
            .upload_file(&thumbnail_key, thumbnail, "image/jpeg")
            .await?;

        let mut metadata = if payload.storage_metadata.is_object() {
            payload.storage_metadata.clone()
        } else {
            serde_json::json!({})
        };
        metadata["thumbnail"] = serde_json::json!({
            "key": thumbnail_key,
            "url": url,
        });

        self.files.update_metadata(payload.id, &metadata).await
    }

    /// Deletes a payload's object and its thumbnail from the backend,
    /// tolerating keys that are already gone.
    async fn release_stored_bytes(&self, payload: &FilePayload) -> AppResult<()> {
        let provider = self.registry.get(payload.storage_provider)?;

        match provider.delete_file(&payload.storage_key).await {
            Ok(()) => {}
            Err(e) if e.kind == ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        let thumbnail_key = payload
            .storage_metadata
            .pointer("/thumbnail/key")
            .and_then(|v| v.as_str());
        if let Some(key) = thumbnail_key {
            match provider.delete_file(key).await {
                Ok(()) => {}
                Err(e) if e.kind == ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }
}

/// Reduces an untrusted file name to a safe storage key component.
///
/// Takes the last path component, keeps ASCII alphanumerics plus `.`,
/// `-` and `_`, replaces everything else with `_`, and strips leading
/// dots so the result can never be a dotfile or traversal.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name);

    let mut sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    while sanitized.starts_with('.') {
        sanitized.remove(0);
    }
    sanitized.truncate(MAX_FILE_NAME_LENGTH);

    if sanitized.is_empty() {
        "file".to_string()
    } else {
        sanitized
    }
}
