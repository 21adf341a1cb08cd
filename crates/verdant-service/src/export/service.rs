//! Vault export assembly.
//!
//! The archive mirrors the garden's materialized paths: note bodies as
//! `{path}.json`, file bytes at `{path}` with the original extension,
//! and a `manifest.json` at the root. Everything is assembled in memory;
//! a garden is bounded by its owner's uploads, not by other tenants.

use std::io::{Cursor, Write};

use chrono::Utc;
use futures::TryStreamExt;
use tracing::{info, warn};
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

use verdant_core::error::{AppError, ErrorKind};
use verdant_core::result::AppResult;
use verdant_database::repositories::{ContentRepository, FilePayloadRepository, PathRepository};
use verdant_entity::audit::action::AuditAction;
use verdant_entity::content::{ContentKind, ContentNode};
use verdant_entity::file::StorageProviderKind;
use verdant_entity::settings::ExportSettings;
use verdant_storage::ProviderRegistry;

use crate::audit::AuditService;
use crate::context::RequestContext;
use crate::settings::SettingsService;

/// A finished export archive.
#[derive(Debug, Clone)]
pub struct VaultArchive {
    /// Suggested download file name.
    pub file_name: String,
    /// The ZIP bytes.
    pub data: Vec<u8>,
}

/// Builds vault exports.
#[derive(Debug, Clone)]
pub struct ExportService {
    content: ContentRepository,
    files: FilePayloadRepository,
    paths: PathRepository,
    registry: ProviderRegistry,
    settings: SettingsService,
    audit: AuditService,
}

impl ExportService {
    /// Creates a new export service.
    pub fn new(
        content: ContentRepository,
        files: FilePayloadRepository,
        paths: PathRepository,
        registry: ProviderRegistry,
        settings: SettingsService,
        audit: AuditService,
    ) -> Self {
        Self {
            content,
            files,
            paths,
            registry,
            settings,
            audit,
        }
    }

    /// Exports the acting user's garden per their export settings.
    ///
    /// Trashed nodes land under a `trash/` prefix when included. A
    /// trashed file whose bytes are already gone from the backend is
    /// skipped with a warning; for live files a backend failure aborts
    /// the export.
    pub async fn export_vault(&self, ctx: &RequestContext) -> AppResult<VaultArchive> {
        let prefs = self.settings.get(ctx).await?.export;

        let mut entries: Vec<(String, Vec<u8>)> = Vec::new();
        let mut note_count = 0usize;
        let mut file_count = 0usize;
        let mut trashed_count = 0usize;

        let live = self.content.find_live_by_owner(ctx.user_id).await?;
        for node in &live {
            if let Some(entry) = self.node_entry(node, "", &prefs, false).await? {
                match node.kind {
                    ContentKind::Note => note_count += 1,
                    ContentKind::File => file_count += 1,
                    ContentKind::Folder => {}
                }
                entries.push(entry);
            }
        }

        if prefs.include_deleted {
            let trashed = self.content.find_deleted(ctx.user_id).await?;
            for node in &trashed {
                if let Some(entry) = self.node_entry(node, "trash/", &prefs, true).await? {
                    trashed_count += 1;
                    entries.push(entry);
                }
            }
        }

        let manifest = serde_json::json!({
            "exportedAt": Utc::now().to_rfc3339(),
            "username": ctx.username,
            "notes": note_count,
            "files": file_count,
            "trashed": trashed_count,
            "includeFiles": prefs.include_files,
            "includeDeleted": prefs.include_deleted,
        });
        entries.push((
            "manifest.json".to_string(),
            serde_json::to_vec_pretty(&manifest)?,
        ));

        let data = build_archive(&entries)?;
        let file_name = format!("verdant-export-{}.zip", Utc::now().format("%Y-%m-%d"));

        self.audit
            .record(
                ctx,
                AuditAction::VaultExport,
                None,
                None,
                Some(serde_json::json!({
                    "notes": note_count,
                    "files": file_count,
                    "trashed": trashed_count,
                })),
            )
            .await?;
        info!(
            user_id = %ctx.user_id,
            notes = note_count,
            files = file_count,
            trashed = trashed_count,
            bytes = data.len(),
            "Vault exported"
        );

        Ok(VaultArchive { file_name, data })
    }

    /// Builds the archive entry for one node, or `None` for kinds and
    /// states that do not export (folders, pending uploads, files when
    /// file export is off).
    async fn node_entry(
        &self,
        node: &ContentNode,
        prefix: &str,
        prefs: &ExportSettings,
        tolerate_missing_bytes: bool,
    ) -> AppResult<Option<(String, Vec<u8>)>> {
        let path = match self.paths.find_by_content_id(node.id).await? {
            Some(row) => row.path,
            // The cache row should exist; fall back to the bare slug
            // rather than dropping the node from the archive.
            None => node.slug.clone(),
        };

        match node.kind {
            ContentKind::Folder => Ok(None),
            ContentKind::Note => {
                let body = node.body.clone().unwrap_or(serde_json::Value::Null);
                let entry_name = format!("{prefix}{path}.json");
                Ok(Some((entry_name, serde_json::to_vec_pretty(&body)?)))
            }
            ContentKind::File => {
                if !prefs.include_files {
                    return Ok(None);
                }
                let Some(payload) = self.files.find_by_content_id(node.id).await? else {
                    return Ok(None);
                };
                if !payload.is_ready() {
                    return Ok(None);
                }

                let bytes = match self
                    .read_payload(payload.storage_provider, &payload.storage_key)
                    .await
                {
                    Ok(bytes) => bytes,
                    Err(e) if tolerate_missing_bytes => {
                        warn!(
                            node_id = %node.id,
                            key = %payload.storage_key,
                            error = %e,
                            "Skipping trashed file with unreadable bytes"
                        );
                        return Ok(None);
                    }
                    Err(e) => return Err(e),
                };

                let entry_name = format!("{prefix}{}", file_entry_name(&path, &payload.storage_key));
                Ok(Some((entry_name, bytes)))
            }
        }
    }

    /// Reads a stored object fully into memory.
    async fn read_payload(
        &self,
        provider_kind: StorageProviderKind,
        key: &str,
    ) -> AppResult<Vec<u8>> {
        let provider = self.registry.get(provider_kind)?;
        let mut stream = provider.get_file_stream(key).await?;
        let mut data = Vec::new();
        while let Some(chunk) = stream.try_next().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to read stored file", e)
        })? {
            data.extend_from_slice(&chunk);
        }
        Ok(data)
    }
}

/// Appends the original file extension from the storage key to the
/// node's materialized path, so exported files open with the right
/// application.
fn file_entry_name(path: &str, storage_key: &str) -> String {
    let key_file_name = storage_key.rsplit('/').next().unwrap_or(storage_key);
    match key_file_name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!("{path}.{ext}"),
        _ => path.to_string(),
    }
}

/// Writes entries into a deflated in-memory ZIP archive.
fn build_archive(entries: &[(String, Vec<u8>)]) -> AppResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, data) in entries {
        writer.start_file(name.as_str(), options).map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Failed to build export archive", e)
        })?;
        writer.write_all(data).map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Failed to build export archive", e)
        })?;
    }

    let cursor = writer.finish().map_err(|e| {
        AppError::with_source(ErrorKind::Internal, "Failed to finish export archive", e)
    })?;
    Ok(cursor.into_inner())
}
