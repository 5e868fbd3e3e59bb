//! # Media pipeline
//!
//! Per upload item the pipeline walks
//! `Received → Validated → OriginalStored → ThumbnailDerived → Persisted`,
//! ending in `Rejected` (validation) or `Failed` (storage) instead when a
//! step goes wrong. The original write is acknowledged before the thumbnail
//! write starts; the returned [`Asset`] is what the caller commits to the
//! record store afterwards.
//!
//! Thumbnail trouble never fails an item: the asset is returned without a
//! thumbnail key and display resolution falls back to the original.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use lens_blob::{
    bytes_stream, extension_for_content_type, ByteStream, KeyScheme, KeySource, ObjectStore, Variant,
};
use lens_core::{Asset, ContainerId, OwnerId, StorageKey};

use crate::config::MediaConfig;
use crate::error::{MediaError, MediaResult, Rejection};
use crate::payload::decode_data_uri;
use crate::transcoder::{Thumbnail, Transcoder, THUMBNAIL_CONTENT_TYPE};
use crate::validate::{validate, IncomingFile};

/// Shown when an asset has nothing resolvable.
pub const PLACEHOLDER_URL: &str = "/img/placeholder-photo.svg";

/// Who is asking, and how to abort.
///
/// The owner is already authorized by the caller; the pipeline only uses it
/// for key prefixes and log fields.
#[derive(Debug, Clone)]
pub struct MediaCtx {
    pub owner_id: OwnerId,
    pub request_id: String,
    cancel: CancellationToken,
}

impl MediaCtx {
    pub fn new(owner_id: impl Into<OwnerId>) -> Self {
        Self {
            owner_id: owner_id.into(),
            request_id: Uuid::new_v4().to_string(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Where a resolved URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UrlSource {
    ThumbnailKey,
    OriginalKey,
    LegacyThumbnailPath,
    LegacyPath,
    Placeholder,
}

/// A URL to embed in a page. `expires_at` is set only for signed URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedUrl {
    pub url: String,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub source: UrlSource,
}

impl ResolvedUrl {
    fn unsigned(url: impl Into<String>, source: UrlSource) -> Self {
        Self {
            url: url.into(),
            expires_at: None,
            source,
        }
    }
}

/// What a download request turns into.
pub enum Download {
    Stream {
        stream: ByteStream,
        content_type: String,
        file_name: String,
    },
    /// Pre-key assets: send the client to the public path.
    Redirect(String),
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Download::Stream {
                content_type,
                file_name,
                ..
            } => f
                .debug_struct("Stream")
                .field("content_type", content_type)
                .field("file_name", file_name)
                .finish_non_exhaustive(),
            Download::Redirect(path) => f.debug_tuple("Redirect").field(path).finish(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ObjectRemoval {
    Removed,
    AlreadyAbsent,
    NoKey,
    #[serde(rename_all = "camelCase")]
    Failed { error: String },
}

/// Outcome of [`MediaPipeline::delete_asset`]. Only a failed original
/// delete is an error; the thumbnail is best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReport {
    pub original: ObjectRemoval,
    pub thumbnail: ObjectRemoval,
}

impl DeleteReport {
    /// Nothing was left behind in the store.
    pub fn is_clean(&self) -> bool {
        !matches!(self.thumbnail, ObjectRemoval::Failed { .. })
    }
}

/// Per-file result of a batch upload.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum UploadOutcome {
    #[serde(rename_all = "camelCase")]
    Stored { file_name: String, asset: Asset },
    #[serde(rename_all = "camelCase")]
    Rejected { file_name: String, reason: String },
    #[serde(rename_all = "camelCase")]
    Failed { file_name: String, error: String },
}

impl UploadOutcome {
    pub fn rejected(rejection: Rejection) -> Self {
        Self::Rejected {
            reason: rejection.reason.to_string(),
            file_name: rejection.file_name,
        }
    }

    pub fn file_name(&self) -> &str {
        match self {
            UploadOutcome::Stored { file_name, .. }
            | UploadOutcome::Rejected { file_name, .. }
            | UploadOutcome::Failed { file_name, .. } => file_name,
        }
    }
}

/// All outcomes of one batch, in submission order.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReport {
    pub items: Vec<UploadOutcome>,
    pub stored: usize,
    pub rejected: usize,
    pub failed: usize,
}

impl UploadReport {
    pub fn from_outcomes(items: Vec<UploadOutcome>) -> Self {
        let mut report = Self::default();
        for item in &items {
            match item {
                UploadOutcome::Stored { .. } => report.stored += 1,
                UploadOutcome::Rejected { .. } => report.rejected += 1,
                UploadOutcome::Failed { .. } => report.failed += 1,
            }
        }
        report.items = items;
        report
    }

    pub fn stored_assets(&self) -> impl Iterator<Item = &Asset> {
        self.items.iter().filter_map(|item| match item {
            UploadOutcome::Stored { asset, .. } => Some(asset),
            _ => None,
        })
    }
}

/// Ingestion and delivery over an injected store, key scheme and transcoder.
pub struct MediaPipeline {
    store: Arc<dyn ObjectStore>,
    keys: Arc<dyn KeyScheme>,
    transcoder: Arc<dyn Transcoder>,
    config: MediaConfig,
}

impl MediaPipeline {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        keys: Arc<dyn KeyScheme>,
        transcoder: Arc<dyn Transcoder>,
        config: MediaConfig,
    ) -> Self {
        Self {
            store,
            keys,
            transcoder,
            config,
        }
    }

    pub fn config(&self) -> &MediaConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn validate(&self, file: &IncomingFile) -> Result<(), Rejection> {
        validate(file, &self.config)
    }

    /// Validate, store the original, derive and store the thumbnail.
    #[instrument(
        skip(self, ctx, file),
        fields(owner = %ctx.owner_id, container = %container_id, file = %file.file_name, size = file.bytes.len())
    )]
    pub async fn upload_original_and_thumbnail(
        &self,
        ctx: &MediaCtx,
        container_id: &ContainerId,
        file: IncomingFile,
    ) -> MediaResult<Asset> {
        self.validate(&file).map_err(MediaError::ValidationRejected)?;
        let content_type = file.essence();

        let original_key = self.keys.make_key(
            &ctx.owner_id,
            container_id,
            Variant::Original,
            KeySource::new(Some(&file.file_name), Some(&content_type)),
        );
        let ack = cancellable(ctx, async {
            self.store
                .put(&original_key, bytes_stream(file.bytes.clone()), &content_type)
                .await
                .map_err(MediaError::from)
        })
        .await?;
        debug!(key = %original_key, "original stored");

        let mut asset = Asset::stored(
            ctx.owner_id.clone(),
            container_id.clone(),
            original_key,
            content_type,
            ack.size_bytes,
        )
        .with_storage_provider(self.store.provider_name());

        if let Some(thumbnail_key) = self.store_thumbnail(ctx, container_id, file.bytes).await? {
            asset = asset.with_thumbnail_key(thumbnail_key);
        }

        info!(asset = %asset.id, thumbnail = asset.thumbnail_key.is_some(), "asset uploaded");
        Ok(asset)
    }

    /// `Ok(None)` when the thumbnail was skipped; only cancellation is an error.
    async fn store_thumbnail(
        &self,
        ctx: &MediaCtx,
        container_id: &ContainerId,
        original: Bytes,
    ) -> MediaResult<Option<StorageKey>> {
        let thumbnail = match cancellable(ctx, self.derive_thumbnail(original)).await {
            Ok(thumbnail) => thumbnail,
            Err(MediaError::Cancelled) => return Err(MediaError::Cancelled),
            Err(err) => {
                warn!(error = %err, "thumbnail derivation failed; keeping original only");
                return Ok(None);
            }
        };

        let key = self.keys.make_key(
            &ctx.owner_id,
            container_id,
            Variant::Thumbnail,
            KeySource::new(None, Some(THUMBNAIL_CONTENT_TYPE)),
        );
        let put = cancellable(ctx, async {
            self.store
                .put(&key, bytes_stream(thumbnail.bytes), THUMBNAIL_CONTENT_TYPE)
                .await
                .map_err(MediaError::from)
        })
        .await;

        match put {
            Ok(_) => Ok(Some(key)),
            Err(MediaError::Cancelled) => Err(MediaError::Cancelled),
            Err(err) => {
                warn!(key = %key, error = %err, "thumbnail write failed; keeping original only");
                Ok(None)
            }
        }
    }

    /// Decode and encode off the async workers.
    async fn derive_thumbnail(&self, original: Bytes) -> MediaResult<Thumbnail> {
        let transcoder = Arc::clone(&self.transcoder);
        tokio::task::spawn_blocking(move || transcoder.make_thumbnail(&original))
            .await
            .map_err(|e| MediaError::UnsupportedImage(format!("transcoder task failed: {e}")))?
    }

    /// Upload several files; each one succeeds, is rejected, or fails alone.
    #[instrument(skip(self, ctx, files), fields(owner = %ctx.owner_id, container = %container_id, count = files.len()))]
    pub async fn upload_batch(
        &self,
        ctx: &MediaCtx,
        container_id: &ContainerId,
        files: Vec<IncomingFile>,
    ) -> UploadReport {
        let outcomes = futures::stream::iter(files)
            .map(|file| async move {
                let file_name = file.file_name.clone();
                match self.upload_original_and_thumbnail(ctx, container_id, file).await {
                    Ok(asset) => UploadOutcome::Stored { file_name, asset },
                    Err(MediaError::ValidationRejected(rejection)) => UploadOutcome::rejected(rejection),
                    Err(err) => {
                        warn!(file = %file_name, error = %err, "upload item failed");
                        UploadOutcome::Failed {
                            file_name,
                            error: err.to_string(),
                        }
                    }
                }
            })
            .buffered(self.config.upload_concurrency.max(1))
            .collect::<Vec<_>>()
            .await;

        let report = UploadReport::from_outcomes(outcomes);
        info!(
            stored = report.stored,
            rejected = report.rejected,
            failed = report.failed,
            "batch upload finished"
        );
        report
    }

    /// Upload a `data:<mime>;base64,...` image produced by the client-side editor.
    #[instrument(skip(self, ctx, data_uri), fields(owner = %ctx.owner_id, container = %container_id))]
    pub async fn upload_from_encoded_payload(
        &self,
        ctx: &MediaCtx,
        container_id: &ContainerId,
        data_uri: &str,
        suggested_file_name: Option<&str>,
    ) -> MediaResult<Asset> {
        let decoded = decode_data_uri(data_uri)?;
        let file_name = match suggested_file_name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => format!(
                "edited-{}{}",
                Utc::now().format("%Y%m%d%H%M%S"),
                extension_for_content_type(&decoded.content_type).unwrap_or_default()
            ),
        };
        self.upload_original_and_thumbnail(
            ctx,
            container_id,
            IncomingFile::new(file_name, decoded.content_type, decoded.bytes),
        )
        .await
    }

    /// thumbnail key → original key → legacy thumbnail → legacy path → placeholder.
    pub async fn resolve_display_url(&self, asset: &Asset, ttl: Option<Duration>) -> ResolvedUrl {
        let ttl = ttl.unwrap_or(self.config.signed_url_ttl);
        let signed = [
            (asset.thumbnail_key.as_ref(), UrlSource::ThumbnailKey),
            (asset.original_key.as_ref(), UrlSource::OriginalKey),
        ];
        let legacy = [
            (asset.legacy_thumbnail_path.as_deref(), UrlSource::LegacyThumbnailPath),
            (asset.legacy_path.as_deref(), UrlSource::LegacyPath),
        ];
        self.resolve_chain(asset, &signed, &legacy, ttl).await
    }

    /// original key → legacy path → placeholder.
    pub async fn resolve_full_url(&self, asset: &Asset, ttl: Option<Duration>) -> ResolvedUrl {
        let ttl = ttl.unwrap_or(self.config.signed_url_ttl);
        let signed = [(asset.original_key.as_ref(), UrlSource::OriginalKey)];
        let legacy = [(asset.legacy_path.as_deref(), UrlSource::LegacyPath)];
        self.resolve_chain(asset, &signed, &legacy, ttl).await
    }

    async fn resolve_chain(
        &self,
        asset: &Asset,
        signed: &[(Option<&StorageKey>, UrlSource)],
        legacy: &[(Option<&str>, UrlSource)],
        ttl: Duration,
    ) -> ResolvedUrl {
        for (key, source) in signed {
            let Some(key) = key else { continue };
            match self.store.signed_read_url(key, ttl).await {
                Ok(signed) => {
                    return ResolvedUrl {
                        url: signed.url,
                        expires_at: Some(signed.expires_at),
                        source: *source,
                    }
                }
                Err(err) => warn!(asset = %asset.id, key = %key, error = %err, "could not sign url, trying next"),
            }
        }

        legacy
            .iter()
            .find_map(|(path, source)| {
                path.filter(|p| !p.trim().is_empty())
                    .map(|p| ResolvedUrl::unsigned(p, *source))
            })
            .unwrap_or_else(|| ResolvedUrl::unsigned(PLACEHOLDER_URL, UrlSource::Placeholder))
    }

    /// Stream the original, or redirect to its legacy path.
    #[instrument(skip(self, ctx, asset), fields(owner = %ctx.owner_id, asset = %asset.id))]
    pub async fn open_for_download(&self, ctx: &MediaCtx, asset: &Asset) -> MediaResult<Download> {
        if let Some(key) = &asset.original_key {
            let got = cancellable(ctx, async { self.store.get(key).await.map_err(MediaError::from) }).await?;
            let content_type = asset
                .content_type
                .clone()
                .or(got.content_type)
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let file_name = format!(
                "{}{}",
                asset.id,
                extension_for_content_type(&content_type).unwrap_or_default()
            );
            let stream = abort_on_cancel(got.stream, ctx.cancellation().clone());
            return Ok(Download::Stream {
                stream,
                content_type,
                file_name,
            });
        }

        match asset.legacy_path.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(path) => Ok(Download::Redirect(path.to_string())),
            None => Err(MediaError::not_found(format!("asset {} has no stored original", asset.id))),
        }
    }

    /// Remove the asset's objects. Succeeds when the original is gone,
    /// whether it was removed now or already missing.
    #[instrument(skip(self, ctx, asset), fields(owner = %ctx.owner_id, asset = %asset.id))]
    pub async fn delete_asset(&self, ctx: &MediaCtx, asset: &Asset) -> MediaResult<DeleteReport> {
        let original = match &asset.original_key {
            Some(key) => {
                let removed = cancellable(ctx, async { self.store.delete(key).await.map_err(MediaError::from) }).await?;
                if removed {
                    ObjectRemoval::Removed
                } else {
                    ObjectRemoval::AlreadyAbsent
                }
            }
            None => ObjectRemoval::NoKey,
        };

        let thumbnail = match &asset.thumbnail_key {
            Some(key) => match self.store.delete(key).await {
                Ok(true) => ObjectRemoval::Removed,
                Ok(false) => ObjectRemoval::AlreadyAbsent,
                Err(err) => {
                    warn!(key = %key, error = %err, "thumbnail delete failed; object orphaned");
                    ObjectRemoval::Failed { error: err.to_string() }
                }
            },
            None => ObjectRemoval::NoKey,
        };

        Ok(DeleteReport { original, thumbnail })
    }
}

/// Passes chunks through until `token` fires, then yields one `Interrupted`
/// error and ends, so a cancelled download never looks complete.
fn abort_on_cancel(stream: ByteStream, token: CancellationToken) -> ByteStream {
    Box::pin(futures::stream::unfold(Some((stream, token)), |state| async move {
        let (mut stream, token) = state?;
        tokio::select! {
            biased;
            _ = token.cancelled() => Some((
                Err(std::io::Error::new(std::io::ErrorKind::Interrupted, "download cancelled")),
                None,
            )),
            item = stream.next() => item.map(|chunk| (chunk, Some((stream, token)))),
        }
    }))
}

/// Race `fut` against the context's cancellation token.
async fn cancellable<T, F>(ctx: &MediaCtx, fut: F) -> MediaResult<T>
where
    F: Future<Output = MediaResult<T>>,
{
    tokio::select! {
        biased;
        _ = ctx.cancellation().cancelled() => Err(MediaError::Cancelled),
        result = fut => result,
    }
}
