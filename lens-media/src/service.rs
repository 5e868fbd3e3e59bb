use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use lens_blob::Variant;
use lens_core::{Asset, AssetId, ContainerId, GalleryRecords};

use crate::error::{MediaError, MediaResult};
use crate::pipeline::{DeleteReport, Download, MediaCtx, MediaPipeline, ResolvedUrl, UploadOutcome, UploadReport};
use crate::validate::IncomingFile;

/// An asset with both of its URLs resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetView {
    #[serde(flatten)]
    pub asset: Asset,
    pub display_url: ResolvedUrl,
    pub full_url: ResolvedUrl,
}

/// Gallery-scoped photo operations.
///
/// Joins the pipeline with the record store and keeps the ordering rules:
/// blobs are written before a record is saved, and removed before a record
/// is deleted.
pub struct PhotoService {
    pipeline: Arc<MediaPipeline>,
    records: Arc<dyn GalleryRecords>,
}

impl PhotoService {
    pub fn new(pipeline: Arc<MediaPipeline>, records: Arc<dyn GalleryRecords>) -> Self {
        Self { pipeline, records }
    }

    async fn require_container(&self, ctx: &MediaCtx, container_id: &ContainerId) -> MediaResult<()> {
        self.records
            .find_container(&ctx.owner_id, container_id)
            .await
            .map_err(MediaError::Records)?
            .map(|_| ())
            .ok_or_else(|| MediaError::not_found(format!("gallery {container_id}")))
    }

    async fn require_asset(&self, ctx: &MediaCtx, container_id: &ContainerId, asset_id: &AssetId) -> MediaResult<Asset> {
        self.require_container(ctx, container_id).await?;
        self.records
            .find_asset(container_id, asset_id)
            .await
            .map_err(MediaError::Records)?
            .ok_or_else(|| MediaError::not_found(format!("photo {asset_id}")))
    }

    /// Store a batch, then commit each stored asset. A commit failure turns
    /// that item into `Failed` and leaves its blobs orphaned.
    #[instrument(skip(self, ctx, files), fields(owner = %ctx.owner_id, container = %container_id))]
    pub async fn upload(
        &self,
        ctx: &MediaCtx,
        container_id: &ContainerId,
        files: Vec<IncomingFile>,
    ) -> MediaResult<UploadReport> {
        self.require_container(ctx, container_id).await?;
        let report = self.pipeline.upload_batch(ctx, container_id, files).await;

        let mut committed = Vec::with_capacity(report.items.len());
        for item in report.items {
            committed.push(match item {
                UploadOutcome::Stored { file_name, asset } => match self.commit(asset).await {
                    Ok(asset) => UploadOutcome::Stored { file_name, asset },
                    Err(err) => UploadOutcome::Failed {
                        file_name,
                        error: err.to_string(),
                    },
                },
                other => other,
            });
        }
        Ok(UploadReport::from_outcomes(committed))
    }

    async fn commit(&self, asset: Asset) -> MediaResult<Asset> {
        let id = asset.id.clone();
        let original = asset.original_key.clone();
        let thumbnail = asset.thumbnail_key.clone();
        self.records.save_asset(asset).await.map_err(|err| {
            warn!(
                asset = %id,
                original = ?original,
                thumbnail = ?thumbnail,
                error = %err,
                "record commit failed; blobs orphaned"
            );
            MediaError::Records(err)
        })
    }

    /// Store one client-edited image and commit it.
    pub async fn upload_encoded(
        &self,
        ctx: &MediaCtx,
        container_id: &ContainerId,
        data_uri: &str,
        file_name: Option<&str>,
    ) -> MediaResult<Asset> {
        self.require_container(ctx, container_id).await?;
        let asset = self
            .pipeline
            .upload_from_encoded_payload(ctx, container_id, data_uri, file_name)
            .await?;
        self.commit(asset).await
    }

    /// Newest first, with display and full URLs.
    pub async fn list(&self, ctx: &MediaCtx, container_id: &ContainerId) -> MediaResult<Vec<AssetView>> {
        self.require_container(ctx, container_id).await?;
        let assets = self
            .records
            .list_assets(container_id)
            .await
            .map_err(MediaError::Records)?;

        let views = assets.into_iter().map(|asset| async move {
            let display_url = self.pipeline.resolve_display_url(&asset, None).await;
            let full_url = self.pipeline.resolve_full_url(&asset, None).await;
            AssetView {
                asset,
                display_url,
                full_url,
            }
        });
        Ok(futures::future::join_all(views).await)
    }

    /// `Variant::Thumbnail` follows the display chain, `Variant::Original` the full one.
    pub async fn resolve_url(
        &self,
        ctx: &MediaCtx,
        container_id: &ContainerId,
        asset_id: &AssetId,
        variant: Variant,
    ) -> MediaResult<ResolvedUrl> {
        let asset = self.require_asset(ctx, container_id, asset_id).await?;
        Ok(match variant {
            Variant::Thumbnail => self.pipeline.resolve_display_url(&asset, None).await,
            Variant::Original => self.pipeline.resolve_full_url(&asset, None).await,
        })
    }

    pub async fn download(&self, ctx: &MediaCtx, container_id: &ContainerId, asset_id: &AssetId) -> MediaResult<Download> {
        let asset = self.require_asset(ctx, container_id, asset_id).await?;
        self.pipeline.open_for_download(ctx, &asset).await
    }

    /// Objects first, record last. The record stays if the original could not be removed.
    #[instrument(skip(self, ctx), fields(owner = %ctx.owner_id))]
    pub async fn delete(&self, ctx: &MediaCtx, container_id: &ContainerId, asset_id: &AssetId) -> MediaResult<DeleteReport> {
        let asset = self.require_asset(ctx, container_id, asset_id).await?;
        let report = self.pipeline.delete_asset(ctx, &asset).await?;

        let removed = self
            .records
            .delete_asset_record(&asset.id)
            .await
            .map_err(MediaError::Records)?;
        info!(asset = %asset.id, record_removed = removed, clean = report.is_clean(), "photo deleted");
        Ok(report)
    }
}
