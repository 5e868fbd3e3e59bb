use std::sync::Arc;

use anyhow::{Context, Result};
use lens_axum::{axum, AxumApp, HttpSettings, LensAxumState};
use lens_blob::{open_store, DefaultKeyScheme, StorageSettings};
use lens_core::{GalleryRecords, LensConfig, MemoryRecords};
use lens_media::{FeedConfig, FeedSampler, JpegThumbnailer, MediaConfig, MediaPipeline, PhotoService};

pub const ENV_PREFIX: &str = "LENS__";

/// Assemble the app from `config`, with the given record store.
pub async fn build_with(config: &LensConfig, records: Arc<dyn GalleryRecords>) -> Result<(AxumApp, HttpSettings)> {
    let snapshot = config.snapshot();

    let storage = StorageSettings::from_snapshot(&snapshot).context("invalid storage settings")?;
    let opened = open_store(&storage).await.context("failed to open object store")?;

    let media = MediaConfig::from_snapshot(&snapshot);
    let feed = FeedConfig::from_snapshot(&snapshot);
    let http = HttpSettings::from_snapshot(&snapshot);

    let pipeline = Arc::new(MediaPipeline::new(
        opened.store,
        Arc::new(DefaultKeyScheme),
        Arc::new(JpegThumbnailer::from_config(&media)),
        media,
    ));
    let photos = Arc::new(PhotoService::new(Arc::clone(&pipeline), Arc::clone(&records)));
    let sampler = Arc::new(FeedSampler::new(records, pipeline, feed));

    let mut state = LensAxumState::new(photos, sampler, http.max_body_bytes);
    if let Some(local) = opened.local {
        state = state.with_local_blobs(local);
    }

    tracing::info!(provider = ?storage.provider, "lens configured");
    Ok((axum(state), http))
}

/// Assemble the app with an in-process record store.
pub async fn build(config: &LensConfig) -> Result<(AxumApp, HttpSettings)> {
    build_with(config, Arc::new(MemoryRecords::new())).await
}
