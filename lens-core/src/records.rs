use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;

use crate::ids::{AssetId, ContainerId, OwnerId};
use crate::model::{Asset, Container, FeedEntry, OwnerProfile};

/// Ownership-scoped metadata store for galleries and their assets.
///
/// The media pipeline only calls the mutating methods after its own
/// object-store writes or deletes have succeeded. Implementations are
/// expected to be a relational database in production; [`MemoryRecords`]
/// backs tests and local development.
#[async_trait]
pub trait GalleryRecords: Send + Sync {
    /// A container, only if `owner_id` owns it.
    async fn find_container(&self, owner_id: &OwnerId, id: &ContainerId) -> Result<Option<Container>>;

    /// All assets in a container, newest first.
    async fn list_assets(&self, container_id: &ContainerId) -> Result<Vec<Asset>>;

    /// One asset, only if it lives in `container_id`.
    async fn find_asset(&self, container_id: &ContainerId, id: &AssetId) -> Result<Option<Asset>>;

    /// Persist a new asset record.
    async fn save_asset(&self, asset: Asset) -> Result<Asset>;

    /// Remove an asset record. Returns false if it was already gone.
    async fn delete_asset_record(&self, id: &AssetId) -> Result<bool>;

    /// The most recent `limit` assets across all galleries, newest first.
    async fn recent_assets(&self, limit: usize) -> Result<Vec<FeedEntry>>;
}

#[derive(Default)]
struct MemoryRecordsInner {
    containers: HashMap<ContainerId, Container>,
    owners: HashMap<OwnerId, OwnerProfile>,
    assets: HashMap<AssetId, Asset>,
}

/// In-process [`GalleryRecords`] implementation.
#[derive(Clone, Default)]
pub struct MemoryRecords {
    inner: Arc<RwLock<MemoryRecordsInner>>,
}

impl MemoryRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_container(&self, container: Container) {
        self.inner.write().containers.insert(container.id.clone(), container);
    }

    pub fn insert_owner(&self, owner: OwnerProfile) {
        self.inner.write().owners.insert(owner.id.clone(), owner);
    }

    pub fn asset_count(&self) -> usize {
        self.inner.read().assets.len()
    }
}

#[async_trait]
impl GalleryRecords for MemoryRecords {
    async fn find_container(&self, owner_id: &OwnerId, id: &ContainerId) -> Result<Option<Container>> {
        let inner = self.inner.read();
        Ok(inner
            .containers
            .get(id)
            .filter(|c| &c.owner_id == owner_id)
            .cloned())
    }

    async fn list_assets(&self, container_id: &ContainerId) -> Result<Vec<Asset>> {
        let inner = self.inner.read();
        let mut assets: Vec<Asset> = inner
            .assets
            .values()
            .filter(|a| &a.container_id == container_id)
            .cloned()
            .collect();
        assets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(assets)
    }

    async fn find_asset(&self, container_id: &ContainerId, id: &AssetId) -> Result<Option<Asset>> {
        let inner = self.inner.read();
        Ok(inner
            .assets
            .get(id)
            .filter(|a| &a.container_id == container_id)
            .cloned())
    }

    async fn save_asset(&self, asset: Asset) -> Result<Asset> {
        asset.check_persistable().map_err(|e| e.into_anyhow())?;
        self.inner.write().assets.insert(asset.id.clone(), asset.clone());
        Ok(asset)
    }

    async fn delete_asset_record(&self, id: &AssetId) -> Result<bool> {
        Ok(self.inner.write().assets.remove(id).is_some())
    }

    async fn recent_assets(&self, limit: usize) -> Result<Vec<FeedEntry>> {
        let inner = self.inner.read();
        let mut assets: Vec<&Asset> = inner.assets.values().collect();
        assets.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(assets
            .into_iter()
            .take(limit)
            .map(|asset| FeedEntry {
                asset: asset.clone(),
                container_title: inner.containers.get(&asset.container_id).map(|c| c.title.clone()),
                owner: inner.owners.get(&asset.owner_id).cloned(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::StorageKey;
    use chrono::{Duration, Utc};

    fn stored(container: &str, minutes_ago: i64) -> Asset {
        Asset::stored(
            OwnerId::new("u1"),
            ContainerId::new(container),
            StorageKey::new(format!("u1/{container}/original/{minutes_ago}.jpg")),
            "image/jpeg",
            42,
        )
        .with_created_at(Utc::now() - Duration::minutes(minutes_ago))
    }

    #[tokio::test]
    async fn find_container_is_owner_scoped() {
        let records = MemoryRecords::new();
        records.insert_container(Container::new("g1", "u1", "Trips"));

        let mine = records.find_container(&OwnerId::new("u1"), &ContainerId::new("g1")).await.unwrap();
        let theirs = records.find_container(&OwnerId::new("u2"), &ContainerId::new("g1")).await.unwrap();

        assert!(mine.is_some());
        assert!(theirs.is_none());
    }

    #[tokio::test]
    async fn recent_assets_are_newest_first_and_capped() {
        let records = MemoryRecords::new();
        records.insert_container(Container::new("g1", "u1", "Trips"));
        for minutes in [5, 1, 3] {
            records.save_asset(stored("g1", minutes)).await.unwrap();
        }

        let recent = records.recent_assets(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent[0].asset.created_at > recent[1].asset.created_at);
        assert_eq!(recent[0].container_title.as_deref(), Some("Trips"));
    }

    #[tokio::test]
    async fn save_rejects_asset_without_original() {
        let records = MemoryRecords::new();
        let mut asset = stored("g1", 0);
        asset.original_key = None;

        assert!(records.save_asset(asset).await.is_err());
        assert_eq!(records.asset_count(), 0);
    }

    #[tokio::test]
    async fn delete_reports_absence() {
        let records = MemoryRecords::new();
        let asset = records.save_asset(stored("g1", 0)).await.unwrap();

        assert!(records.delete_asset_record(&asset.id).await.unwrap());
        assert!(!records.delete_asset_record(&asset.id).await.unwrap());
    }
}
