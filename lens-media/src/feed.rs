//! Discovery feed: a random window over the most recent uploads.
//!
//! Every request reshuffles, so the same page number can return different
//! items. Clients must not rely on stable pagination.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, instrument};

use lens_core::{AssetId, ContainerId, FeedEntry, GalleryRecords};

use crate::config::FeedConfig;
use crate::error::{MediaError, MediaResult};
use crate::pipeline::MediaPipeline;

const UNTITLED_GALLERY: &str = "Untitled gallery";

/// Shuffle `sample` with `rng` and cut out 1-based page `page_number`.
///
/// Returns the page and whether later pages exist. Page 0 is treated as 1.
pub fn shuffled_window<T, R>(mut sample: Vec<T>, page_number: usize, page_size: usize, rng: &mut R) -> (Vec<T>, bool)
where
    R: Rng + ?Sized,
{
    sample.shuffle(rng);
    window(sample, page_number, page_size)
}

/// `[(page - 1) * size, page * size)`, clipped to the sample.
pub fn window<T>(sample: Vec<T>, page_number: usize, page_size: usize) -> (Vec<T>, bool) {
    let page_number = page_number.max(1);
    let page_size = page_size.max(1);
    let total = sample.len();
    let start = (page_number - 1).saturating_mul(page_size);
    let end = page_number.saturating_mul(page_size);

    let items = sample
        .into_iter()
        .skip(start)
        .take(end.saturating_sub(start))
        .collect();
    (items, total > end)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub asset_id: AssetId,
    pub container_id: ContainerId,
    pub container_title: String,
    pub owner_name: String,
    pub caption: String,
    pub image_url: String,
    pub image_url_expires_at: Option<DateTime<Utc>>,
    /// Original-resolution link, for opening an item full size.
    pub full_url: String,
    pub full_url_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub page: usize,
    pub page_size: usize,
    pub has_more: bool,
    pub items: Vec<FeedItem>,
}

/// Builds feed pages from the record store's recent listing.
pub struct FeedSampler {
    records: Arc<dyn GalleryRecords>,
    pipeline: Arc<MediaPipeline>,
    config: FeedConfig,
}

impl FeedSampler {
    pub fn new(records: Arc<dyn GalleryRecords>, pipeline: Arc<MediaPipeline>, config: FeedConfig) -> Self {
        Self {
            records,
            pipeline,
            config,
        }
    }

    pub fn config(&self) -> FeedConfig {
        self.config
    }

    #[instrument(skip(self))]
    pub async fn build_page(&self, page_number: usize) -> MediaResult<FeedPage> {
        let page_number = page_number.max(1);
        let sample = self
            .records
            .recent_assets(self.config.sample_size)
            .await
            .map_err(MediaError::Records)?;
        let sampled = sample.len();

        let (entries, has_more) = shuffled_window(sample, page_number, self.config.page_size, &mut rand::thread_rng());
        debug!(sampled, returned = entries.len(), has_more, "feed window cut");

        let items = futures::future::join_all(entries.into_iter().map(|entry| self.item(entry))).await;

        Ok(FeedPage {
            page: page_number,
            page_size: self.config.page_size,
            has_more,
            items,
        })
    }

    async fn item(&self, entry: FeedEntry) -> FeedItem {
        let (display, full) = futures::join!(
            self.pipeline.resolve_display_url(&entry.asset, None),
            self.pipeline.resolve_full_url(&entry.asset, None),
        );
        let owner_name = entry
            .owner
            .as_ref()
            .map(|owner| owner.display_name())
            .unwrap_or_else(|| "Unknown".to_string());
        let container_title = entry
            .container_title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| UNTITLED_GALLERY.to_string());
        let asset = entry.asset;

        FeedItem {
            caption: format!("by {} • {}", owner_name, asset.created_at.format("%d %B %Y")),
            asset_id: asset.id,
            container_id: asset.container_id,
            container_title,
            owner_name,
            image_url: display.url,
            image_url_expires_at: display.expires_at,
            full_url: full.url,
            full_url_expires_at: full.expires_at,
            created_at: asset.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn third_page_of_fifty_has_two_items_and_no_more() {
        let sample: Vec<usize> = (0..50).collect();
        let (items, has_more) = window(sample, 3, 24);
        assert_eq!(items, vec![48, 49]);
        assert!(!has_more);
    }

    #[test]
    fn has_more_is_strict() {
        let (items, has_more) = window((0..48).collect::<Vec<_>>(), 2, 24);
        assert_eq!(items.len(), 24);
        assert!(!has_more);

        let (_, has_more) = window((0..49).collect::<Vec<_>>(), 2, 24);
        assert!(has_more);
    }

    #[test]
    fn page_past_the_end_is_empty_and_page_zero_is_first() {
        let (items, has_more) = window((0..10).collect::<Vec<_>>(), 5, 24);
        assert!(items.is_empty());
        assert!(!has_more);

        let (first, _) = window((0..10).collect::<Vec<_>>(), 0, 4);
        assert_eq!(first, vec![0, 1, 2, 3]);
    }

    #[test]
    fn shuffle_is_a_permutation_of_the_sample() {
        let mut rng = StdRng::seed_from_u64(7);
        let (mut items, has_more) = shuffled_window((0..50).collect::<Vec<_>>(), 1, 50, &mut rng);
        assert!(!has_more);
        items.sort_unstable();
        assert_eq!(items, (0..50).collect::<Vec<_>>());
    }
}
