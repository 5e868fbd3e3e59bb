use std::sync::Arc;

use lens_blob::LocalDiskStore;
use lens_media::{FeedSampler, PhotoService};

/// Shared handles every route reads from.
pub struct LensAxumState {
    pub photos: Arc<PhotoService>,
    pub feed: Arc<FeedSampler>,
    /// Present only when the local-disk backend is selected; `/blobs` 404s otherwise.
    pub blobs: Option<Arc<LocalDiskStore>>,
    pub max_body_bytes: usize,
}

impl Clone for LensAxumState {
    fn clone(&self) -> Self {
        Self {
            photos: Arc::clone(&self.photos),
            feed: Arc::clone(&self.feed),
            blobs: self.blobs.as_ref().map(Arc::clone),
            max_body_bytes: self.max_body_bytes,
        }
    }
}

impl LensAxumState {
    pub fn new(photos: Arc<PhotoService>, feed: Arc<FeedSampler>, max_body_bytes: usize) -> Self {
        Self {
            photos,
            feed,
            blobs: None,
            max_body_bytes,
        }
    }

    pub fn with_local_blobs(mut self, store: Arc<LocalDiskStore>) -> Self {
        self.blobs = Some(store);
        self
    }
}
