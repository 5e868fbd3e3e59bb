use std::time::Duration;

use lens_core::LensConfigSnapshot;

pub const DEFAULT_MAX_FILE_BYTES: u64 = 20 * 1024 * 1024;
pub const DEFAULT_THUMBNAIL_MAX_EDGE_PX: u32 = 600;
pub const DEFAULT_THUMBNAIL_QUALITY: u8 = 85;
pub const DEFAULT_SIGNED_URL_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_FEED_SAMPLE_SIZE: usize = 500;
pub const DEFAULT_FEED_PAGE_SIZE: usize = 24;
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 4;
/// Longest presigned URL S3 accepts.
pub const MAX_SIGNED_URL_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

pub const DEFAULT_ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Settings for ingestion and delivery
#[derive(Debug, Clone)]
pub struct MediaConfig {
    /// Per-file upper bound, inclusive
    pub max_file_bytes: u64,

    /// Lowercase MIME essences accepted for upload
    pub allowed_content_types: Vec<String>,

    /// Longest thumbnail edge; smaller sources keep their size
    pub thumbnail_max_edge_px: u32,

    /// JPEG quality, 1..=100
    pub thumbnail_quality: u8,

    pub signed_url_ttl: Duration,

    /// How many batch items are stored/transcoded at once
    pub upload_concurrency: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            allowed_content_types: DEFAULT_ALLOWED_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            thumbnail_max_edge_px: DEFAULT_THUMBNAIL_MAX_EDGE_PX,
            thumbnail_quality: DEFAULT_THUMBNAIL_QUALITY,
            signed_url_ttl: DEFAULT_SIGNED_URL_TTL,
            upload_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
        }
    }
}

impl MediaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `media.*` keys over the defaults. Out-of-range values are clamped.
    pub fn from_snapshot(config: &LensConfigSnapshot) -> Self {
        let defaults = Self::default();
        Self {
            max_file_bytes: config
                .get_u64("media.max_file_bytes")
                .unwrap_or(defaults.max_file_bytes),
            allowed_content_types: config
                .get_list("media.allowed_content_types")
                .filter(|types| !types.is_empty())
                .map(|types| types.into_iter().map(|t| t.to_ascii_lowercase()).collect())
                .unwrap_or(defaults.allowed_content_types),
            thumbnail_max_edge_px: config
                .get_u64("media.thumbnail_max_edge_px")
                .and_then(|px| u32::try_from(px).ok())
                .unwrap_or(defaults.thumbnail_max_edge_px)
                .max(1),
            thumbnail_quality: config
                .get_u64("media.thumbnail_quality")
                .map(|q| q.clamp(1, 100) as u8)
                .unwrap_or(defaults.thumbnail_quality),
            signed_url_ttl: config
                .get_duration_secs("media.signed_url_ttl_secs")
                .unwrap_or(defaults.signed_url_ttl)
                .clamp(Duration::from_secs(1), MAX_SIGNED_URL_TTL),
            upload_concurrency: config
                .get_usize("media.upload_concurrency")
                .unwrap_or(defaults.upload_concurrency)
                .max(1),
        }
    }

    pub fn with_max_file_bytes(mut self, bytes: u64) -> Self {
        self.max_file_bytes = bytes;
        self
    }

    pub fn with_allowed_content_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_content_types = types
            .into_iter()
            .map(|t| t.into().to_ascii_lowercase())
            .collect();
        self
    }

    pub fn with_thumbnail_max_edge(mut self, px: u32) -> Self {
        self.thumbnail_max_edge_px = px.max(1);
        self
    }

    pub fn with_thumbnail_quality(mut self, quality: u8) -> Self {
        self.thumbnail_quality = quality.clamp(1, 100);
        self
    }

    pub fn with_signed_url_ttl(mut self, ttl: Duration) -> Self {
        self.signed_url_ttl = ttl.min(MAX_SIGNED_URL_TTL);
        self
    }

    pub fn with_upload_concurrency(mut self, n: usize) -> Self {
        self.upload_concurrency = n.max(1);
        self
    }

    pub fn allows(&self, content_type: &str) -> bool {
        self.allowed_content_types.iter().any(|t| t == content_type)
    }
}

/// Settings for the discovery feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedConfig {
    pub sample_size: usize,
    pub page_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_FEED_SAMPLE_SIZE,
            page_size: DEFAULT_FEED_PAGE_SIZE,
        }
    }
}

impl FeedConfig {
    pub fn from_snapshot(config: &LensConfigSnapshot) -> Self {
        let defaults = Self::default();
        Self {
            sample_size: config.get_usize("feed.sample_size").unwrap_or(defaults.sample_size),
            page_size: config
                .get_usize("feed.page_size")
                .unwrap_or(defaults.page_size)
                .max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lens_core::LensConfig;

    #[test]
    fn defaults_match_documented_values() {
        let media = MediaConfig::from_snapshot(&LensConfig::new().snapshot());
        assert_eq!(media.max_file_bytes, 20 * 1024 * 1024);
        assert_eq!(media.thumbnail_max_edge_px, 600);
        assert_eq!(media.thumbnail_quality, 85);
        assert_eq!(media.signed_url_ttl, Duration::from_secs(3600));
        assert!(media.allows("image/webp"));
        assert!(!media.allows("image/bmp"));

        let feed = FeedConfig::from_snapshot(&LensConfig::new().snapshot());
        assert_eq!(feed, FeedConfig { sample_size: 500, page_size: 24 });
    }

    #[test]
    fn overrides_are_clamped() {
        let mut config = LensConfig::new();
        config.set("media.thumbnail_quality", "250");
        config.set("media.upload_concurrency", "0");
        config.set("media.allowed_content_types", "IMAGE/PNG");

        let media = MediaConfig::from_snapshot(&config.snapshot());
        assert_eq!(media.thumbnail_quality, 100);
        assert_eq!(media.upload_concurrency, 1);
        assert_eq!(media.allowed_content_types, vec!["image/png".to_string()]);

        config.set("media.thumbnail_quality", "300");
        assert_eq!(MediaConfig::from_snapshot(&config.snapshot()).thumbnail_quality, 100);
        config.set("media.thumbnail_quality", "0");
        assert_eq!(MediaConfig::from_snapshot(&config.snapshot()).thumbnail_quality, 1);
    }

    #[test]
    fn signed_url_ttl_is_capped_at_presign_limit() {
        let mut config = LensConfig::new();
        config.set("media.signed_url_ttl_secs", "2592000");
        assert_eq!(MediaConfig::from_snapshot(&config.snapshot()).signed_url_ttl, MAX_SIGNED_URL_TTL);

        let built = MediaConfig::default().with_signed_url_ttl(Duration::from_secs(30 * 24 * 3600));
        assert_eq!(built.signed_url_ttl, MAX_SIGNED_URL_TTL);
    }
}
