use std::time::Duration;

use async_trait::async_trait;

use lens_core::StorageKey;

use crate::{BlobResult, ByteStream, GetResult, PutAck, SignedUrl};

/// Durable blob backend. Knows nothing about galleries or photos.
///
/// Keys are produced by a [`crate::KeyScheme`] and are unique per write, so
/// backends that can refuse an overwrite do so.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object from a stream.
    ///
    /// Fails with `StorageUnavailable` on transport/auth failure and
    /// `QuotaExceeded` when the backend rejects the size.
    async fn put(&self, key: &StorageKey, stream: ByteStream, content_type: &str) -> BlobResult<PutAck>;

    /// Open an object as a stream. `NotFound` if the key is absent.
    async fn get(&self, key: &StorageKey) -> BlobResult<GetResult>;

    /// A URL valid for exactly `ttl` from now, usable without backend credentials.
    async fn signed_read_url(&self, key: &StorageKey, ttl: Duration) -> BlobResult<SignedUrl>;

    /// Remove an object. Returns `false`, not an error, if it was already absent.
    async fn delete(&self, key: &StorageKey) -> BlobResult<bool>;

    /// Short backend tag recorded on assets this store wrote.
    fn provider_name(&self) -> &'static str;
}

/// `now + ttl` as a UTC timestamp, saturating on absurd durations.
pub(crate) fn expiry_from_now(ttl: Duration) -> chrono::DateTime<chrono::Utc> {
    let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
    chrono::Utc::now()
        .checked_add_signed(ttl)
        .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC)
}
