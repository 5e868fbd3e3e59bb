use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use lens_core::StorageKey;

use crate::store::expiry_from_now;
use crate::types::{bytes_stream, collect_stream};
use crate::{BlobError, BlobResult, ByteStream, GetResult, ObjectStore, PutAck, SignedUrl};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: String,
}

/// In-process store for tests and single-node development.
///
/// Signed URLs point at `{base_url}/{key}` and carry the expiry only; there
/// is nothing to authenticate against.
#[derive(Debug)]
pub struct MemoryStore {
    objects: DashMap<String, StoredObject>,
    base_url: String,
    quota_bytes: Option<u64>,
    used_bytes: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
            base_url: "memory://lens".to_string(),
            quota_bytes: None,
            used_bytes: AtomicU64::new(0),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Reject writes once the total stored size would exceed `bytes`.
    pub fn with_quota(mut self, bytes: u64) -> Self {
        self.quota_bytes = Some(bytes);
        self
    }

    pub fn contains(&self, key: &StorageKey) -> bool {
        self.objects.contains_key(key.as_str())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn used_bytes(&self) -> u64 {
        self.used_bytes.load(Ordering::Acquire)
    }

    fn reserve(&self, key: &StorageKey, len: u64) -> BlobResult<()> {
        let Some(quota) = self.quota_bytes else {
            self.used_bytes.fetch_add(len, Ordering::AcqRel);
            return Ok(());
        };
        self.used_bytes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                used.checked_add(len).filter(|total| *total <= quota)
            })
            .map(|_| ())
            .map_err(|_| BlobError::quota_exceeded(key.as_str()))
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(&self, key: &StorageKey, stream: ByteStream, content_type: &str) -> BlobResult<PutAck> {
        let data = collect_stream(stream).await?;
        let size_bytes = data.len() as u64;

        match self.objects.entry(key.as_str().to_string()) {
            Entry::Occupied(_) => Err(BlobError::invalid(format!("object {key} already exists"))),
            Entry::Vacant(slot) => {
                self.reserve(key, size_bytes)?;
                slot.insert(StoredObject {
                    data,
                    content_type: content_type.to_string(),
                });
                Ok(PutAck {
                    key: key.clone(),
                    size_bytes,
                    etag: None,
                })
            }
        }
    }

    async fn get(&self, key: &StorageKey) -> BlobResult<GetResult> {
        let object = self
            .objects
            .get(key.as_str())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| BlobError::not_found(key.as_str()))?;

        Ok(GetResult {
            size_bytes: Some(object.data.len() as u64),
            content_type: Some(object.content_type),
            stream: bytes_stream(object.data),
        })
    }

    async fn signed_read_url(&self, key: &StorageKey, ttl: Duration) -> BlobResult<SignedUrl> {
        if !self.contains(key) {
            return Err(BlobError::not_found(key.as_str()));
        }
        let expires_at = expiry_from_now(ttl);
        Ok(SignedUrl {
            url: format!("{}/{}?expires={}", self.base_url, key, expires_at.timestamp()),
            expires_at,
        })
    }

    async fn delete(&self, key: &StorageKey) -> BlobResult<bool> {
        match self.objects.remove(key.as_str()) {
            Some((_, object)) => {
                self.used_bytes
                    .fetch_sub(object.data.len() as u64, Ordering::AcqRel);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}
