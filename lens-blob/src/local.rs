use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use lens_core::StorageKey;

use crate::store::expiry_from_now;
use crate::{BlobError, BlobResult, ByteStream, GetResult, ObjectStore, PutAck, SignedUrl};

type HmacSha256 = Hmac<Sha256>;

const CONTENT_TYPE_SUFFIX: &str = ".content-type";

/// Why a local signed URL was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureError {
    Invalid,
    Expired,
}

/// HMAC-SHA256 signer for `{key}\n{expires}`.
#[derive(Clone)]
pub struct UrlSigner {
    keyed: HmacSha256,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner").finish_non_exhaustive()
    }
}

impl UrlSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> BlobResult<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(BlobError::invalid("signing secret must not be empty"));
        }
        let keyed = HmacSha256::new_from_slice(secret)
            .map_err(|_| BlobError::invalid("signing secret has an unusable length"))?;
        Ok(Self { keyed })
    }

    fn mac(&self, key: &str, expires: i64) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(key.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        mac
    }

    pub fn sign(&self, key: &str, expires: i64) -> String {
        hex::encode(self.mac(key, expires).finalize().into_bytes())
    }

    /// Constant-time signature check, then expiry against `now`.
    pub fn verify(&self, key: &str, expires: i64, signature: &str, now: DateTime<Utc>) -> Result<(), SignatureError> {
        let provided = hex::decode(signature).map_err(|_| SignatureError::Invalid)?;
        self.mac(key, expires)
            .verify_slice(&provided)
            .map_err(|_| SignatureError::Invalid)?;
        if now.timestamp() >= expires {
            return Err(SignatureError::Expired);
        }
        Ok(())
    }
}

/// Objects as files under a root directory.
///
/// Read URLs are `{public_base_url}/{key}?expires={unix}&sig={hex}`; the
/// HTTP layer serves them after [`LocalDiskStore::verify_signed`].
#[derive(Debug, Clone)]
pub struct LocalDiskStore {
    root: PathBuf,
    public_base_url: String,
    signer: UrlSigner,
}

impl LocalDiskStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>, signer: UrlSigner) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            signer,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check a `/blobs/{key}?expires&sig` request.
    pub fn verify_signed(&self, key: &str, expires: i64, signature: &str) -> Result<(), SignatureError> {
        self.signer.verify(key, expires, signature, Utc::now())
    }

    fn object_path(&self, key: &str) -> BlobResult<PathBuf> {
        let safe = !key.ends_with(CONTENT_TYPE_SUFFIX)
            && !key.contains('\\')
            && key
                .split('/')
                .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
        if !safe {
            return Err(BlobError::invalid(format!("key {key:?} is not a relative object path")));
        }
        Ok(self.root.join(key))
    }

    fn content_type_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(CONTENT_TYPE_SUFFIX);
        PathBuf::from(name)
    }

    async fn write_new(&self, key: &StorageKey, path: &Path, mut stream: ByteStream) -> BlobResult<u64> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => {
                    BlobError::invalid(format!("object {key} already exists"))
                }
                _ => BlobError::from_io(key.as_str(), e),
            })?;

        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|e| BlobError::from_io(key.as_str(), e))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| BlobError::from_io(key.as_str(), e))?;
        Ok(written)
    }
}

#[async_trait]
impl ObjectStore for LocalDiskStore {
    async fn put(&self, key: &StorageKey, stream: ByteStream, content_type: &str) -> BlobResult<PutAck> {
        let path = self.object_path(key.as_str())?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| BlobError::from_io(key.as_str(), e))?;
        }

        let size_bytes = self.write_new(key, &path, stream).await?;
        fs::write(Self::content_type_path(&path), content_type)
            .await
            .map_err(|e| BlobError::from_io(key.as_str(), e))?;

        tracing::debug!(key = %key, size_bytes, "wrote object to local disk");
        Ok(PutAck {
            key: key.clone(),
            size_bytes,
            etag: None,
        })
    }

    async fn get(&self, key: &StorageKey) -> BlobResult<GetResult> {
        let path = self.object_path(key.as_str())?;
        let file = fs::File::open(&path)
            .await
            .map_err(|e| BlobError::from_io(key.as_str(), e))?;
        let size_bytes = file.metadata().await.ok().map(|m| m.len());
        let content_type = fs::read_to_string(Self::content_type_path(&path))
            .await
            .ok()
            .map(|ct| ct.trim().to_string())
            .filter(|ct| !ct.is_empty());

        Ok(GetResult {
            stream: Box::pin(ReaderStream::new(file)),
            content_type,
            size_bytes,
        })
    }

    async fn signed_read_url(&self, key: &StorageKey, ttl: Duration) -> BlobResult<SignedUrl> {
        let path = self.object_path(key.as_str())?;
        let exists = fs::try_exists(&path)
            .await
            .map_err(|e| BlobError::from_io(key.as_str(), e))?;
        if !exists {
            return Err(BlobError::not_found(key.as_str()));
        }

        let expires_at = expiry_from_now(ttl);
        let expires = expires_at.timestamp();
        let sig = self.signer.sign(key.as_str(), expires);
        Ok(SignedUrl {
            url: format!("{}/{}?expires={}&sig={}", self.public_base_url, key, expires, sig),
            expires_at,
        })
    }

    async fn delete(&self, key: &StorageKey) -> BlobResult<bool> {
        let path = self.object_path(key.as_str())?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                if let Err(e) = fs::remove_file(Self::content_type_path(&path)).await {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(key = %key, error = %e, "failed to remove content-type sidecar");
                    }
                }
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(BlobError::from_io(key.as_str(), e)),
        }
    }

    fn provider_name(&self) -> &'static str {
        "local"
    }
}
