use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use lens_core::LensConfigSnapshot;

use crate::local::{LocalDiskStore, UrlSigner};
use crate::memory::MemoryStore;
use crate::s3::{S3Settings, S3Store};
use crate::{BlobError, BlobResult, ObjectStore};

/// Which backend the process writes to. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageProvider {
    #[default]
    Local,
    S3,
    Memory,
}

impl FromStr for StorageProvider {
    type Err = BlobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "disk" => Ok(Self::Local),
            "s3" => Ok(Self::S3),
            "memory" => Ok(Self::Memory),
            other => Err(BlobError::invalid(format!(
                "unknown storage.provider {other:?} (expected local, s3 or memory)"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocalSettings {
    pub root: PathBuf,
    pub public_base_url: String,
    /// `None` means a random per-process secret: URLs die with the process.
    pub signing_secret: Option<String>,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./data/blobs"),
            public_base_url: "/blobs".to_string(),
            signing_secret: None,
        }
    }
}

/// Storage section of the process configuration
#[derive(Debug, Clone, Default)]
pub struct StorageSettings {
    pub provider: StorageProvider,
    pub local: LocalSettings,
    pub s3: S3Settings,
    /// Only enforced by the memory backend; disk and S3 report their own limits.
    pub quota_bytes: Option<u64>,
}

impl StorageSettings {
    /// Read `storage.*` keys. An unknown provider is an error, never a fallback.
    pub fn from_snapshot(config: &LensConfigSnapshot) -> BlobResult<Self> {
        let provider = match config.get("storage.provider") {
            Some(raw) => raw.parse()?,
            None => StorageProvider::default(),
        };

        let defaults = LocalSettings::default();
        let local = LocalSettings {
            root: config
                .get_string("storage.local.root")
                .map(PathBuf::from)
                .unwrap_or(defaults.root),
            public_base_url: config
                .get_string("storage.local.public_base_url")
                .unwrap_or(defaults.public_base_url),
            signing_secret: config
                .get_string("storage.local.signing_secret")
                .filter(|s| !s.is_empty()),
        };

        let s3 = S3Settings {
            bucket: config.get_string("storage.s3.bucket").unwrap_or_default(),
            region: config
                .get_string("storage.s3.region")
                .unwrap_or_else(|| "us-east-1".to_string()),
            endpoint_url: config.get_string("storage.s3.endpoint_url"),
            access_key_id: config.get_string("storage.s3.access_key_id"),
            secret_access_key: config.get_string("storage.s3.secret_access_key"),
        };

        Ok(Self {
            provider,
            local,
            s3,
            quota_bytes: config.get_u64("storage.quota_bytes"),
        })
    }
}

/// The selected store, plus the local-disk handle when signed URLs must be
/// served in-process.
#[derive(Clone)]
pub struct OpenedStore {
    pub store: Arc<dyn ObjectStore>,
    pub local: Option<Arc<LocalDiskStore>>,
}

/// Build the one backend `settings` selects.
pub async fn open_store(settings: &StorageSettings) -> BlobResult<OpenedStore> {
    match settings.provider {
        StorageProvider::Memory => {
            let mut store = MemoryStore::new();
            if let Some(quota) = settings.quota_bytes {
                store = store.with_quota(quota);
            }
            tracing::info!(provider = "memory", "object store ready");
            Ok(OpenedStore {
                store: Arc::new(store),
                local: None,
            })
        }
        StorageProvider::Local => {
            let secret = match &settings.local.signing_secret {
                Some(secret) => secret.clone(),
                None => {
                    tracing::warn!("storage.local.signing_secret not set; signed URLs will not survive a restart");
                    uuid::Uuid::new_v4().simple().to_string()
                }
            };
            tokio::fs::create_dir_all(&settings.local.root).await?;
            let local = Arc::new(LocalDiskStore::new(
                settings.local.root.clone(),
                settings.local.public_base_url.clone(),
                UrlSigner::new(secret)?,
            ));
            tracing::info!(provider = "local", root = %settings.local.root.display(), "object store ready");
            Ok(OpenedStore {
                store: local.clone(),
                local: Some(local),
            })
        }
        StorageProvider::S3 => {
            let store = S3Store::connect(settings.s3.clone()).await?;
            tracing::info!(provider = "s3", bucket = %settings.s3.bucket, "object store ready");
            Ok(OpenedStore {
                store: Arc::new(store),
                local: None,
            })
        }
    }
}
