//! # lens-blob: object storage for the Lens media stack
//!
//! A small, capability-polymorphic [`ObjectStore`] trait (put, get,
//! signed read URL, idempotent delete) with three backends, and the
//! [`KeyScheme`] that decides where each asset variant lives.
//!
//! ```text
//! ┌─────────────────┐
//! │  MediaPipeline  │  ← lens-media
//! ├─────────────────┤
//! │   KeyScheme     │  ← {owner}/{container}/{variant}/{uuid}{ext}
//! ├─────────────────┤
//! │   ObjectStore   │  ← memory | local disk | S3-compatible
//! └─────────────────┘
//! ```
//!
//! ```rust
//! use lens_blob::{bytes_stream, DefaultKeyScheme, KeyScheme, KeySource, MemoryStore, ObjectStore, Variant};
//! use lens_core::{ContainerId, OwnerId};
//!
//! # #[tokio::main]
//! # async fn main() -> lens_blob::BlobResult<()> {
//! let store = MemoryStore::new();
//! let key = DefaultKeyScheme.make_key(
//!     &OwnerId::new("u1"),
//!     &ContainerId::new("g1"),
//!     Variant::Original,
//!     KeySource::new(Some("beach.png"), Some("image/png")),
//! );
//!
//! store.put(&key, bytes_stream(&b"..."[..]), "image/png").await?;
//! let url = store.signed_read_url(&key, std::time::Duration::from_secs(60)).await?;
//! assert!(url.url.contains("/original/"));
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod keys;
mod local;
mod memory;
mod s3;
pub mod store;
mod types;

pub use config::{open_store, LocalSettings, OpenedStore, StorageProvider, StorageSettings};
pub use error::{BlobError, BlobResult};
pub use keys::{extension_for_content_type, DefaultKeyScheme, KeyScheme, KeySource};
pub use local::{LocalDiskStore, SignatureError, UrlSigner};
pub use memory::MemoryStore;
pub use s3::{S3Settings, S3Store};
pub use store::ObjectStore;
pub use types::{bytes_stream, collect_stream, ByteStream, GetResult, PutAck, SignedUrl, Variant};
