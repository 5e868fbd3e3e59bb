//! lens-core: framework-agnostic core for the Lens gallery media stack.
//!
//! Holds the pieces every other crate agrees on: identifier newtypes,
//! the asset/container model, Feathers-style errors, the key/value
//! configuration store, and the record-store contract the media
//! pipeline reports into.

pub mod config;
pub mod errors;
pub mod ids;
pub mod model;
pub mod records;

pub use config::{LensConfig, LensConfigSnapshot};
pub use errors::{ErrorKind, LensError, LensResult};
pub use ids::{AssetId, ContainerId, OwnerId, StorageKey};
pub use model::{Asset, Container, FeedEntry, OwnerProfile};
pub use records::{GalleryRecords, MemoryRecords};
