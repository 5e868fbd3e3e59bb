//! # lens-media: ingestion and delivery for gallery images
//!
//! Accepts uploaded images, validates them, stores an original plus a JPEG
//! thumbnail through an injected [`lens_blob::ObjectStore`], and later turns
//! stored keys back into signed URLs, download streams and deletions.
//!
//! ```text
//! upload ─► validate ─► put original ─► make_thumbnail ─► put thumbnail ─► Asset
//!                                         (blocking pool)                   │
//!                                                                 record store commit
//! ```
//!
//! [`PhotoService`] is the gallery-scoped entry point used by the HTTP layer;
//! [`MediaPipeline`] is the storage-only core underneath it.

mod config;
mod error;
mod feed;
mod payload;
mod pipeline;
mod service;
mod transcoder;
mod validate;

pub use config::{FeedConfig, MediaConfig};
pub use error::{MediaError, MediaErrorKind, MediaResult, RejectReason, Rejection};
pub use feed::{shuffled_window, window, FeedItem, FeedPage, FeedSampler};
pub use payload::{decode_data_uri, DecodedPayload};
pub use pipeline::{
    DeleteReport, Download, MediaCtx, MediaPipeline, ObjectRemoval, ResolvedUrl, UploadOutcome, UploadReport,
    UrlSource, PLACEHOLDER_URL,
};
pub use service::{AssetView, PhotoService};
pub use transcoder::{fit_within, JpegThumbnailer, Thumbnail, Transcoder, THUMBNAIL_CONTENT_TYPE};
pub use validate::{validate, IncomingFile};
