//! lens-axum: HTTP surface for Lens.
//!
//! Routes gallery photo operations, the discovery feed and local signed
//! blobs onto [`lens_media::PhotoService`] and [`lens_media::FeedSampler`].
//! Errors leave as Feathers-style JSON through [`LensAxumError`].

pub mod app;
pub mod config;
pub mod ctx;
pub mod multipart;
pub mod routes;
pub mod state;
mod error;
pub use error::LensAxumError;
pub use state::LensAxumState;

pub use app::{axum, AxumApp};
pub use config::HttpSettings;
pub use ctx::RequestCtx;
