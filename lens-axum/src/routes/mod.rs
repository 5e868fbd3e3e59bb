//! Route groups. Each exposes `router()` over [`crate::LensAxumState`].

pub mod blobs;
pub mod feed;
pub mod photos;

use axum::extract::rejection::QueryRejection;
use lens_core::LensError;
use serde_json::json;

pub(crate) fn map_json_error(err: serde_json::Error) -> LensError {
    LensError::bad_request("Failed to parse the request body as JSON").with_errors(json!({"_schema": [err.to_string()]}))
}

pub(crate) fn map_query_rejection(rejection: QueryRejection) -> LensError {
    LensError::bad_request("Failed to parse the query string").with_errors(json!({"_query": [rejection.body_text()]}))
}
