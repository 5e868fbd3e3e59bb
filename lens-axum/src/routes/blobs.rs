use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use lens_blob::{ObjectStore, SignatureError};
use lens_core::{LensError, StorageKey};
use lens_media::MediaError;
use serde::Deserialize;

use crate::{LensAxumError, LensAxumState};

/// Upper bound on how long a served blob may be cached.
const MAX_CACHE_SECS: i64 = 300;

/// Cache no longer than the link stays valid.
fn cache_control(expires: i64, now: i64) -> HeaderValue {
    let max_age = (expires - now).clamp(0, MAX_CACHE_SECS);
    HeaderValue::from_str(&format!("private, max-age={max_age}"))
        .unwrap_or_else(|_| HeaderValue::from_static("no-store"))
}

#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    pub expires: Option<i64>,
    pub sig: Option<String>,
}

/// Serve a local-disk object behind a signed URL.
async fn serve(
    State(state): State<LensAxumState>,
    Path(key): Path<String>,
    query: Result<Query<SignedQuery>, QueryRejection>,
) -> Result<Response, LensAxumError> {
    let Some(store) = state.blobs.as_ref() else {
        return Err(LensError::not_found("No local blob store").into());
    };

    let forbidden = || LensError::forbidden("Invalid signature");
    let Query(query) = query.map_err(|_| forbidden())?;
    let (Some(expires), Some(sig)) = (query.expires, query.sig.as_deref()) else {
        return Err(forbidden().into());
    };
    match store.verify_signed(&key, expires, sig) {
        Ok(()) => {}
        Err(SignatureError::Invalid) => return Err(forbidden().into()),
        Err(SignatureError::Expired) => return Err(LensError::gone("Link expired").into()),
    }

    let object = store.get(&StorageKey::from(key)).await.map_err(MediaError::from)?;
    let mut response = Body::from_stream(object.stream).into_response();
    let headers = response.headers_mut();
    if let Some(value) = object.content_type.and_then(|ct| HeaderValue::from_str(&ct).ok()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Some(size) = object.size_bytes {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));
    }
    headers.insert(header::CACHE_CONTROL, cache_control(expires, Utc::now().timestamp()));
    Ok(response)
}

pub fn router() -> Router<LensAxumState> {
    Router::new().route("/blobs/{*key}", get(serve))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_lifetime_follows_link_expiry() {
        assert_eq!(cache_control(1_060, 1_000), "private, max-age=60");
        assert_eq!(cache_control(10_000, 1_000), "private, max-age=300");
        assert_eq!(cache_control(1_000, 1_000), "private, max-age=0");
        assert_eq!(cache_control(900, 1_000), "private, max-age=0");
    }
}
