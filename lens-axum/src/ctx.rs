use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use lens_core::LensError;
use lens_media::MediaCtx;

use crate::LensAxumError;

pub const OWNER_HEADER: &str = "x-owner-id";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// The authenticated owner plus request id, as a pipeline context.
///
/// Authentication happens upstream; this only reads `x-owner-id` and
/// answers 401 when it is missing.
#[derive(Debug, Clone)]
pub struct RequestCtx(pub MediaCtx);

impl RequestCtx {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, LensError> {
        let owner = header(headers, OWNER_HEADER).ok_or_else(|| LensError::not_authenticated("Missing owner identity"))?;
        let mut ctx = MediaCtx::new(owner);
        if let Some(id) = header(headers, REQUEST_ID_HEADER) {
            ctx = ctx.with_request_id(id);
        }
        Ok(Self(ctx))
    }
}

impl<S> FromRequestParts<S> for RequestCtx
where
    S: Send + Sync,
{
    type Rejection = LensAxumError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn owner_header_is_required() {
        let err = RequestCtx::from_headers(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.code(), 401);

        let mut headers = HeaderMap::new();
        headers.insert(OWNER_HEADER, HeaderValue::from_static("  "));
        assert!(RequestCtx::from_headers(&headers).is_err());
    }

    #[test]
    fn request_id_is_carried() {
        let mut headers = HeaderMap::new();
        headers.insert(OWNER_HEADER, HeaderValue::from_static("alice"));
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("req-1"));
        let RequestCtx(ctx) = RequestCtx::from_headers(&headers).unwrap();
        assert_eq!(ctx.owner_id.as_str(), "alice");
        assert_eq!(ctx.request_id, "req-1");
    }
}
