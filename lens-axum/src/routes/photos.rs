use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Path, Query, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use lens_blob::Variant;
use lens_core::{AssetId, ContainerId, LensError};
use lens_media::Download;
use serde::Deserialize;

use crate::routes::{map_json_error, map_query_rejection};
use crate::{multipart, LensAxumError, LensAxumState, RequestCtx};

/// JSON body of a client-edited image upload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedUpload {
    pub data_uri: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    pub variant: Option<String>,
}

/// `display` (default) follows the thumbnail chain, `full` the original one.
fn parse_variant(raw: Option<&str>) -> Result<Variant, LensError> {
    match raw.map(str::trim) {
        None | Some("") | Some("display") | Some("thumbnail") => Ok(Variant::Thumbnail),
        Some("full") | Some("original") => Ok(Variant::Original),
        Some(other) => Err(LensError::bad_request(format!("Unknown variant {other:?}"))
            .with_errors(serde_json::json!({ "variant": ["display", "full"] }))),
    }
}

fn content_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect();
    format!("attachment; filename=\"{safe}\"")
}

async fn upload(
    State(state): State<LensAxumState>,
    RequestCtx(ctx): RequestCtx,
    Path(container_id): Path<String>,
    request: Request,
) -> Result<Response, LensAxumError> {
    let container_id = ContainerId::from(container_id);
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "multipart/form-data" => {
            let files = multipart::read_files(&content_type, request.into_body(), state.max_body_bytes).await?;
            let report = state.photos.upload(&ctx, &container_id, files).await?;
            Ok(Json(report).into_response())
        }
        "application/json" => {
            let bytes = axum::body::to_bytes(request.into_body(), state.max_body_bytes)
                .await
                .map_err(|e| LensError::payload_too_large(format!("Failed to read request body: {e}")))?;
            let body: EncodedUpload = serde_json::from_slice(&bytes).map_err(map_json_error)?;
            let asset = state
                .photos
                .upload_encoded(&ctx, &container_id, &body.data_uri, body.file_name.as_deref())
                .await?;
            Ok((StatusCode::CREATED, Json(asset)).into_response())
        }
        _ => Err(LensError::unsupported_media("Expected multipart/form-data or application/json").into()),
    }
}

async fn list(
    State(state): State<LensAxumState>,
    RequestCtx(ctx): RequestCtx,
    Path(container_id): Path<String>,
) -> Result<Response, LensAxumError> {
    let views = state.photos.list(&ctx, &ContainerId::from(container_id)).await?;
    Ok(Json(views).into_response())
}

async fn signed_url(
    State(state): State<LensAxumState>,
    RequestCtx(ctx): RequestCtx,
    Path((container_id, asset_id)): Path<(String, String)>,
    query: Result<Query<UrlQuery>, QueryRejection>,
) -> Result<Response, LensAxumError> {
    let Query(query) = query.map_err(map_query_rejection)?;
    let variant = parse_variant(query.variant.as_deref())?;
    let resolved = state
        .photos
        .resolve_url(&ctx, &ContainerId::from(container_id), &AssetId::from(asset_id), variant)
        .await?;
    Ok(Json(resolved).into_response())
}

async fn download(
    State(state): State<LensAxumState>,
    RequestCtx(ctx): RequestCtx,
    Path((container_id, asset_id)): Path<(String, String)>,
) -> Result<Response, LensAxumError> {
    let download = state
        .photos
        .download(&ctx, &ContainerId::from(container_id), &AssetId::from(asset_id))
        .await?;

    Ok(match download {
        Download::Stream {
            stream,
            content_type,
            file_name,
        } => (
            [
                (header::CONTENT_TYPE, content_type),
                (header::CONTENT_DISPOSITION, content_disposition(&file_name)),
            ],
            Body::from_stream(stream),
        )
            .into_response(),
        Download::Redirect(path) => (StatusCode::FOUND, [(header::LOCATION, path)]).into_response(),
    })
}

async fn remove(
    State(state): State<LensAxumState>,
    RequestCtx(ctx): RequestCtx,
    Path((container_id, asset_id)): Path<(String, String)>,
) -> Result<StatusCode, LensAxumError> {
    state
        .photos
        .delete(&ctx, &ContainerId::from(container_id), &AssetId::from(asset_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<LensAxumState> {
    Router::new()
        .route("/galleries/{container_id}/photos", get(list).post(upload))
        .route("/galleries/{container_id}/photos/{asset_id}", axum::routing::delete(remove))
        .route("/galleries/{container_id}/photos/{asset_id}/url", get(signed_url))
        .route("/galleries/{container_id}/photos/{asset_id}/download", get(download))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_parse() {
        assert_eq!(parse_variant(None).unwrap(), Variant::Thumbnail);
        assert_eq!(parse_variant(Some("display")).unwrap(), Variant::Thumbnail);
        assert_eq!(parse_variant(Some("full")).unwrap(), Variant::Original);
        assert_eq!(parse_variant(Some("huge")).unwrap_err().code(), 400);
    }

    #[test]
    fn disposition_strips_quotes() {
        assert_eq!(content_disposition("a\"b.jpg"), "attachment; filename=\"ab.jpg\"");
    }
}
