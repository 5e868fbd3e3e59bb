use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lens_core::LensError;
use lens_media::MediaError;

#[derive(Debug)]
pub struct LensAxumError(pub anyhow::Error);

impl From<anyhow::Error> for LensAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<LensError> for LensAxumError {
    fn from(e: LensError) -> Self {
        Self(e.into_anyhow())
    }
}

impl From<MediaError> for LensAxumError {
    fn from(e: MediaError) -> Self {
        LensError::from(e).into()
    }
}

impl IntoResponse for LensAxumError {
    fn into_response(self) -> Response {
        // A LensError anywhere in the chain keeps its Feathers-style fields.
        if let Some(lens) = LensError::from_anyhow(&self.0) {
            let safe = lens.sanitize_for_client();
            let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            if status.is_server_error() {
                tracing::error!(error = %format!("{:#}", self.0), status = status.as_u16(), "request failed");
            }
            return (status, Json(safe.to_json())).into_response();
        }

        tracing::error!(error = %format!("{:#}", self.0), "unhandled error");
        let lens = LensError::general_error(self.0.to_string());
        let safe = lens.sanitize_for_client();
        let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(safe.to_json())).into_response()
    }
}
