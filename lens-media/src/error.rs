use serde::Serialize;
use thiserror::Error;

use lens_blob::BlobError;
use lens_core::LensError;

pub type MediaResult<T> = Result<T, MediaError>;

/// Why a file was refused before any storage write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "camelCase")]
pub enum RejectReason {
    Empty,
    #[serde(rename_all = "camelCase")]
    TooLarge { size_bytes: u64, max_bytes: u64 },
    #[serde(rename_all = "camelCase")]
    UnsupportedType { content_type: String },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::Empty => f.write_str("file is empty"),
            RejectReason::TooLarge { size_bytes, max_bytes } => {
                write!(f, "file is {size_bytes} bytes, limit is {max_bytes}")
            }
            RejectReason::UnsupportedType { content_type } => {
                write!(f, "content type {content_type:?} is not allowed")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rejection {
    pub file_name: String,
    pub reason: RejectReason,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.file_name, self.reason)
    }
}

/// Failure taxonomy of the media pipeline.
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Rejected {0}")]
    ValidationRejected(Rejection),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    #[error(transparent)]
    Storage(#[from] BlobError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Record store error: {0:#}")]
    Records(anyhow::Error),
}

/// Coarse classification used for logging and HTTP mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaErrorKind {
    ValidationRejected,
    MalformedPayload,
    UnsupportedImage,
    StorageUnavailable,
    QuotaExceeded,
    NotFound,
    Cancelled,
    Internal,
}

impl MediaError {
    pub fn not_found<S: Into<String>>(what: S) -> Self {
        Self::NotFound(what.into())
    }

    pub fn malformed<S: Into<String>>(why: S) -> Self {
        Self::MalformedPayload(why.into())
    }

    pub fn kind(&self) -> MediaErrorKind {
        match self {
            MediaError::ValidationRejected(_) => MediaErrorKind::ValidationRejected,
            MediaError::MalformedPayload(_) => MediaErrorKind::MalformedPayload,
            MediaError::UnsupportedImage(_) => MediaErrorKind::UnsupportedImage,
            MediaError::Storage(BlobError::NotFound { .. }) => MediaErrorKind::NotFound,
            MediaError::Storage(BlobError::QuotaExceeded { .. }) => MediaErrorKind::QuotaExceeded,
            MediaError::Storage(BlobError::StorageUnavailable { .. }) | MediaError::Storage(BlobError::Io { .. }) => {
                MediaErrorKind::StorageUnavailable
            }
            MediaError::Storage(_) | MediaError::Records(_) => MediaErrorKind::Internal,
            MediaError::NotFound(_) => MediaErrorKind::NotFound,
            MediaError::Cancelled => MediaErrorKind::Cancelled,
        }
    }
}

impl From<MediaError> for LensError {
    fn from(err: MediaError) -> Self {
        let message = err.to_string();
        match err.kind() {
            MediaErrorKind::ValidationRejected => {
                let data = match &err {
                    MediaError::ValidationRejected(rejection) => serde_json::to_value(rejection).ok(),
                    _ => None,
                };
                let lens = LensError::unprocessable(message);
                match data {
                    Some(data) => lens.with_data(data),
                    None => lens,
                }
            }
            MediaErrorKind::MalformedPayload => LensError::bad_request(message),
            MediaErrorKind::UnsupportedImage => LensError::unsupported_media(message),
            MediaErrorKind::NotFound => LensError::not_found(message),
            MediaErrorKind::StorageUnavailable => LensError::unavailable(message),
            MediaErrorKind::QuotaExceeded => LensError::insufficient_storage(message),
            MediaErrorKind::Cancelled => LensError::timeout(message),
            MediaErrorKind::Internal => LensError::general_error(message).with_source(anyhow::Error::new(err)),
        }
    }
}
