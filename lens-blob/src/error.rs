use thiserror::Error;

/// Result type for object store operations
pub type BlobResult<T> = Result<T, BlobError>;

/// Errors raised by object store backends
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Object not found: {key}")]
    NotFound { key: String },

    #[error("Storage unavailable: {message}")]
    StorageUnavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Storage quota exceeded while writing {key}")]
    QuotaExceeded { key: String },

    #[error("Invalid request: {message}")]
    Invalid { message: String },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl BlobError {
    /// Create a not found error
    pub fn not_found<S: Into<String>>(key: S) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Transport, auth or backend failure without an underlying error value
    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Transport, auth or backend failure caused by `error`
    pub fn backend<S, E>(message: S, error: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::StorageUnavailable {
            message: message.into(),
            source: Some(Box::new(error)),
        }
    }

    pub fn quota_exceeded<S: Into<String>>(key: S) -> Self {
        Self::QuotaExceeded { key: key.into() }
    }

    /// Create an invalid request error
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Classify a filesystem error raised while touching `key`.
    pub fn from_io(key: &str, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(key),
            std::io::ErrorKind::StorageFull => Self::quota_exceeded(key),
            _ => Self::backend(format!("filesystem error on {key}"), error),
        }
    }
}
