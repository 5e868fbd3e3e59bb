//! # Errors (Feathers-style)
//!
//! Lens carries a Feathers-inspired structured error through `anyhow::Error`.
//! Core goals:
//! - consistent status codes + class names
//! - survives `?` across crate boundaries (media pipeline, record store, HTTP)
//! - transport-agnostic (the HTTP crate decides how to serialize)

use std::fmt;

use anyhow::Error as AnyError;
use serde_json::{json, Value};

/// A convenience result type for Lens core APIs.
pub type LensResult<T> = std::result::Result<T, AnyError>;

/// Error classes the Lens stack can produce, each tied to one HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    NotAuthenticated,
    Forbidden,
    NotFound,
    Timeout,
    Gone,
    PayloadTooLarge,
    UnsupportedMedia,
    Unprocessable,
    GeneralError,
    Unavailable,
    InsufficientStorage,
}

impl ErrorKind {
    /// `(status, name, className)`
    const fn meta(self) -> (u16, &'static str, &'static str) {
        match self {
            Self::BadRequest => (400, "BadRequest", "bad-request"),
            Self::NotAuthenticated => (401, "NotAuthenticated", "not-authenticated"),
            Self::Forbidden => (403, "Forbidden", "forbidden"),
            Self::NotFound => (404, "NotFound", "not-found"),
            Self::Timeout => (408, "Timeout", "timeout"),
            Self::Gone => (410, "Gone", "gone"),
            Self::PayloadTooLarge => (413, "PayloadTooLarge", "payload-too-large"),
            Self::UnsupportedMedia => (415, "UnsupportedMedia", "unsupported-media"),
            Self::Unprocessable => (422, "Unprocessable", "unprocessable"),
            Self::GeneralError => (500, "GeneralError", "general-error"),
            Self::Unavailable => (503, "Unavailable", "unavailable"),
            Self::InsufficientStorage => (507, "InsufficientStorage", "insufficient-storage"),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.meta().0
    }

    /// Feathers `name`, e.g. "NotFound".
    pub fn name(&self) -> &'static str {
        self.meta().1
    }

    /// Feathers `className`, kebab-cased.
    pub fn class_name(&self) -> &'static str {
        self.meta().2
    }
}

/// A structured Lens error that can live inside `anyhow::Error`.
///
/// Mirrors Feathers-style fields:
/// - name
/// - message
/// - code (HTTP status)
/// - class_name
/// - data (optional)
/// - errors (optional)
#[derive(Debug)]
pub struct LensError {
    pub kind: ErrorKind,
    pub message: String,
    pub data: Option<Value>,
    pub errors: Option<Value>,
    pub source: Option<AnyError>,
}

impl LensError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
            errors: None,
            source: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_errors(mut self, errors: Value) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    /// Convert into `anyhow::Error` so it flows through `?`.
    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Downcast an `anyhow::Error` to a `LensError` if possible.
    pub fn from_anyhow(err: &AnyError) -> Option<&LensError> {
        err.chain().find_map(|e| e.downcast_ref::<LensError>())
    }

    /// Turn any error into a LensError:
    /// - if it's already a LensError, keep it (lossless)
    /// - otherwise wrap as GeneralError
    pub fn normalize(err: AnyError) -> LensError {
        match err.downcast::<LensError>() {
            Ok(lens) => lens,
            Err(other) => LensError::new(ErrorKind::GeneralError, other.to_string()).with_source(other),
        }
    }

    /// A "safe" version suitable for returning to clients:
    /// keeps kind/message/data/errors and drops the inner `source`.
    pub fn sanitize_for_client(&self) -> LensError {
        LensError {
            kind: self.kind,
            message: self.message.clone(),
            data: self.data.clone(),
            errors: self.errors.clone(),
            source: None,
        }
    }

    /// Feathers-ish JSON payload.
    pub fn to_json(&self) -> Value {
        let mut base = json!({
            "name": self.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        });

        if let Some(d) = &self.data {
            base["data"] = d.clone();
        }
        if let Some(e) = &self.errors {
            base["errors"] = e.clone();
        }
        base
    }

    // ---- Constructors ----

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn not_authenticated(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAuthenticated, msg)
    }
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, msg)
    }
    pub fn gone(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Gone, msg)
    }
    pub fn payload_too_large(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::PayloadTooLarge, msg)
    }
    pub fn unsupported_media(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedMedia, msg)
    }
    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unprocessable, msg)
    }
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, msg)
    }
    pub fn insufficient_storage(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InsufficientStorage, msg)
    }
}

impl fmt::Display for LensError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for LensError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_json_has_feathers_shape() {
        let err = LensError::unprocessable("Invalid upload")
            .with_errors(json!({"file": ["too large"]}));
        let body = err.to_json();

        assert_eq!(body["name"], "Unprocessable");
        assert_eq!(body["code"], 422);
        assert_eq!(body["className"], "unprocessable");
        assert_eq!(body["errors"]["file"][0], "too large");
    }

    #[test]
    fn from_anyhow_finds_error_under_context() {
        let err = LensError::not_found("Photo not found")
            .into_anyhow()
            .context("loading photo");

        let found = LensError::from_anyhow(&err).unwrap();
        assert_eq!(found.kind, ErrorKind::NotFound);
    }

    #[test]
    fn normalize_wraps_foreign_errors() {
        let err = LensError::normalize(anyhow::anyhow!("boom"));
        assert_eq!(err.kind, ErrorKind::GeneralError);
        assert!(err.sanitize_for_client().source.is_none());
    }
}
