//! Reads `multipart/form-data` uploads into [`IncomingFile`]s.
//!
//! Uses multer directly over the request body stream so the whole-body cap
//! can be enforced while reading, instead of buffering first.

use axum::body::Body;
use lens_core::LensError;
use lens_media::IncomingFile;
use serde_json::json;

/// Form field names that carry files.
pub const FILE_FIELDS: [&str; 2] = ["files", "files[]"];

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

fn map_multer(err: multer::Error) -> LensError {
    match err {
        multer::Error::StreamSizeExceeded { limit } => {
            LensError::payload_too_large(format!("Request body exceeds {limit} bytes"))
        }
        multer::Error::FieldSizeExceeded { limit, .. } => {
            LensError::payload_too_large(format!("Upload field exceeds {limit} bytes"))
        }
        other => LensError::bad_request("Failed to parse multipart data")
            .with_errors(json!({ "_schema": [other.to_string()] })),
    }
}

/// Collect every file part, in form order. Text fields are ignored, and so are
/// empty parts without a file name (an unused `<input type="file">`).
pub async fn read_files(content_type: &str, body: Body, max_body_bytes: usize) -> Result<Vec<IncomingFile>, LensError> {
    let boundary = multer::parse_boundary(content_type).map_err(map_multer)?;
    let constraints =
        multer::Constraints::new().size_limit(multer::SizeLimit::new().whole_stream(max_body_bytes as u64));
    let mut multipart = multer::Multipart::with_constraints(body.into_data_stream(), boundary, constraints);

    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(map_multer)? {
        let is_file = field.name().is_some_and(|name| FILE_FIELDS.contains(&name));
        if !is_file {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .map(|mime| mime.to_string())
            .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());
        let bytes = field.bytes().await.map_err(map_multer)?;

        if file_name.is_empty() && bytes.is_empty() {
            continue;
        }
        tracing::debug!(file = %file_name, content_type = %content_type, size = bytes.len(), "multipart file read");
        files.push(IncomingFile::new(file_name, content_type, bytes));
    }

    if files.is_empty() {
        return Err(LensError::bad_request("No files in upload").with_errors(json!({ "files": ["required"] })));
    }
    Ok(files)
}
