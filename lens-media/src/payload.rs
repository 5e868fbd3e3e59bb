//! `data:<mime>;base64,<payload>` decoding for client-side edited images.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;

use crate::error::{MediaError, MediaResult};
use crate::validate::content_type_essence;

const FALLBACK_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload {
    pub content_type: String,
    pub bytes: Bytes,
}

/// Split on the first comma, read the MIME type from the header, and
/// base64-decode the rest.
///
/// A header without a usable `type/subtype` yields `image/jpeg`. Whitespace
/// inside the payload (line-wrapped base64) is tolerated.
pub fn decode_data_uri(payload: &str) -> MediaResult<DecodedPayload> {
    let (header, body) = payload
        .split_once(',')
        .ok_or_else(|| MediaError::malformed("data URI has no ',' separator"))?;

    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| MediaError::malformed(format!("invalid base64: {e}")))?;

    Ok(DecodedPayload {
        content_type: header_content_type(header),
        bytes: Bytes::from(bytes),
    })
}

fn header_content_type(header: &str) -> String {
    let mime = header.trim().strip_prefix("data:").unwrap_or_default();
    let essence = content_type_essence(mime);
    match essence.split_once('/') {
        Some((kind, sub)) if !kind.is_empty() && !sub.is_empty() => essence,
        _ => FALLBACK_CONTENT_TYPE.to_string(),
    }
}
