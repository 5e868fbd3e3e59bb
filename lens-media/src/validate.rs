use bytes::Bytes;

use crate::config::MediaConfig;
use crate::error::{RejectReason, Rejection};

/// One file as received from the caller.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl IncomingFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Lowercase MIME type without parameters.
    pub fn essence(&self) -> String {
        content_type_essence(&self.content_type)
    }
}

pub(crate) fn content_type_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Classify a file as acceptable or not. Never touches storage.
///
/// Checks run in order: empty, size, content type. The content type is the
/// declared one; the bytes are not sniffed.
pub fn validate(file: &IncomingFile, config: &MediaConfig) -> Result<(), Rejection> {
    let reject = |reason| {
        Err(Rejection {
            file_name: file.file_name.clone(),
            reason,
        })
    };

    let size_bytes = file.size_bytes();
    if size_bytes == 0 {
        return reject(RejectReason::Empty);
    }
    if size_bytes > config.max_file_bytes {
        return reject(RejectReason::TooLarge {
            size_bytes,
            max_bytes: config.max_file_bytes,
        });
    }

    let essence = file.essence();
    if !config.allows(&essence) {
        return reject(RejectReason::UnsupportedType {
            content_type: file.content_type.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MediaConfig {
        MediaConfig::default().with_max_file_bytes(10)
    }

    #[test]
    fn empty_and_oversized_files_are_rejected() {
        let empty = IncomingFile::new("a.png", "image/png", Bytes::new());
        assert_eq!(validate(&empty, &config()).unwrap_err().reason, RejectReason::Empty);

        let big = IncomingFile::new("b.png", "image/png", vec![0u8; 11]);
        let rejection = validate(&big, &config()).unwrap_err();
        assert_eq!(rejection.file_name, "b.png");
        assert_eq!(
            rejection.reason,
            RejectReason::TooLarge {
                size_bytes: 11,
                max_bytes: 10
            }
        );

        let exact = IncomingFile::new("c.png", "image/png", vec![0u8; 10]);
        assert!(validate(&exact, &config()).is_ok());
    }

    #[test]
    fn type_outside_allow_list_is_rejected_whatever_the_bytes() {
        // a real PNG signature does not rescue a disallowed declared type
        let png_magic = vec![0x89, b'P', b'N', b'G'];
        let file = IncomingFile::new("x.png", "application/octet-stream", png_magic);
        assert!(matches!(
            validate(&file, &config()).unwrap_err().reason,
            RejectReason::UnsupportedType { .. }
        ));
    }

    #[test]
    fn content_type_parameters_and_case_are_ignored() {
        let file = IncomingFile::new("x.jpg", "Image/JPEG; charset=binary", vec![1u8; 3]);
        assert!(validate(&file, &config()).is_ok());
    }
}
