use uuid::Uuid;

use lens_core::{ContainerId, OwnerId, StorageKey};

use crate::Variant;

/// What the caller knows about the bytes a key will hold.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeySource<'a> {
    pub file_name: Option<&'a str>,
    pub content_type: Option<&'a str>,
}

impl<'a> KeySource<'a> {
    pub fn new(file_name: Option<&'a str>, content_type: Option<&'a str>) -> Self {
        Self {
            file_name,
            content_type,
        }
    }
}

/// Strategy for generating object keys
pub trait KeyScheme: Send + Sync {
    /// A fresh key for one variant of one asset. Never returns the same key twice.
    fn make_key(
        &self,
        owner_id: &OwnerId,
        container_id: &ContainerId,
        variant: Variant,
        source: KeySource<'_>,
    ) -> StorageKey;

    /// Prefix shared by every key of one owner's container.
    fn container_prefix(&self, owner_id: &OwnerId, container_id: &ContainerId) -> String;
}

/// `{owner}/{container}/{variant}/{uuid}{ext}`
///
/// The unique part is a v4 UUID. User input only ever contributes the
/// owner/container segments (sanitized) and the original's extension.
#[derive(Debug, Clone, Default)]
pub struct DefaultKeyScheme;

impl KeyScheme for DefaultKeyScheme {
    fn make_key(
        &self,
        owner_id: &OwnerId,
        container_id: &ContainerId,
        variant: Variant,
        source: KeySource<'_>,
    ) -> StorageKey {
        let ext = match variant {
            Variant::Thumbnail => ".jpg".to_string(),
            Variant::Original => original_extension(source),
        };
        StorageKey::new(format!(
            "{}{}/{}{}",
            self.container_prefix(owner_id, container_id),
            variant.as_str(),
            Uuid::new_v4().simple(),
            ext
        ))
    }

    fn container_prefix(&self, owner_id: &OwnerId, container_id: &ContainerId) -> String {
        format!(
            "{}/{}/",
            sanitize_segment(owner_id.as_str()),
            sanitize_segment(container_id.as_str())
        )
    }
}

/// Extension used for a content type, with the leading dot.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(".jpg"),
        "image/png" => Some(".png"),
        "image/gif" => Some(".gif"),
        "image/webp" => Some(".webp"),
        _ => None,
    }
}

fn original_extension(source: KeySource<'_>) -> String {
    source
        .file_name
        .and_then(file_extension)
        .or_else(|| {
            source
                .content_type
                .and_then(extension_for_content_type)
                .map(str::to_string)
        })
        .unwrap_or_default()
}

fn file_extension(file_name: &str) -> Option<String> {
    let base = file_name.rsplit(|c: char| c == '/' || c == '\\').next()?;
    let (stem, ext) = base.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 10 {
        return None;
    }
    if !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(format!(".{}", ext.to_ascii_lowercase()))
}

fn sanitize_segment(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}
