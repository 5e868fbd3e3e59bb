//! Gallery records as the media stack sees them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::LensError;
use crate::ids::{AssetId, ContainerId, OwnerId, StorageKey};

/// A gallery owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub id: ContainerId,
    pub owner_id: OwnerId,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Container {
    pub fn new(id: impl Into<ContainerId>, owner_id: impl Into<OwnerId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            title: title.into(),
            description: None,
            created_at: Utc::now(),
        }
    }
}

/// Public-facing bits of a user account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerProfile {
    pub id: OwnerId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl OwnerProfile {
    /// "First Last", else the email, else "Unknown".
    pub fn display_name(&self) -> String {
        let full = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        let full = full.trim();
        if !full.is_empty() {
            return full.to_string();
        }
        self.email
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or("Unknown")
            .to_string()
    }
}

/// One uploaded image: an original object plus an optional JPEG thumbnail.
///
/// Assets are immutable once persisted; an edit produces a new asset.
/// Records that predate object-store keys carry `legacy_path` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: AssetId,
    pub owner_id: OwnerId,
    pub container_id: ContainerId,
    pub original_key: Option<StorageKey>,
    pub thumbnail_key: Option<StorageKey>,
    pub legacy_path: Option<String>,
    pub legacy_thumbnail_path: Option<String>,
    pub content_type: Option<String>,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub storage_provider: Option<String>,
}

impl Asset {
    /// An asset freshly written to the object store.
    pub fn stored(
        owner_id: OwnerId,
        container_id: ContainerId,
        original_key: StorageKey,
        content_type: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        Self {
            id: AssetId::generate(),
            owner_id,
            container_id,
            original_key: Some(original_key),
            thumbnail_key: None,
            legacy_path: None,
            legacy_thumbnail_path: None,
            content_type: Some(content_type.into()),
            size_bytes,
            created_at: Utc::now(),
            storage_provider: None,
        }
    }

    /// A record from before storage keys existed, addressed by a public path.
    pub fn legacy(
        owner_id: OwnerId,
        container_id: ContainerId,
        legacy_path: impl Into<String>,
    ) -> Self {
        Self {
            id: AssetId::generate(),
            owner_id,
            container_id,
            original_key: None,
            thumbnail_key: None,
            legacy_path: Some(legacy_path.into()),
            legacy_thumbnail_path: None,
            content_type: None,
            size_bytes: 0,
            created_at: Utc::now(),
            storage_provider: None,
        }
    }

    pub fn with_thumbnail_key(mut self, key: StorageKey) -> Self {
        self.thumbnail_key = Some(key);
        self
    }

    pub fn with_legacy_thumbnail_path(mut self, path: impl Into<String>) -> Self {
        self.legacy_thumbnail_path = Some(path.into());
        self
    }

    pub fn with_storage_provider(mut self, provider: impl Into<String>) -> Self {
        self.storage_provider = Some(provider.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Checks the invariants a record must hold before it is persisted.
    pub fn check_persistable(&self) -> Result<(), LensError> {
        let has_original = self
            .original_key
            .as_ref()
            .is_some_and(|k| !k.as_str().is_empty());
        let has_legacy = self
            .legacy_path
            .as_deref()
            .is_some_and(|p| !p.trim().is_empty());

        if !has_original && !has_legacy {
            return Err(LensError::unprocessable(format!(
                "Asset {} has no original object",
                self.id
            )));
        }
        if has_original && self.size_bytes == 0 {
            return Err(LensError::unprocessable(format!(
                "Asset {} has an empty original",
                self.id
            )));
        }
        if let Some(thumb) = &self.thumbnail_key {
            if !thumb.as_str().ends_with(".jpg") {
                return Err(LensError::unprocessable(format!(
                    "Thumbnail {} is not a JPEG object",
                    thumb
                )));
            }
        }
        Ok(())
    }
}

/// A feed row: an asset joined with its gallery and owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedEntry {
    pub asset: Asset,
    pub container_title: Option<String>,
    pub owner: Option<OwnerProfile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> OwnerId {
        OwnerId::new("u1")
    }

    #[test]
    fn asset_without_original_is_not_persistable() {
        let mut asset = Asset::legacy(owner(), ContainerId::new("g1"), "/uploads/a.jpg");
        asset.legacy_path = None;
        assert!(asset.check_persistable().is_err());
    }

    #[test]
    fn thumbnail_must_be_jpeg() {
        let asset = Asset::stored(
            owner(),
            ContainerId::new("g1"),
            StorageKey::new("u1/g1/original/abc.png"),
            "image/png",
            10,
        )
        .with_thumbnail_key(StorageKey::new("u1/g1/thumbnail/abc.png"));

        assert!(asset.check_persistable().is_err());
    }

    #[test]
    fn display_name_falls_back_to_email_then_unknown() {
        let mut profile = OwnerProfile {
            id: owner(),
            first_name: Some(" ".to_string()),
            last_name: None,
            email: Some("ada@example.com".to_string()),
        };
        assert_eq!(profile.display_name(), "ada@example.com");

        profile.email = None;
        assert_eq!(profile.display_name(), "Unknown");

        profile.first_name = Some("Ada".to_string());
        profile.last_name = Some("Lovelace".to_string());
        assert_eq!(profile.display_name(), "Ada Lovelace");
    }
}
