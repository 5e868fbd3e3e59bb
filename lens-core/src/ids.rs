//! Identifier newtypes shared by every Lens crate.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new<S: Into<String>>(id: S) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// The authenticated user that owns containers and assets.
    OwnerId
);

string_id!(
    /// A gallery (collection) that assets belong to.
    ContainerId
);

string_id!(
    /// Identity of one persisted asset record.
    AssetId
);

impl AssetId {
    /// Generate a new random asset id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
}

string_id!(
    /// Opaque object-store key, `{owner}/{container}/{variant}/{unique}{ext}`.
    ///
    /// Assigned once at upload and never reused after deletion.
    StorageKey
);
