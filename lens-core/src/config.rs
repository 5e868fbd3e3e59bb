//! # Lens configuration
//!
//! A minimal string key/value store, in the spirit of Feathers'
//! `app.set()` / `app.get()`. Crates read typed values from an immutable
//! [`LensConfigSnapshot`] and fall back to their own defaults.
//!
//! ```rust
//! use lens_core::LensConfig;
//!
//! let mut config = LensConfig::new();
//! config.set("feed.page_size", "24");
//!
//! let snapshot = config.snapshot();
//! assert_eq!(snapshot.get_usize("feed.page_size"), Some(24));
//! ```
//!
//! ## Environment overrides
//!
//! [`LensConfig::load_env`] maps prefixed variables onto dotted keys:
//!
//! ```bash
//! export LENS__MEDIA__MAX_FILE_BYTES=10485760   # media.max_file_bytes
//! export LENS__STORAGE__PROVIDER=s3             # storage.provider
//! ```

use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub struct LensConfig {
    values: HashMap<String, String>,
}

impl LensConfig {
    /// Create an empty config store.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Build a config from the process environment (see [`LensConfig::load_env`]).
    pub fn from_env(prefix: &str) -> Self {
        let mut config = Self::new();
        config.load_env(prefix);
        config
    }

    /// Set a configuration key to a string value.
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Get a configuration value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    /// Check whether a key is present.
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Import every `{prefix}SECTION__NAME` variable as `section.name`.
    ///
    /// `LENS__FEED__PAGE_SIZE=12` with prefix `LENS__` → `feed.page_size = "12"`.
    pub fn load_env(&mut self, prefix: &str) {
        self.load_pairs(prefix, std::env::vars());
    }

    fn load_pairs<I>(&mut self, prefix: &str, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(prefix) {
                let normalized = stripped.to_lowercase().replace("__", ".");
                self.set(normalized, value);
            }
        }
    }

    pub fn snapshot(&self) -> LensConfigSnapshot {
        LensConfigSnapshot::new(self.values.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LensConfigSnapshot {
    map: HashMap<String, String>,
}

impl LensConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.trim().parse::<usize>().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    /// Reads a whole number of seconds.
    pub fn get_duration_secs(&self, key: &str) -> Option<Duration> {
        self.get_u64(key).map(Duration::from_secs)
    }

    /// Reads a comma-separated list, trimming and dropping empty items.
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        self.get(key).map(|v| {
            v.split(',')
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_pairs_map_to_dotted_keys() {
        let mut config = LensConfig::new();
        config.load_pairs(
            "LENS__",
            vec![
                ("LENS__MEDIA__MAX_FILE_BYTES".to_string(), "1024".to_string()),
                ("LENS__STORAGE__PROVIDER".to_string(), "s3".to_string()),
                ("OTHER__FEED__PAGE_SIZE".to_string(), "3".to_string()),
            ],
        );

        let snapshot = config.snapshot();
        assert_eq!(snapshot.get_u64("media.max_file_bytes"), Some(1024));
        assert_eq!(snapshot.get("storage.provider"), Some("s3"));
        assert!(snapshot.get("feed.page_size").is_none());
    }

    #[test]
    fn typed_getters_ignore_garbage() {
        let mut config = LensConfig::new();
        config.set("feed.page_size", "many");
        config.set("media.allowed_content_types", "image/png, ,image/gif");
        config.set("media.signed_url_ttl_secs", "60");

        let snapshot = config.snapshot();
        assert_eq!(snapshot.get_usize("feed.page_size"), None);
        assert_eq!(
            snapshot.get_list("media.allowed_content_types"),
            Some(vec!["image/png".to_string(), "image/gif".to_string()])
        );
        assert_eq!(
            snapshot.get_duration_secs("media.signed_url_ttl_secs"),
            Some(Duration::from_secs(60))
        );
    }
}
