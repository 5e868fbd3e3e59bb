use lens_core::LensConfigSnapshot;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3030;
pub const DEFAULT_MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// `http.*` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub host: String,
    pub port: u16,
    /// Cap on a whole request body, multipart included.
    pub max_body_bytes: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl HttpSettings {
    pub fn from_snapshot(config: &LensConfigSnapshot) -> Self {
        let defaults = Self::default();
        Self {
            host: config.get_string("http.host").unwrap_or(defaults.host),
            port: config
                .get_u64("http.port")
                .and_then(|p| u16::try_from(p).ok())
                .unwrap_or(defaults.port),
            max_body_bytes: config
                .get_usize("http.max_body_bytes")
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_body_bytes),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lens_core::LensConfig;

    #[test]
    fn defaults_and_overrides() {
        let empty = HttpSettings::from_snapshot(&LensConfig::new().snapshot());
        assert_eq!(empty, HttpSettings::default());
        assert_eq!(empty.addr(), "127.0.0.1:3030");

        let mut config = LensConfig::new();
        config.set("http.port", "8080");
        config.set("http.max_body_bytes", "1024");
        let http = HttpSettings::from_snapshot(&config.snapshot());
        assert_eq!(http.port, 8080);
        assert_eq!(http.max_body_bytes, 1024);
    }

    #[test]
    fn out_of_range_port_falls_back() {
        let mut config = LensConfig::new();
        config.set("http.port", "70000");
        assert_eq!(HttpSettings::from_snapshot(&config.snapshot()).port, DEFAULT_PORT);
    }
}
