use serde::Deserialize;

/// Top-level configuration settings for the session-state layer.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub store: StoreSettings,
    pub logging: LoggingSettings,
}

/// Configuration of the backing key-value store.
///
/// `path` is where the store lives on disk, `key_prefix` is the first
/// segment of every key written, and `cas_max_retries` bounds how often an
/// atomic update is retried when other writers keep winning.
#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    pub path: String,
    pub key_prefix: String,
    pub cas_max_retries: u32,
    /// Background flush interval. Acknowledged writes younger than this may
    /// be lost on a hard crash.
    pub flush_every_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Missing values are filled from `Settings::default()`.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub store: Option<PartialStoreSettings>,
    pub logging: Option<PartialLoggingSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialStoreSettings {
    pub path: Option<String>,
    pub key_prefix: Option<String>,
    pub cas_max_retries: Option<u32>,
    pub flush_every_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: "gossipd_db".to_string(),
            key_prefix: "gossipd".to_string(),
            cas_max_retries: 64,
            flush_every_ms: 500,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store: StoreSettings::default(),
            logging: LoggingSettings {
                level: "info".to_string(),
            },
        }
    }
}
