mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{LoggingSettings, Settings, StoreSettings};

/// Loads the configuration from `config/default` and `GOSSIPD_*` environment
/// variables (e.g. `GOSSIPD_STORE__KEY_PREFIX`), merged over the defaults.
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix("GOSSIPD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;
    let default = Settings::default();

    Ok(Settings {
        store: StoreSettings {
            path: partial
                .store
                .as_ref()
                .and_then(|s| s.path.clone())
                .unwrap_or(default.store.path),
            key_prefix: partial
                .store
                .as_ref()
                .and_then(|s| s.key_prefix.clone())
                .unwrap_or(default.store.key_prefix),
            cas_max_retries: partial
                .store
                .as_ref()
                .and_then(|s| s.cas_max_retries)
                .unwrap_or(default.store.cas_max_retries),
            flush_every_ms: partial
                .store
                .as_ref()
                .and_then(|s| s.flush_every_ms)
                .unwrap_or(default.store.flush_every_ms),
        },
        logging: LoggingSettings {
            level: partial
                .logging
                .as_ref()
                .and_then(|l| l.level.clone())
                .unwrap_or(default.logging.level),
        },
    })
}
