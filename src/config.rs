//! Application-level configuration loading: storage backend and session housekeeping.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "JANK_BACK_CONFIG_PATH";
/// Environment variables overriding the MongoDB settings of the file.
const MONGO_URI_ENV: &str = "MONGO_URI";
const MONGO_DB_ENV: &str = "MONGO_DB";

const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";
const DEFAULT_REAPER_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    reaper_interval: Duration,
    storage: StorageConfig,
}

/// Storage backend selected at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// MongoDB server holding scorepads, players and terms.
    Mongo {
        uri: String,
        database: Option<String>,
    },
    /// In-process store, optionally seeded from a JSON fixture.
    Memory { fixture: Option<PathBuf> },
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        reaper_interval_secs = app_config.reaper_interval.as_secs(),
                        "loaded config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        config.with_env_overrides(env::var(MONGO_URI_ENV).ok(), env::var(MONGO_DB_ENV).ok())
    }

    /// Period of the sweep dropping game sessions nobody is connected to.
    pub fn reaper_interval(&self) -> Duration {
        self.reaper_interval
    }

    /// Storage backend to connect to.
    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }

    /// Apply `MONGO_URI`/`MONGO_DB` on top of a MongoDB storage section.
    fn with_env_overrides(mut self, uri: Option<String>, database: Option<String>) -> Self {
        if let StorageConfig::Mongo {
            uri: configured_uri,
            database: configured_db,
        } = &mut self.storage
        {
            if let Some(uri) = uri.filter(|value| !value.is_empty()) {
                *configured_uri = uri;
            }
            if let Some(database) = database.filter(|value| !value.is_empty()) {
                *configured_db = Some(database);
            }
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            reaper_interval: Duration::from_secs(DEFAULT_REAPER_INTERVAL_SECS),
            storage: StorageConfig::Mongo {
                uri: DEFAULT_MONGO_URI.to_owned(),
                database: None,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    reaper_interval_secs: Option<u64>,
    #[serde(default)]
    storage: Option<RawStorage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
/// JSON representation of the `storage` section.
enum RawStorage {
    Mongo {
        #[serde(default)]
        uri: Option<String>,
        #[serde(default)]
        database: Option<String>,
    },
    Memory {
        #[serde(default)]
        fixture: Option<PathBuf>,
    },
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let reaper_interval = Duration::from_secs(
            value
                .reaper_interval_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REAPER_INTERVAL_SECS),
        );
        let storage = match value.storage {
            Some(RawStorage::Mongo { uri, database }) => StorageConfig::Mongo {
                uri: uri.unwrap_or_else(|| DEFAULT_MONGO_URI.to_owned()),
                database,
            },
            Some(RawStorage::Memory { fixture }) => StorageConfig::Memory { fixture },
            None => AppConfig::default().storage,
        };

        Self {
            reaper_interval,
            storage,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
