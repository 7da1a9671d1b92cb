use std::{future::Future, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    config::StorageConfig,
    dao::{
        scorepad_store::{Stores, memory::MemoryStore},
        storage::StorageError,
    },
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Reconnect to the storage backend and keep the shared state in degraded mode when it is unavailable.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Stores, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(stores) => {
                let scorepads = stores.scorepads.clone();
                state.set_stores(stores).await;
                info!("storage connection established; leaving degraded mode");
                delay = INITIAL_DELAY;

                loop {
                    match scorepads.health_check().await {
                        Ok(()) => {
                            if state.is_degraded() {
                                info!("storage healthy again; leaving degraded mode");
                                state.update_degraded(false);
                            }
                            sleep(HEALTH_POLL_INTERVAL).await;
                        }
                        Err(err) => {
                            warn!(error = %err, "storage health check failed");
                            let mut attempt = 0;
                            let mut reconnect_delay = INITIAL_DELAY;
                            let mut reconnected = false;

                            while attempt < MAX_RECONNECT_ATTEMPTS {
                                match scorepads.try_reconnect().await {
                                    Ok(()) => {
                                        info!(
                                            "storage reconnection succeeded after health check failure"
                                        );
                                        reconnected = true;
                                        break;
                                    }
                                    Err(reconnect_err) => {
                                        if attempt == 0 {
                                            warn!(
                                                attempt, error = %reconnect_err,
                                                "storage reconnect first attempt failed; entering degraded mode"
                                            );
                                            state.update_degraded(true);
                                        } else {
                                            warn!(attempt, error = %reconnect_err, "storage reconnect attempt failed");
                                        };
                                        attempt += 1;
                                        sleep(reconnect_delay).await;
                                        reconnect_delay = (reconnect_delay * 2).min(MAX_DELAY);
                                    }
                                }
                            }

                            if reconnected {
                                state.update_degraded(false);
                                sleep(HEALTH_POLL_INTERVAL).await;
                                continue;
                            } else {
                                warn!(
                                    "exhausted storage reconnect attempts; staying in degraded mode"
                                );
                                break;
                            }
                        }
                    }
                }

                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// Open the backend selected by the configuration.
pub async fn connect_stores(config: StorageConfig) -> Result<Stores, StorageError> {
    match config {
        #[cfg(feature = "mongo-store")]
        StorageConfig::Mongo { uri, database } => {
            use crate::dao::scorepad_store::mongodb::{MongoConfig, MongoScorepadStore};

            let config = MongoConfig::from_uri(&uri, database.as_deref()).await?;
            let store = MongoScorepadStore::connect(config).await?;
            Ok(Stores::from_backend(store))
        }
        #[cfg(not(feature = "mongo-store"))]
        StorageConfig::Mongo { .. } => Err(StorageError::unavailable(
            "MongoDB support is not compiled in".into(),
            std::io::Error::other("mongo-store feature disabled"),
        )),
        StorageConfig::Memory { fixture } => {
            let store = match fixture {
                Some(path) => MemoryStore::load(&path)?,
                None => {
                    warn!("no fixture configured; starting with an empty in-memory store");
                    MemoryStore::new()
                }
            };
            Ok(Stores::from_backend(store))
        }
    }
}
