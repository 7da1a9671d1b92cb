use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report storage health and the number of live game sessions.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.stores().await {
        Some(stores) => {
            if let Err(err) = stores.scorepads.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        None => warn!("storage unavailable (degraded mode)"),
    }

    let sessions = state.sessions().len();
    if state.is_degraded() {
        HealthResponse::degraded(sessions)
    } else {
        HealthResponse::ok(sessions)
    }
}
