use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::info;

use crate::state::SharedState;

/// Periodically drop game sessions that have no open connection left.
pub async fn run(state: SharedState, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let reaped = state.sessions().reap();
        if reaped > 0 {
            info!(
                reaped,
                remaining = state.sessions().len(),
                "reaped inactive game sessions"
            );
        }
    }
}
