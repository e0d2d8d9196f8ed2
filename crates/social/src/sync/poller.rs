//! Cancellable fixed-interval poll loop

use log::{debug, info};
use std::sync::Weak;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use super::SyncClient;

/// Lower bound so a zero interval cannot spin
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Spawn the poll loop; abort the returned handle to cancel the timer
pub(super) fn spawn(runtime: &Handle, client: Weak<SyncClient>, period: Duration) -> JoinHandle<()> {
    runtime.spawn(run(client, period))
}

async fn run(weak: Weak<SyncClient>, period: Duration) {
    let mut ticker = time::interval(period.max(MIN_PERIOD));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(client) = weak.upgrade() else {
            debug!("Sync client dropped, poller exiting");
            break;
        };
        if !client.is_authenticated() {
            info!("Session ended, poller exiting");
            break;
        }

        // Cycles are not awaited: a slow response may overlap the next cycle
        let _ = tokio::task::spawn_blocking(move || client.poll_once());
    }
}
