use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Run `job` every `interval` after `initial_delay` until shutdown is
/// signalled or the job returns `false`.
pub fn spawn_repeating<F>(
    name: &'static str,
    initial_delay: Duration,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut job: F,
) -> JoinHandle<()>
where
    F: FnMut() -> bool + Send + 'static,
{
    let interval = interval.max(Duration::from_millis(1));
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + initial_delay, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::debug!(job = name, interval_ms = interval.as_millis() as u64, "job scheduled");

        while !*shutdown.borrow() {
            tokio::select! {
                _ = ticker.tick() => {
                    if !job() {
                        tracing::debug!(job = name, "job receiver gone");
                        break;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::debug!(job = name, "job stopped");
    })
}
