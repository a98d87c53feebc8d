use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Interval, MissedTickBehavior};

/// Gate enforcing a hard floor on the spacing between outbound requests.
///
/// One ticking interval behind a mutex: every request awaits the lock and
/// then the next tick, so the aggregate dispatch rate across all
/// concurrent callers of one client never exceeds the configured floor.
/// The interval is built on first use, which keeps [`crate::Client`]
/// construction independent of a running runtime.
#[derive(Debug)]
pub(crate) struct RequestGate {
    period: Duration,
    tick: Mutex<Option<Interval>>,
}

impl RequestGate {
    pub(crate) fn new(period: Duration) -> Self {
        Self {
            // tokio rejects zero-length intervals
            period: period.max(Duration::from_millis(1)),
            tick: Mutex::new(None),
        }
    }

    /// Blocks until a dispatch slot is available. The first caller passes
    /// immediately; every subsequent pass is at least one period after
    /// the previous one.
    pub(crate) async fn wait(&self) {
        let mut guard = self.tick.lock().await;
        let interval = guard.get_or_insert_with(|| {
            let mut interval = tokio::time::interval(self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        interval.tick().await;
    }
}
