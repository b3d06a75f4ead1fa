use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::event::Event;
use super::time::CallEpoch;

/// Driver half of the call timer: a task that sends one
/// [`Event::TimerTick`] per period into the reactor channel until stopped.
#[derive(Debug, Default)]
pub struct CallTicker {
    token: Option<CancellationToken>,
}

impl CallTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts ticking for `epoch`, replacing any ticker still running.
    /// The first tick arrives one full period after start.
    pub fn start(&mut self, epoch: CallEpoch, period: Duration, tx: mpsc::Sender<Event>) {
        self.stop();

        let token = CancellationToken::new();
        let cancelled = token.clone();

        tokio::spawn(async move {
            let mut cadence = interval_at(Instant::now() + period, period);
            // Late ticks are delayed, never bunched or skipped.
            cadence.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = cadence.tick() => {
                        if tx.send(Event::TimerTick(epoch)).await.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!(epoch = epoch.0, "call ticker stopped");
        });

        self.token = Some(token);
    }

    /// Idempotent.
    pub fn stop(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.token.is_some()
    }
}

impl Drop for CallTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
