use serde::{Deserialize, Serialize};

/// Identifies one call session. Timer ticks and capture events carry the
/// epoch they were started for, so anything left over from a previous call
/// can be told apart and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct CallEpoch(pub u64);

impl CallEpoch {
    pub fn next(&self) -> Self {
        CallEpoch(self.0 + 1)
    }
}

pub const TICK_MS: u64 = 1_000;

/// Elapsed seconds of the active call, advanced by one-second ticks.
///
/// A stopped timer always reports zero: callers that need the final duration
/// must read [`CallTimer::elapsed`] before calling [`CallTimer::stop`].
#[derive(Debug, Clone, Default)]
pub struct CallTimer {
    elapsed: u64,
    running: bool,
}

impl CallTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.elapsed = 0;
        self.running = true;
    }

    /// Advances by exactly one second. Ticks on a stopped timer are ignored.
    pub fn tick(&mut self) -> u64 {
        if self.running {
            self.elapsed += 1;
        }
        self.elapsed
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.elapsed = 0;
    }

    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}
