use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::speech::{SpeechError, SpeechSink};
use crate::kernel::effect::SpeechRequest;

#[derive(Debug)]
pub enum PlaybackOutcome {
    Completed { lines: usize },
    /// Stopped by the caller, or playback was cut off, before line `at`
    /// finished.
    Cancelled { at: usize },
    Failed { at: usize, error: SpeechError },
}

/// Reads a saved transcript aloud one line at a time, pausing `gap` between
/// lines. Cancelling `cancel` silences the sink and stops immediately.
pub async fn play_transcript(
    sink: &dyn SpeechSink,
    lines: &[String],
    locale: &str,
    rate: f32,
    gap: Duration,
    cancel: CancellationToken,
) -> PlaybackOutcome {
    for (index, line) in lines.iter().enumerate() {
        if index > 0 {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return PlaybackOutcome::Cancelled { at: index },
                _ = tokio::time::sleep(gap) => {}
            }
        }

        let request = SpeechRequest::new(line.as_str(), locale, rate);
        let done = match sink.speak(&request) {
            Ok(done) => done,
            Err(error) => {
                warn!(line = index, "transcript playback failed: {}", error);
                return PlaybackOutcome::Failed { at: index, error };
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                sink.cancel();
                return PlaybackOutcome::Cancelled { at: index };
            }
            finished = done => {
                if finished.is_err() {
                    debug!(line = index, "playback cut off");
                    return PlaybackOutcome::Cancelled { at: index };
                }
            }
        }
    }

    PlaybackOutcome::Completed { lines: lines.len() }
}
