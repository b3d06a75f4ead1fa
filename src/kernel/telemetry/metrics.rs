use std::collections::VecDeque;

use super::event::{SpeechLifecycleEvent, TelemetryEvent, TransitionCause};
use crate::kernel::state::{CallState, Prompt};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    pub call_stats: CallStats,
    pub speech_stats: SpeechStats,
    pub archive_stats: ArchiveStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallStats {
    pub incoming: u64,
    /// Incoming calls declined by the user.
    pub rejected: u64,
    /// Calls still in progress when the session was torn down.
    pub torn_down: u64,
    pub recorded: u64,
    pub scam_alerts: u64,
    pub utterances: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeechStats {
    pub requested: u64,
    pub failed: u64,
    pub aborted: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveStats {
    pub saved: u64,
    pub flagged_saved: u64,
    pub total_saved_seconds: u64,
    pub write_failures: u64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::CallTransition { from, to, cause, .. } => match (from, to) {
                (CallState::Idle, CallState::IncomingFlagged | CallState::IncomingUnflagged) => {
                    snap.call_stats.incoming += 1;
                }
                (_, CallState::Idle) if *cause == TransitionCause::Teardown => {
                    snap.call_stats.torn_down += 1;
                }
                (from, CallState::Idle) if from.is_incoming() => {
                    snap.call_stats.rejected += 1;
                }
                (_, CallState::ActiveRecording) => snap.call_stats.recorded += 1,
                _ => {}
            },
            TelemetryEvent::SpeechLifecycle(kind) => match kind {
                SpeechLifecycleEvent::Requested => snap.speech_stats.requested += 1,
                SpeechLifecycleEvent::Failed => snap.speech_stats.failed += 1,
                SpeechLifecycleEvent::Aborted => snap.speech_stats.aborted += 1,
            },
            TelemetryEvent::PromptShown { prompt: Prompt::ScamAlert, .. } => {
                snap.call_stats.scam_alerts += 1;
            }
            TelemetryEvent::PromptShown { .. } | TelemetryEvent::NoticeShown { .. } => {}
            TelemetryEvent::UtteranceIngested { .. } => snap.call_stats.utterances += 1,
            TelemetryEvent::CallArchived {
                duration_seconds,
                is_scam,
                ..
            } => {
                snap.archive_stats.saved += 1;
                snap.archive_stats.total_saved_seconds += duration_seconds;
                if *is_scam {
                    snap.archive_stats.flagged_saved += 1;
                }
            }
            TelemetryEvent::ArchiveWriteFailed => snap.archive_stats.write_failures += 1,
        }
    }

    snap
}
