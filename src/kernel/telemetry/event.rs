use serde::{Deserialize, Serialize};

use crate::kernel::event::Event;
use crate::kernel::state::{CallState, Notice, Prompt};
use crate::kernel::time::CallEpoch;

// Allowed: epochs, states, durations, counts, enums.
// Forbidden: transcript text, phone numbers.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TelemetryEvent {
    CallTransition {
        epoch: CallEpoch,
        from: CallState,
        to: CallState,
        cause: TransitionCause,
    },

    SpeechLifecycle(SpeechLifecycleEvent),

    PromptShown {
        epoch: CallEpoch,
        prompt: Prompt,
    },

    NoticeShown {
        notice: Notice,
    },

    UtteranceIngested {
        epoch: CallEpoch,
    },

    CallArchived {
        duration_seconds: u64,
        is_scam: bool,
        transcript_lines: usize,
    },

    ArchiveWriteFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeechLifecycleEvent {
    Requested,
    Failed,
    Aborted,
}

/// What kind of event drove a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionCause {
    User,
    Timer,
    Capture,
    Teardown,
}

impl From<&Event> for TransitionCause {
    fn from(event: &Event) -> Self {
        match event {
            Event::Action(_) => TransitionCause::User,
            Event::TimerTick(_) => TransitionCause::Timer,
            Event::Utterance { .. } | Event::CaptureFailed { .. } => TransitionCause::Capture,
            Event::Shutdown => TransitionCause::Teardown,
        }
    }
}
