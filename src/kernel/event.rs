use super::time::CallEpoch;
use crate::audio::capture::CaptureError;

/// User interactions with the call screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    BeginFlaggedIncoming,
    BeginPlainIncoming,
    Accept,
    Reject,
    /// Answer to the recording-consent prompt.
    RecordingConsent(bool),
    DismissScamAlert,
    /// Answer to "was this a scam call?".
    AnswerFeedback(bool),
    End,
    /// Answer to the save-or-discard prompt.
    SaveChoice(bool),
}

/// Everything that re-enters the lifecycle. Produced by the UI, the
/// one-second ticker and the live capture source, consumed strictly in
/// arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Action(UserAction),
    TimerTick(CallEpoch),
    Utterance { epoch: CallEpoch, text: String },
    CaptureFailed { epoch: CallEpoch, error: CaptureError },
    /// Session teardown (app closed).
    Shutdown,
}

impl Event {
    pub fn action(action: UserAction) -> Self {
        Event::Action(action)
    }

    pub fn utterance(epoch: CallEpoch, text: &str) -> Self {
        Event::Utterance {
            epoch,
            text: text.to_string(),
        }
    }
}
