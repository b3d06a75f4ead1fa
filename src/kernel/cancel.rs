use super::effect::SideEffect;

/// Releases everything an active call may hold, in priority order: pending
/// speech first, then the timer, then live capture. Each request is a no-op
/// for a resource that is already stopped, so this is emitted
/// unconditionally whenever a call is left or the session is torn down.
pub fn release_all() -> Vec<SideEffect> {
    vec![
        SideEffect::CancelSpeech,
        SideEffect::StopTimer,
        SideEffect::StopCapture,
    ]
}
