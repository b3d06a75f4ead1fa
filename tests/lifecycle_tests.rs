use eldershield::audio::CaptureError;
use eldershield::kernel::effect::{SideEffect, Warning};
use eldershield::kernel::event::{Event, UserAction};
use eldershield::kernel::lifecycle::{CallLifecycle, LifecycleSettings};
use eldershield::kernel::state::{CallState, Capability, Notice, Prompt};
use eldershield::kernel::time::CallEpoch;

fn act(lifecycle: &mut CallLifecycle, action: UserAction) -> Vec<SideEffect> {
    lifecycle.handle(Event::Action(action))
}

fn spoken(effects: &[SideEffect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|e| match e {
            SideEffect::Speak(request) => Some(request.text.clone()),
            _ => None,
        })
        .collect()
}

fn has_release(effects: &[SideEffect]) -> bool {
    [SideEffect::CancelSpeech, SideEffect::StopTimer, SideEffect::StopCapture]
        .iter()
        .all(|e| effects.contains(e))
}

fn recording_call(lifecycle: &mut CallLifecycle) -> CallEpoch {
    act(lifecycle, UserAction::BeginPlainIncoming);
    act(lifecycle, UserAction::Accept);
    act(lifecycle, UserAction::RecordingConsent(true));
    assert_eq!(lifecycle.state(), CallState::ActiveRecording);
    lifecycle.epoch()
}

#[test]
fn test_boots_idle() {
    let lifecycle = CallLifecycle::default();
    assert_eq!(lifecycle.state(), CallState::Idle);
    assert_eq!(lifecycle.elapsed(), 0);
    assert!(lifecycle.caller().is_none());
}

#[test]
fn test_flagged_call_accept_and_end() {
    let mut lifecycle = CallLifecycle::default();

    // 1. Blacklisted caller rings: spoken warning, no prompt yet
    let effects = act(&mut lifecycle, UserAction::BeginFlaggedIncoming);
    assert_eq!(lifecycle.state(), CallState::IncomingFlagged);
    assert_eq!(spoken(&effects), vec![Warning::ScamCall.text().to_string()]);
    assert_eq!(lifecycle.caller(), Some("+84 912 345 678"));

    // 2. Accept: timer runs and feedback is asked
    let effects = act(&mut lifecycle, UserAction::Accept);
    assert_eq!(lifecycle.state(), CallState::ActiveFlaggedNoRecording);
    assert!(effects.contains(&SideEffect::StartTimer(lifecycle.epoch())));
    assert!(effects.contains(&SideEffect::ShowPrompt(Prompt::Feedback)));
    assert!(!effects.iter().any(|e| matches!(e, SideEffect::StartCapture(_))), "Flagged calls are never recorded");

    // 3. End: everything released, nothing archived
    let effects = act(&mut lifecycle, UserAction::End);
    assert_eq!(lifecycle.state(), CallState::Idle);
    assert!(has_release(&effects));
    assert!(!effects.iter().any(|e| matches!(e, SideEffect::Archive(_))));
    assert!(!effects.contains(&SideEffect::ShowPrompt(Prompt::SaveCall)));
}

#[test]
fn test_feedback_answer_clears_prompt() {
    let mut lifecycle = CallLifecycle::default();
    act(&mut lifecycle, UserAction::BeginFlaggedIncoming);
    act(&mut lifecycle, UserAction::Accept);

    let effects = act(&mut lifecycle, UserAction::AnswerFeedback(true));
    assert_eq!(effects, vec![SideEffect::ClearPrompt, SideEffect::Notice(Notice::FeedbackThanks)]);
    assert_eq!(lifecycle.prompt(), None);

    // A second answer has nothing to answer
    assert!(act(&mut lifecycle, UserAction::AnswerFeedback(false)).is_empty());
}

#[test]
fn test_plain_call_without_recording_counts_duration() {
    let mut lifecycle = CallLifecycle::default();

    act(&mut lifecycle, UserAction::BeginPlainIncoming);
    let effects = act(&mut lifecycle, UserAction::Accept);
    assert_eq!(lifecycle.state(), CallState::AwaitingRecordingConsent);
    assert!(effects.contains(&SideEffect::ShowPrompt(Prompt::RecordingConsent)));

    act(&mut lifecycle, UserAction::RecordingConsent(false));
    assert_eq!(lifecycle.state(), CallState::ActiveNoRecording);

    let epoch = lifecycle.epoch();
    for expected in 1..=5 {
        let effects = lifecycle.handle(Event::TimerTick(epoch));
        assert_eq!(effects, vec![SideEffect::Elapsed(expected)]);
    }

    let effects = act(&mut lifecycle, UserAction::End);
    assert_eq!(lifecycle.final_duration(), 5);
    assert_eq!(lifecycle.state(), CallState::Idle);
    assert_eq!(lifecycle.elapsed(), 0, "Timer resets once stopped");
    assert!(!effects.contains(&SideEffect::ShowPrompt(Prompt::SaveCall)), "Unrecorded calls are never offered for saving");
    assert!(!effects.iter().any(|e| matches!(e, SideEffect::Archive(_))), "Archive left untouched");
}

#[test]
fn test_recorded_scam_call_is_archived() {
    let mut lifecycle = CallLifecycle::default();
    let epoch = recording_call(&mut lifecycle);

    // 1. Harmless line: transcript only
    let effects = lifecycle.handle(Event::utterance(epoch, "xin chào"));
    assert_eq!(effects, vec![SideEffect::TranscriptLine("xin chào".into())]);

    // 2. Keyword hit: warning spoken once and alert shown
    let effects = lifecycle.handle(Event::utterance(epoch, "chuyển tiền ngay"));
    assert_eq!(spoken(&effects), vec![Warning::ScamIndicators.text().to_string()]);
    assert!(effects.contains(&SideEffect::ShowPrompt(Prompt::ScamAlert)));
    assert!(lifecycle.scam_detected());

    lifecycle.handle(Event::TimerTick(epoch));
    lifecycle.handle(Event::TimerTick(epoch));

    // 3. End: save prompt instead of going straight home
    let effects = act(&mut lifecycle, UserAction::End);
    assert_eq!(lifecycle.state(), CallState::Ended);
    assert!(has_release(&effects));
    assert!(effects.contains(&SideEffect::ShowPrompt(Prompt::SaveCall)));
    assert_eq!(lifecycle.final_duration(), 2);

    // 4. Save
    let effects = act(&mut lifecycle, UserAction::SaveChoice(true));
    let record = effects
        .iter()
        .find_map(|e| match e {
            SideEffect::Archive(record) => Some(record.clone()),
            _ => None,
        })
        .expect("Saving must emit an archive record");
    assert!(record.is_scam);
    assert!(record.has_scam_keywords());
    assert_eq!(record.transcript, vec!["xin chào", "chuyển tiền ngay"]);
    assert_eq!(record.duration_seconds, 2);
    assert_eq!(record.phone_number, "+84 987 654 321");
    assert!(!record.id.is_empty());

    assert_eq!(lifecycle.state(), CallState::Idle);
    assert!(lifecycle.transcript().is_empty(), "Session state cleared after save");
}

#[test]
fn test_scam_warning_is_one_shot() {
    let mut lifecycle = CallLifecycle::default();
    let epoch = recording_call(&mut lifecycle);

    let mut warnings = 0;
    for line in ["trúng thưởng 500 triệu", "lừa đảo", "chuyển tiền vào tài khoản ngân hàng"] {
        warnings += spoken(&lifecycle.handle(Event::utterance(epoch, line))).len();
    }

    assert_eq!(warnings, 1, "Only the first hit of a call warns");
    assert_eq!(lifecycle.transcript().len(), 3, "Later hits are still transcribed");
}

#[test]
fn test_dismissed_alert_leads_to_feedback() {
    let mut lifecycle = CallLifecycle::default();
    let epoch = recording_call(&mut lifecycle);
    lifecycle.handle(Event::utterance(epoch, "anh trúng thưởng rồi"));
    assert_eq!(lifecycle.prompt(), Some(Prompt::ScamAlert));

    let effects = act(&mut lifecycle, UserAction::DismissScamAlert);
    assert_eq!(effects, vec![SideEffect::ShowPrompt(Prompt::Feedback)]);

    act(&mut lifecycle, UserAction::AnswerFeedback(true));
    assert_eq!(lifecycle.prompt(), None);
    assert_eq!(lifecycle.state(), CallState::ActiveRecording, "Call continues after feedback");
}

#[test]
fn test_discard_leaves_no_record() {
    let mut lifecycle = CallLifecycle::default();
    let epoch = recording_call(&mut lifecycle);
    lifecycle.handle(Event::utterance(epoch, "xin chào"));
    act(&mut lifecycle, UserAction::End);

    let effects = act(&mut lifecycle, UserAction::SaveChoice(false));
    assert!(!effects.iter().any(|e| matches!(e, SideEffect::Archive(_))));
    assert!(effects.contains(&SideEffect::Notice(Notice::CallDiscarded)));
    assert_eq!(lifecycle.state(), CallState::Idle);
}

#[test]
fn test_reject_from_every_incoming_state() {
    for setup in [
        vec![UserAction::BeginFlaggedIncoming],
        vec![UserAction::BeginPlainIncoming],
        vec![UserAction::BeginPlainIncoming, UserAction::Accept],
    ] {
        let mut lifecycle = CallLifecycle::default();
        for action in setup {
            act(&mut lifecycle, action);
        }

        let had_prompt = lifecycle.prompt().is_some();
        let effects = act(&mut lifecycle, UserAction::Reject);
        assert_eq!(lifecycle.state(), CallState::Idle);
        assert!(has_release(&effects));
        assert_eq!(lifecycle.prompt(), None);
        assert_eq!(effects.contains(&SideEffect::ClearPrompt), had_prompt, "Open prompt is taken down");
    }
}

#[test]
fn test_leaving_a_call_takes_down_open_prompt() {
    // 1. Flagged call ended while the feedback question is up
    let mut lifecycle = CallLifecycle::default();
    act(&mut lifecycle, UserAction::BeginFlaggedIncoming);
    act(&mut lifecycle, UserAction::Accept);
    assert_eq!(lifecycle.prompt(), Some(Prompt::Feedback));

    let effects = act(&mut lifecycle, UserAction::End);
    assert!(effects.contains(&SideEffect::ClearPrompt));
    assert_eq!(lifecycle.prompt(), None);

    // 2. Teardown while the consent question is up
    act(&mut lifecycle, UserAction::BeginPlainIncoming);
    act(&mut lifecycle, UserAction::Accept);
    let effects = lifecycle.handle(Event::Shutdown);
    assert!(effects.contains(&SideEffect::ClearPrompt));

    // 3. Nothing open, nothing to clear
    act(&mut lifecycle, UserAction::BeginPlainIncoming);
    let effects = act(&mut lifecycle, UserAction::Reject);
    assert!(!effects.contains(&SideEffect::ClearPrompt));
}

#[test]
fn test_invalid_actions_are_ignored() {
    let mut lifecycle = CallLifecycle::default();

    assert!(act(&mut lifecycle, UserAction::Accept).is_empty());
    assert!(act(&mut lifecycle, UserAction::End).is_empty());
    assert!(act(&mut lifecycle, UserAction::SaveChoice(true)).is_empty());
    assert_eq!(lifecycle.state(), CallState::Idle);

    act(&mut lifecycle, UserAction::BeginPlainIncoming);
    assert!(act(&mut lifecycle, UserAction::BeginFlaggedIncoming).is_empty(), "Only one call at a time");
    assert!(act(&mut lifecycle, UserAction::RecordingConsent(true)).is_empty(), "Consent before accept");
    assert_eq!(lifecycle.state(), CallState::IncomingUnflagged);
}

#[test]
fn test_stale_ticks_are_dropped() {
    let mut lifecycle = CallLifecycle::default();

    act(&mut lifecycle, UserAction::BeginPlainIncoming);
    act(&mut lifecycle, UserAction::Accept);
    act(&mut lifecycle, UserAction::RecordingConsent(false));
    let first = lifecycle.epoch();
    lifecycle.handle(Event::TimerTick(first));
    act(&mut lifecycle, UserAction::End);

    // Late tick from the finished call
    assert!(lifecycle.handle(Event::TimerTick(first)).is_empty());

    act(&mut lifecycle, UserAction::BeginFlaggedIncoming);
    act(&mut lifecycle, UserAction::Accept);
    let second = lifecycle.epoch();
    assert_ne!(first, second);

    assert!(lifecycle.handle(Event::TimerTick(first)).is_empty(), "Previous call's ticker must not advance this call");
    assert_eq!(lifecycle.handle(Event::TimerTick(second)), vec![SideEffect::Elapsed(1)]);
}

#[test]
fn test_utterances_outside_recording_are_dropped() {
    let mut lifecycle = CallLifecycle::default();
    act(&mut lifecycle, UserAction::BeginPlainIncoming);
    act(&mut lifecycle, UserAction::Accept);
    act(&mut lifecycle, UserAction::RecordingConsent(false));

    let effects = lifecycle.handle(Event::utterance(lifecycle.epoch(), "lừa đảo"));
    assert!(effects.is_empty());
    assert!(lifecycle.transcript().is_empty());
    assert!(!lifecycle.scam_detected());
}

#[test]
fn test_consent_without_capture_degrades() {
    let settings = LifecycleSettings {
        capture_available: false,
        ..LifecycleSettings::default()
    };
    let mut lifecycle = CallLifecycle::new(settings);
    act(&mut lifecycle, UserAction::BeginPlainIncoming);
    act(&mut lifecycle, UserAction::Accept);

    let effects = act(&mut lifecycle, UserAction::RecordingConsent(true));
    assert_eq!(lifecycle.state(), CallState::ActiveNoRecording);
    assert!(effects.contains(&SideEffect::Notice(Notice::CapabilityUnavailable(Capability::LiveCapture))));
    assert!(effects.contains(&SideEffect::StartTimer(lifecycle.epoch())), "Timer still runs");
    assert!(!effects.iter().any(|e| matches!(e, SideEffect::StartCapture(_))));
}

#[test]
fn test_capture_denied_before_any_speech() {
    let mut lifecycle = CallLifecycle::default();
    let epoch = recording_call(&mut lifecycle);

    let effects = lifecycle.handle(Event::CaptureFailed {
        epoch,
        error: CaptureError::PermissionDenied,
    });
    assert!(effects.contains(&SideEffect::Notice(Notice::MicrophoneDenied)));
    assert!(effects.contains(&SideEffect::StopCapture));
    assert_eq!(lifecycle.state(), CallState::ActiveNoRecording);

    let effects = act(&mut lifecycle, UserAction::End);
    assert_eq!(lifecycle.state(), CallState::Idle);
    assert!(!effects.contains(&SideEffect::ShowPrompt(Prompt::SaveCall)));
}

#[test]
fn test_capture_failure_keeps_partial_transcript() {
    let mut lifecycle = CallLifecycle::default();
    let epoch = recording_call(&mut lifecycle);
    lifecycle.handle(Event::utterance(epoch, "xin chào"));

    let effects = lifecycle.handle(Event::CaptureFailed {
        epoch,
        error: CaptureError::Failed("network".into()),
    });
    assert!(effects.contains(&SideEffect::Notice(Notice::CaptureInterrupted)));
    assert_eq!(lifecycle.state(), CallState::ActiveRecording, "Captured lines can still be saved");

    act(&mut lifecycle, UserAction::End);
    assert_eq!(lifecycle.prompt(), Some(Prompt::SaveCall));
}

#[test]
fn test_shutdown_mid_call_releases_everything() {
    let mut lifecycle = CallLifecycle::default();
    let epoch = recording_call(&mut lifecycle);
    lifecycle.handle(Event::utterance(epoch, "trúng thưởng"));

    let effects = lifecycle.handle(Event::Shutdown);
    assert!(has_release(&effects));
    assert_eq!(lifecycle.state(), CallState::Idle);
    assert!(!effects.iter().any(|e| matches!(e, SideEffect::Archive(_))), "Unsaved data is dropped on teardown");

    // Shutdown while idle still releases
    assert!(has_release(&lifecycle.handle(Event::Shutdown)));
}

#[test]
fn test_next_call_starts_clean() {
    let mut lifecycle = CallLifecycle::default();
    let epoch = recording_call(&mut lifecycle);
    lifecycle.handle(Event::utterance(epoch, "lừa đảo"));
    lifecycle.handle(Event::TimerTick(epoch));
    act(&mut lifecycle, UserAction::End);
    act(&mut lifecycle, UserAction::SaveChoice(false));

    let epoch = recording_call(&mut lifecycle);
    assert_eq!(lifecycle.elapsed(), 0);
    assert!(!lifecycle.scam_detected());

    let effects = lifecycle.handle(Event::utterance(epoch, "lừa đảo"));
    assert_eq!(spoken(&effects).len(), 1, "Warning re-arms for a new call");
}
