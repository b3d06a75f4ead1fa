use chrono::Utc;
use tracing::{debug, info, warn};

use super::cancel::release_all;
use super::effect::{SideEffect, SpeechRequest, Warning};
use super::event::{Event, UserAction};
use super::state::{CallState, Capability, Notice, Prompt};
use super::time::{CallEpoch, CallTimer};
use crate::archive::CallRecord;
use crate::audio::capture::CaptureError;
use crate::config::Config;
use crate::screening::{Ingested, KeywordDetector, TranscriptRecorder};

/// The parts of [`Config`] the lifecycle consults, plus whether live
/// capture exists on this host at all.
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub detector: KeywordDetector,
    pub locale: String,
    pub speech_rate: f32,
    pub flagged_number: String,
    pub plain_number: String,
    pub capture_available: bool,
}

impl LifecycleSettings {
    pub fn from_config(config: &Config, capture_available: bool) -> Self {
        Self {
            detector: KeywordDetector::new(&config.keywords),
            locale: config.locale.clone(),
            speech_rate: config.speech_rate,
            flagged_number: config.flagged_number.clone(),
            plain_number: config.plain_number.clone(),
            capture_available,
        }
    }
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self::from_config(&Config::default(), true)
    }
}

/// Pure state machine for one demo session: consumes [`Event`]s and returns
/// the [`SideEffect`]s the driver must carry out. Events that make no sense
/// in the current state are ignored.
#[derive(Debug)]
pub struct CallLifecycle {
    state: CallState,
    epoch: CallEpoch,
    caller: Option<String>,
    timer: CallTimer,
    recorder: TranscriptRecorder,
    prompt: Option<Prompt>,
    final_duration: u64,
    settings: LifecycleSettings,
}

impl CallLifecycle {
    pub fn new(settings: LifecycleSettings) -> Self {
        Self {
            state: CallState::Idle,
            epoch: CallEpoch::default(),
            caller: None,
            timer: CallTimer::new(),
            recorder: TranscriptRecorder::new(settings.detector.clone()),
            prompt: None,
            final_duration: 0,
            settings,
        }
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn epoch(&self) -> CallEpoch {
        self.epoch
    }

    pub fn caller(&self) -> Option<&str> {
        self.caller.as_deref()
    }

    pub fn prompt(&self) -> Option<Prompt> {
        self.prompt
    }

    pub fn elapsed(&self) -> u64 {
        self.timer.elapsed()
    }

    /// Duration captured when the last call ended.
    pub fn final_duration(&self) -> u64 {
        self.final_duration
    }

    pub fn transcript(&self) -> &[String] {
        self.recorder.transcript()
    }

    pub fn scam_detected(&self) -> bool {
        self.recorder.flagged()
    }

    pub fn handle(&mut self, event: Event) -> Vec<SideEffect> {
        match event {
            Event::Action(action) => self.on_action(action),
            Event::TimerTick(epoch) => self.on_tick(epoch),
            Event::Utterance { epoch, text } => self.on_utterance(epoch, text),
            Event::CaptureFailed { epoch, error } => self.on_capture_failed(epoch, error),
            Event::Shutdown => self.teardown(),
        }
    }

    fn on_action(&mut self, action: UserAction) -> Vec<SideEffect> {
        use CallState::*;
        use UserAction::*;

        let mut effects = Vec::new();

        match (self.state, action) {
            (Idle, BeginFlaggedIncoming) => {
                self.begin_call(self.settings.flagged_number.clone());
                self.transition(IncomingFlagged, &mut effects);
                effects.push(SideEffect::Speak(self.warning(Warning::ScamCall)));
            }
            (Idle, BeginPlainIncoming) => {
                self.begin_call(self.settings.plain_number.clone());
                self.transition(IncomingUnflagged, &mut effects);
            }

            (IncomingFlagged | IncomingUnflagged | AwaitingRecordingConsent, Reject) => {
                info!(epoch = self.epoch.0, "call rejected");
                effects.extend(self.release());
                self.finish(&mut effects);
            }

            (IncomingFlagged, Accept) => {
                self.transition(ActiveFlaggedNoRecording, &mut effects);
                self.start_timer(&mut effects);
                self.show(Prompt::Feedback, &mut effects);
            }
            (IncomingUnflagged, Accept) => {
                self.transition(AwaitingRecordingConsent, &mut effects);
                self.show(Prompt::RecordingConsent, &mut effects);
            }

            (AwaitingRecordingConsent, RecordingConsent(false)) => {
                self.clear_prompt(&mut effects);
                self.transition(ActiveNoRecording, &mut effects);
                self.start_timer(&mut effects);
            }
            (AwaitingRecordingConsent, RecordingConsent(true)) => {
                self.clear_prompt(&mut effects);
                if self.settings.capture_available {
                    self.transition(ActiveRecording, &mut effects);
                    self.start_timer(&mut effects);
                    effects.push(SideEffect::StartCapture(self.epoch));
                } else {
                    warn!("live capture unavailable, continuing without recording");
                    effects.push(SideEffect::Notice(Notice::CapabilityUnavailable(
                        Capability::LiveCapture,
                    )));
                    self.transition(ActiveNoRecording, &mut effects);
                    self.start_timer(&mut effects);
                }
            }

            (ActiveRecording, DismissScamAlert) if self.prompt == Some(Prompt::ScamAlert) => {
                self.show(Prompt::Feedback, &mut effects);
            }
            (ActiveRecording | ActiveFlaggedNoRecording, AnswerFeedback(was_scam))
                if self.prompt == Some(Prompt::Feedback) =>
            {
                info!(epoch = self.epoch.0, was_scam, "user feedback received");
                self.clear_prompt(&mut effects);
                effects.push(SideEffect::Notice(Notice::FeedbackThanks));
            }

            (ActiveFlaggedNoRecording | ActiveNoRecording, End) => {
                let duration = self.timer.elapsed();
                effects.extend(self.release());
                self.final_duration = duration;
                info!(epoch = self.epoch.0, duration, "call ended");
                self.finish(&mut effects);
            }
            (ActiveRecording, End) => {
                // Stopping resets the timer, so read it first.
                let duration = self.timer.elapsed();
                effects.extend(self.release());
                self.final_duration = duration;
                info!(
                    epoch = self.epoch.0,
                    duration,
                    lines = self.recorder.transcript().len(),
                    "recorded call ended"
                );
                self.prompt = None;
                self.transition(Ended, &mut effects);
                self.show(Prompt::SaveCall, &mut effects);
            }

            (Ended, SaveChoice(true)) => {
                let record = CallRecord::new(
                    self.caller
                        .clone()
                        .unwrap_or_else(|| self.settings.plain_number.clone()),
                    Utc::now(),
                    self.final_duration,
                    self.recorder.flagged(),
                    self.recorder.snapshot(),
                );
                effects.push(SideEffect::Archive(record));
                self.finish(&mut effects);
            }
            (Ended, SaveChoice(false)) => {
                effects.push(SideEffect::Notice(Notice::CallDiscarded));
                self.finish(&mut effects);
            }

            (state, action) => {
                debug!(?state, ?action, "action ignored in current state");
            }
        }

        effects
    }

    fn on_tick(&mut self, epoch: CallEpoch) -> Vec<SideEffect> {
        if epoch != self.epoch || !self.timer.is_running() {
            debug!(tick_epoch = epoch.0, current = self.epoch.0, "stale tick dropped");
            return Vec::new();
        }
        vec![SideEffect::Elapsed(self.timer.tick())]
    }

    fn on_utterance(&mut self, epoch: CallEpoch, text: String) -> Vec<SideEffect> {
        if epoch != self.epoch || self.state != CallState::ActiveRecording {
            debug!(epoch = epoch.0, state = ?self.state, "utterance outside recording dropped");
            return Vec::new();
        }

        let mut effects = vec![SideEffect::TranscriptLine(text.clone())];
        if self.recorder.ingest(text) == Ingested::WarningRaised {
            warn!(epoch = self.epoch.0, "scam indicators detected in transcript");
            effects.push(SideEffect::Speak(self.warning(Warning::ScamIndicators)));
            self.show(Prompt::ScamAlert, &mut effects);
        }
        effects
    }

    fn on_capture_failed(&mut self, epoch: CallEpoch, error: CaptureError) -> Vec<SideEffect> {
        if epoch != self.epoch || self.state != CallState::ActiveRecording {
            debug!(epoch = epoch.0, "capture error outside recording dropped");
            return Vec::new();
        }

        warn!(epoch = self.epoch.0, "live capture failed: {}", error);
        let notice = match error {
            CaptureError::PermissionDenied => Notice::MicrophoneDenied,
            CaptureError::Unavailable => Notice::CapabilityUnavailable(Capability::LiveCapture),
            CaptureError::Failed(_) => Notice::CaptureInterrupted,
        };
        let mut effects = vec![SideEffect::Notice(notice), SideEffect::StopCapture];

        // Nothing captured yet: this call is effectively unrecorded.
        if self.recorder.is_empty() {
            self.transition(CallState::ActiveNoRecording, &mut effects);
        }
        effects
    }

    /// Unconditional release on session teardown; any unsaved call data is
    /// dropped.
    fn teardown(&mut self) -> Vec<SideEffect> {
        info!(state = ?self.state, "session teardown");
        let mut effects = self.release();
        if self.state != CallState::Idle {
            self.finish(&mut effects);
        }
        effects
    }

    fn begin_call(&mut self, caller: String) {
        self.epoch = self.epoch.next();
        self.caller = Some(caller);
        self.recorder.reset();
        self.prompt = None;
        self.final_duration = 0;
        info!(epoch = self.epoch.0, "incoming call");
    }

    fn start_timer(&mut self, effects: &mut Vec<SideEffect>) {
        self.timer.start();
        effects.push(SideEffect::StartTimer(self.epoch));
    }

    fn release(&mut self) -> Vec<SideEffect> {
        self.timer.stop();
        release_all()
    }

    /// Back to the menu with a clean session.
    fn finish(&mut self, effects: &mut Vec<SideEffect>) {
        self.caller = None;
        self.recorder.reset();
        self.clear_prompt(effects);
        self.transition(CallState::Idle, effects);
    }

    fn transition(&mut self, to: CallState, effects: &mut Vec<SideEffect>) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        debug!(?from, ?to, "call state transition");
        effects.push(SideEffect::Transition { from, to });
    }

    fn show(&mut self, prompt: Prompt, effects: &mut Vec<SideEffect>) {
        self.prompt = Some(prompt);
        effects.push(SideEffect::ShowPrompt(prompt));
    }

    fn clear_prompt(&mut self, effects: &mut Vec<SideEffect>) {
        if self.prompt.take().is_some() {
            effects.push(SideEffect::ClearPrompt);
        }
    }

    fn warning(&self, warning: Warning) -> SpeechRequest {
        SpeechRequest::new(warning.text(), &self.settings.locale, self.settings.speech_rate)
    }
}

impl Default for CallLifecycle {
    fn default() -> Self {
        Self::new(LifecycleSettings::default())
    }
}
