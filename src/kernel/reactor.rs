use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::effect::SideEffect;
use super::event::Event;
use super::lifecycle::{CallLifecycle, LifecycleSettings};
use super::state::{CallState, Capability, Notice, Prompt};
use super::telemetry::event::{SpeechLifecycleEvent, TelemetryEvent, TransitionCause};
use super::telemetry::recorder::TelemetryRecorder;
use super::ticker::CallTicker;
use crate::archive::CallArchive;
use crate::audio::capture::{CaptureConfig, UtteranceSink, UtteranceSource};
use crate::config::Config;
use crate::outputs::speech::{SpeechError, SpeechSink};

/// What the UI needs to render, published by the reactor as it goes.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    StateChanged { from: CallState, to: CallState },
    Prompt(Prompt),
    PromptCleared,
    Notice(Notice),
    /// Elapsed call seconds after each tick.
    Elapsed(u64),
    TranscriptLine(String),
    /// Text of a spoken warning, shown even when speech output fails.
    Warning(String),
}

#[derive(Debug, Clone)]
pub struct ReactorConfig {
    pub tick_interval: Duration,
    pub capture: CaptureConfig,
}

impl ReactorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            capture: CaptureConfig::continuous(config.locale.clone()),
        }
    }
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Single consumer of the session's event channel. Feeds events to the
/// [`CallLifecycle`] in arrival order and carries out the side effects it
/// asks for against the speech sink, capture source, ticker and archive.
pub struct Reactor {
    pub receiver: mpsc::Receiver<Event>,
    tx: mpsc::Sender<Event>,
    pub lifecycle: CallLifecycle,
    pub telemetry: TelemetryRecorder,
    archive: CallArchive,
    speech: Arc<dyn SpeechSink>,
    capture: Box<dyn UtteranceSource>,
    ticker: CallTicker,
    surface: Option<mpsc::UnboundedSender<SurfaceEvent>>,
    config: ReactorConfig,
    // Follow-up events raised while executing effects, handled before the
    // next channel event.
    backlog: VecDeque<Event>,
}

impl Reactor {
    /// `settings.capture_available` is narrowed by what the capture source
    /// reports.
    pub fn new(
        receiver: mpsc::Receiver<Event>,
        tx: mpsc::Sender<Event>,
        mut settings: LifecycleSettings,
        archive: CallArchive,
        speech: Arc<dyn SpeechSink>,
        capture: Box<dyn UtteranceSource>,
        config: ReactorConfig,
    ) -> Self {
        settings.capture_available &= capture.is_available();
        Self {
            receiver,
            tx,
            lifecycle: CallLifecycle::new(settings),
            telemetry: TelemetryRecorder::new(),
            archive,
            speech,
            capture,
            ticker: CallTicker::new(),
            surface: None,
            config,
            backlog: VecDeque::new(),
        }
    }

    pub fn with_surface(mut self, surface: mpsc::UnboundedSender<SurfaceEvent>) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn sender(&self) -> mpsc::Sender<Event> {
        self.tx.clone()
    }

    pub fn archive(&self) -> &CallArchive {
        &self.archive
    }

    /// Handles one event and everything it triggers. Returns the side
    /// effects in the order they were carried out.
    pub fn step(&mut self, event: Event) -> Vec<SideEffect> {
        let mut executed = Vec::new();
        self.backlog.push_back(event);

        while let Some(event) = self.backlog.pop_front() {
            let cause = TransitionCause::from(&event);
            let effects = self.lifecycle.handle(event);
            for effect in effects {
                self.execute(&effect, cause);
                executed.push(effect);
            }
        }

        executed
    }

    /// Handles a batch in order.
    pub fn tick_step(&mut self, events: Vec<Event>) -> Vec<SideEffect> {
        events.into_iter().flat_map(|e| self.step(e)).collect()
    }

    /// Async driver loop. Runs until [`Event::Shutdown`] arrives, then the
    /// session is torn down.
    pub async fn run(&mut self) {
        info!("Reactor started. Tick: {:?}", self.config.tick_interval);

        while let Some(event) = self.receiver.recv().await {
            let shutdown = matches!(event, Event::Shutdown);
            self.step(event);
            if shutdown {
                info!("Reactor stopped");
                return;
            }
        }

        self.step(Event::Shutdown);
        info!("Reactor stopped: channel closed");
    }

    fn execute(&mut self, effect: &SideEffect, cause: TransitionCause) {
        match effect {
            SideEffect::Transition { from, to } => {
                self.telemetry.record(TelemetryEvent::CallTransition {
                    epoch: self.lifecycle.epoch(),
                    from: *from,
                    to: *to,
                    cause,
                });
                self.publish(SurfaceEvent::StateChanged { from: *from, to: *to });
            }

            SideEffect::Speak(request) => {
                self.telemetry
                    .record(TelemetryEvent::SpeechLifecycle(SpeechLifecycleEvent::Requested));
                self.publish(SurfaceEvent::Warning(request.text.clone()));
                // Best effort: completion is not awaited and failure never
                // holds up the lifecycle.
                if let Err(e) = self.speech.speak(request) {
                    warn!("spoken warning dropped: {}", e);
                    self.telemetry
                        .record(TelemetryEvent::SpeechLifecycle(SpeechLifecycleEvent::Failed));
                    if matches!(e, SpeechError::Unavailable) {
                        self.notice(Notice::CapabilityUnavailable(Capability::SpeechOutput));
                    }
                }
            }

            SideEffect::CancelSpeech => {
                self.speech.cancel();
                self.telemetry
                    .record(TelemetryEvent::SpeechLifecycle(SpeechLifecycleEvent::Aborted));
            }

            SideEffect::StartTimer(epoch) => {
                self.ticker
                    .start(*epoch, self.config.tick_interval, self.tx.clone());
            }

            SideEffect::StopTimer => self.ticker.stop(),

            SideEffect::Elapsed(seconds) => self.publish(SurfaceEvent::Elapsed(*seconds)),

            SideEffect::StartCapture(epoch) => {
                let sink = UtteranceSink::new(self.tx.clone(), *epoch);
                if let Err(error) = self.capture.start(&self.config.capture, sink) {
                    warn!("live capture failed to start: {}", error);
                    self.backlog.push_back(Event::CaptureFailed {
                        epoch: *epoch,
                        error,
                    });
                }
            }

            SideEffect::StopCapture => self.capture.stop(),

            SideEffect::TranscriptLine(text) => {
                self.telemetry.record(TelemetryEvent::UtteranceIngested {
                    epoch: self.lifecycle.epoch(),
                });
                self.publish(SurfaceEvent::TranscriptLine(text.clone()));
            }

            SideEffect::ShowPrompt(prompt) => {
                self.telemetry.record(TelemetryEvent::PromptShown {
                    epoch: self.lifecycle.epoch(),
                    prompt: *prompt,
                });
                self.publish(SurfaceEvent::Prompt(*prompt));
            }

            SideEffect::ClearPrompt => self.publish(SurfaceEvent::PromptCleared),

            SideEffect::Notice(notice) => self.notice(*notice),

            SideEffect::Archive(record) => {
                let summary = TelemetryEvent::CallArchived {
                    duration_seconds: record.duration_seconds,
                    is_scam: record.is_scam,
                    transcript_lines: record.transcript.len(),
                };
                match self.archive.save(record.clone()) {
                    Ok(()) => {
                        self.telemetry.record(summary);
                        self.notice(Notice::CallSaved);
                    }
                    Err(e) => {
                        error!("failed to archive call: {}", e);
                        self.telemetry.record(TelemetryEvent::ArchiveWriteFailed);
                        self.notice(Notice::SaveFailed);
                    }
                }
            }
        }
    }

    fn notice(&mut self, notice: Notice) {
        debug!(?notice, "notice");
        self.telemetry.record(TelemetryEvent::NoticeShown { notice });
        self.publish(SurfaceEvent::Notice(notice));
    }

    fn publish(&self, event: SurfaceEvent) {
        if let Some(surface) = &self.surface {
            // A closed surface only means nobody is watching.
            let _ = surface.send(event);
        }
    }
}

impl Drop for Reactor {
    fn drop(&mut self) {
        self.speech.cancel();
        self.ticker.stop();
        self.capture.stop();
    }
}
