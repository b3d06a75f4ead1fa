use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::kernel::event::Event;
use crate::kernel::time::CallEpoch;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("microphone permission denied")]
    PermissionDenied,
    #[error("live speech capture unavailable")]
    Unavailable,
    #[error("capture failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    pub locale: String,
    pub continuous: bool,
    pub interim_results: bool,
}

impl CaptureConfig {
    pub fn continuous(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            continuous: true,
            interim_results: true,
        }
    }
}

/// Where a capture source delivers finalized utterances. Tagged with the
/// call epoch it was started for.
#[derive(Debug, Clone)]
pub struct UtteranceSink {
    tx: mpsc::Sender<Event>,
    epoch: CallEpoch,
}

impl UtteranceSink {
    pub fn new(tx: mpsc::Sender<Event>, epoch: CallEpoch) -> Self {
        Self { tx, epoch }
    }

    pub fn epoch(&self) -> CallEpoch {
        self.epoch
    }

    /// Returns false once the reactor is gone.
    pub async fn finalized(&self, text: impl Into<String>) -> bool {
        let event = Event::Utterance {
            epoch: self.epoch,
            text: text.into(),
        };
        self.tx.send(event).await.is_ok()
    }

    pub async fn failed(&self, error: CaptureError) -> bool {
        let event = Event::CaptureFailed {
            epoch: self.epoch,
            error,
        };
        self.tx.send(event).await.is_ok()
    }
}

/// Live speech-to-text capability. Sources emit finalized utterances in the
/// order they were recognized; only one capture runs at a time.
pub trait UtteranceSource: Send {
    fn is_available(&self) -> bool;
    fn start(&mut self, config: &CaptureConfig, sink: UtteranceSink) -> Result<(), CaptureError>;
    /// Idempotent.
    fn stop(&mut self);
}

/// Host without speech recognition.
#[derive(Debug, Default)]
pub struct NoCapture;

impl UtteranceSource for NoCapture {
    fn is_available(&self) -> bool {
        false
    }

    fn start(&mut self, _config: &CaptureConfig, _sink: UtteranceSink) -> Result<(), CaptureError> {
        Err(CaptureError::Unavailable)
    }

    fn stop(&mut self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    pub delay: Duration,
    pub text: String,
}

/// Plays a fixed script of utterances, each after its delay, for demos and
/// tests. Can also simulate a denied microphone.
#[derive(Debug, Default)]
pub struct ScriptedCapture {
    script: Vec<ScriptLine>,
    deny: bool,
    token: Option<CancellationToken>,
}

impl ScriptedCapture {
    pub fn new(script: Vec<ScriptLine>) -> Self {
        Self {
            script,
            deny: false,
            token: None,
        }
    }

    /// Every line spaced by the same delay.
    pub fn evenly<I, S>(lines: I, spacing: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            lines
                .into_iter()
                .map(|text| ScriptLine {
                    delay: spacing,
                    text: text.into(),
                })
                .collect(),
        )
    }

    /// Reports a permission-denied error instead of speaking.
    pub fn denied() -> Self {
        Self {
            deny: true,
            ..Self::default()
        }
    }
}

impl UtteranceSource for ScriptedCapture {
    fn is_available(&self) -> bool {
        true
    }

    fn start(&mut self, config: &CaptureConfig, sink: UtteranceSink) -> Result<(), CaptureError> {
        self.stop();
        info!(locale = %config.locale, lines = self.script.len(), "scripted capture started");

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let script = self.script.clone();
        let deny = self.deny;

        tokio::spawn(async move {
            if deny {
                sink.failed(CaptureError::PermissionDenied).await;
                return;
            }
            for line in script {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => return,
                    _ = tokio::time::sleep(line.delay) => {}
                }
                if !sink.finalized(line.text).await {
                    return;
                }
            }
            debug!(epoch = sink.epoch().0, "capture script exhausted");
        });

        self.token = Some(token);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }
}

type ActiveSink = Arc<Mutex<Option<UtteranceSink>>>;

/// Capture fed by hand, one line per utterance (the interactive console).
/// Lines pushed while no capture is running are dropped.
#[derive(Debug, Default)]
pub struct ConsoleCapture {
    active: ActiveSink,
}

/// Producer handle for a [`ConsoleCapture`].
#[derive(Debug, Clone)]
pub struct ConsoleFeed {
    active: ActiveSink,
}

impl ConsoleCapture {
    pub fn new() -> (Self, ConsoleFeed) {
        let active: ActiveSink = Arc::default();
        (
            Self {
                active: active.clone(),
            },
            ConsoleFeed { active },
        )
    }
}

impl UtteranceSource for ConsoleCapture {
    fn is_available(&self) -> bool {
        true
    }

    fn start(&mut self, config: &CaptureConfig, sink: UtteranceSink) -> Result<(), CaptureError> {
        let mut guard = self
            .active
            .lock()
            .map_err(|_| CaptureError::Failed("console capture lock poisoned".into()))?;
        info!(locale = %config.locale, "console capture started");
        *guard = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        if let Ok(mut guard) = self.active.lock() {
            guard.take();
        }
    }
}

impl ConsoleFeed {
    /// Waits for room in the reactor channel so no utterance is lost.
    /// Returns false when nothing is capturing or the reactor is gone.
    pub async fn push(&self, text: &str) -> bool {
        let sink = self.active.lock().ok().and_then(|guard| guard.clone());
        match sink {
            Some(sink) => {
                let queued = sink.finalized(text).await;
                if !queued {
                    warn!("utterance dropped: reactor closed");
                }
                queued
            }
            None => false,
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.active.lock().map(|g| g.is_some()).unwrap_or(false)
    }
}
