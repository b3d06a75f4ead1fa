use std::sync::Mutex;

use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::kernel::effect::SpeechRequest;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("speech output unavailable")]
    Unavailable,
    #[error("failed to start speech program: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Speech synthesis capability. Playback is asynchronous: `speak` returns
/// a receiver that resolves when the utterance has finished. If playback is
/// cancelled the sender is dropped instead.
pub trait SpeechSink: Send + Sync {
    fn speak(&self, request: &SpeechRequest) -> Result<oneshot::Receiver<()>, SpeechError>;
    /// Stops whatever is playing. Idempotent.
    fn cancel(&self);
}

/// Writes speech to the log and completes immediately.
#[derive(Debug, Default)]
pub struct LogSpeech;

impl SpeechSink for LogSpeech {
    fn speak(&self, request: &SpeechRequest) -> Result<oneshot::Receiver<()>, SpeechError> {
        info!(locale = %request.locale, rate = request.rate, "[SPEECH] {}", request.text);
        let (done_tx, done_rx) = oneshot::channel();
        let _ = done_tx.send(());
        Ok(done_rx)
    }

    fn cancel(&self) {}
}

/// Host with no speech output; every request fails.
#[derive(Debug, Default)]
pub struct MuteSpeech;

impl SpeechSink for MuteSpeech {
    fn speak(&self, _request: &SpeechRequest) -> Result<oneshot::Receiver<()>, SpeechError> {
        Err(SpeechError::Unavailable)
    }

    fn cancel(&self) {}
}

/// Speaks through an external TTS program (`espeak-ng`, `say`, ...).
/// `{locale}` and `{rate}` in the arguments are substituted per request and
/// the text is passed as the last argument. A new request interrupts the
/// one playing.
#[derive(Debug)]
pub struct CommandSpeech {
    program: String,
    args: Vec<String>,
    current: Mutex<Option<oneshot::Sender<()>>>,
}

impl CommandSpeech {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            current: Mutex::new(None),
        }
    }

    /// `command[0]` is the program, the rest are leading arguments.
    pub fn from_command_line(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }

    fn stop_current(&self) {
        if let Ok(mut guard) = self.current.lock() {
            if let Some(stop_tx) = guard.take() {
                let _ = stop_tx.send(());
            }
        }
    }
}

impl SpeechSink for CommandSpeech {
    fn speak(&self, request: &SpeechRequest) -> Result<oneshot::Receiver<()>, SpeechError> {
        self.stop_current();

        let args: Vec<String> = self
            .args
            .iter()
            .map(|a| {
                a.replace("{locale}", &request.locale)
                    .replace("{rate}", &request.rate.to_string())
            })
            .collect();

        let mut child = tokio::process::Command::new(&self.program)
            .args(&args)
            .arg(&request.text)
            .kill_on_drop(true)
            .spawn()?;

        debug!(program = %self.program, "speech process spawned");

        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let (done_tx, done_rx) = oneshot::channel();
        if let Ok(mut guard) = self.current.lock() {
            *guard = Some(stop_tx);
        }

        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => {
                    match status {
                        Ok(status) if !status.success() => warn!("speech program exited with {}", status),
                        Err(e) => warn!("speech program wait failed: {}", e),
                        _ => {}
                    }
                    let _ = done_tx.send(());
                }
                _ = &mut stop_rx => {
                    let _ = child.kill().await;
                    // done_tx dropped: the utterance did not finish.
                }
            }
        });

        Ok(done_rx)
    }

    fn cancel(&self) {
        self.stop_current();
    }
}
