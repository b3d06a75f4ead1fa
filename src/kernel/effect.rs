use super::state::{CallState, Notice, Prompt};
use super::time::CallEpoch;
use crate::archive::CallRecord;

/// One utterance for the speech synthesis sink.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub locale: String,
    pub rate: f32,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>, locale: impl Into<String>, rate: f32) -> Self {
        Self {
            text: text.into(),
            locale: locale.into(),
            rate,
        }
    }
}

/// Spoken warnings raised by the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    /// Incoming caller is on the blacklist.
    ScamCall,
    /// The live transcript tripped the keyword detector.
    ScamIndicators,
}

impl Warning {
    pub fn text(&self) -> &'static str {
        match self {
            Warning::ScamCall => "Cảnh báo! Cuộc gọi lừa đảo!",
            Warning::ScamIndicators => "Cảnh báo! Phát hiện dấu hiệu lừa đảo!",
        }
    }
}

/// Requests emitted by the lifecycle for the driver to carry out.
/// The lifecycle itself never touches I/O.
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    Transition { from: CallState, to: CallState },
    Speak(SpeechRequest),
    CancelSpeech,
    StartTimer(CallEpoch),
    StopTimer,
    Elapsed(u64),
    StartCapture(CallEpoch),
    StopCapture,
    TranscriptLine(String),
    ShowPrompt(Prompt),
    ClearPrompt,
    Notice(Notice),
    /// Finalized record for the call archive.
    Archive(CallRecord),
}
