use tracing::debug;

use super::keywords::KeywordDetector;

/// Outcome of ingesting one finalized utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    /// Appended; no new warning.
    Recorded,
    /// Appended and this is the first keyword hit of the call.
    WarningRaised,
}

/// Transcript of the call in progress plus its one-shot scam signal.
#[derive(Debug, Clone, Default)]
pub struct TranscriptRecorder {
    detector: KeywordDetector,
    lines: Vec<String>,
    flagged: bool,
}

impl TranscriptRecorder {
    pub fn new(detector: KeywordDetector) -> Self {
        Self {
            detector,
            lines: Vec::new(),
            flagged: false,
        }
    }

    /// Appends the utterance and runs detection. Only the first hit per call
    /// reports [`Ingested::WarningRaised`]; later hits are still recorded.
    pub fn ingest(&mut self, utterance: impl Into<String>) -> Ingested {
        let utterance = utterance.into();
        let hit = self.detector.detect(&utterance);
        self.lines.push(utterance);

        if hit && !self.flagged {
            self.flagged = true;
            debug!(line = self.lines.len(), "scam keyword detected");
            Ingested::WarningRaised
        } else {
            Ingested::Recorded
        }
    }

    pub fn reset(&mut self) {
        self.lines.clear();
        self.flagged = false;
    }

    pub fn transcript(&self) -> &[String] {
        &self.lines
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.lines.clone()
    }

    /// Whether the one-shot signal has fired this call.
    pub fn flagged(&self) -> bool {
        self.flagged
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
