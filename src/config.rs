use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::archive::DEFAULT_ARCHIVE_LIMIT;
use crate::kernel::time::TICK_MS;
use crate::screening::DEFAULT_SCAM_KEYWORDS;

/// Runtime configuration. Every field has a demo default; a JSON file may
/// override any subset of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub keywords: Vec<String>,
    pub archive_limit: usize,
    /// Locale for both speech output and live capture.
    pub locale: String,
    pub speech_rate: f32,
    /// Caller shown for the blacklisted demo call.
    pub flagged_number: String,
    /// Caller shown for the ordinary demo call; also stamped on saved records.
    pub plain_number: String,
    pub tick_ms: u64,
    /// Pause between transcript lines when reading a saved call aloud.
    pub playback_gap_ms: u64,
    pub data_dir: PathBuf,
    /// External TTS program and leading args; the text is appended last.
    /// Speech is only logged when unset.
    pub speech_command: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_SCAM_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            archive_limit: DEFAULT_ARCHIVE_LIMIT,
            locale: "vi-VN".to_string(),
            speech_rate: 0.9,
            flagged_number: "+84 912 345 678".to_string(),
            plain_number: "+84 987 654 321".to_string(),
            tick_ms: TICK_MS,
            playback_gap_ms: 500,
            data_dir: PathBuf::from("./data"),
            speech_command: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// `ELDERSHIELD_DATA_DIR` and `ELDERSHIELD_SPEECH_CMD` (whitespace
    /// separated) take precedence over file values.
    pub fn apply_env(mut self) -> Self {
        if let Ok(dir) = std::env::var("ELDERSHIELD_DATA_DIR") {
            if !dir.trim().is_empty() {
                self.data_dir = PathBuf::from(dir);
            }
        }
        if let Ok(cmd) = std::env::var("ELDERSHIELD_SPEECH_CMD") {
            let parts: Vec<String> = cmd.split_whitespace().map(str::to_string).collect();
            if !parts.is_empty() {
                self.speech_command = Some(parts);
            }
        }
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn playback_gap(&self) -> Duration {
        Duration::from_millis(self.playback_gap_ms)
    }
}
