pub mod playback;
pub mod speech;

pub use playback::{play_transcript, PlaybackOutcome};
pub use speech::{CommandSpeech, LogSpeech, MuteSpeech, SpeechError, SpeechSink};
