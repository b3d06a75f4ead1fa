pub mod keywords;
pub mod transcript;

pub use keywords::{detect, KeywordDetector, DEFAULT_SCAM_KEYWORDS};
pub use transcript::{Ingested, TranscriptRecorder};
