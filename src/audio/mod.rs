pub mod capture;

pub use capture::{
    CaptureConfig, CaptureError, ConsoleCapture, ConsoleFeed, NoCapture, ScriptLine,
    ScriptedCapture, UtteranceSink, UtteranceSource,
};
