//! Session telemetry for the call screen.
//!
//! # SAFETY INVARIANT
//! Telemetry is a READ-ONLY side-effect layer. The lifecycle never reads it
//! to make a decision.
//!
//! # PRIVACY INVARIANT
//! Events never carry transcript text or phone numbers, only epochs, states,
//! durations and counts.

pub mod event;
pub mod metrics;
pub mod recorder;
