pub mod cancel;
pub mod effect;
pub mod event;
pub mod lifecycle;
pub mod reactor;
pub mod state;
pub mod telemetry;
pub mod ticker;
pub mod time;
