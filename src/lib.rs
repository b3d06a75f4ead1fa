pub mod archive;
pub mod audio;
pub mod config;
pub mod kernel;
pub mod outputs;
pub mod permissions;
pub mod screening;

pub use kernel::lifecycle::CallLifecycle;
pub use kernel::reactor::Reactor;
