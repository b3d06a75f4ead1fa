pub mod types;
pub mod store;
pub mod calls;
pub mod format;

pub use types::*;
pub use store::*;
pub use calls::*;
