pub mod synchronizer;
pub mod target;

pub use synchronizer::*;
pub use target::*;
