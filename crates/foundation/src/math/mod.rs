pub mod geodesy;
pub mod mercator;

pub use geodesy::*;
