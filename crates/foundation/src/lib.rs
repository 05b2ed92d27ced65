pub mod bounds;
pub mod color;
pub mod lonlat;
pub mod math;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use color::*;
pub use lonlat::*;
