pub mod bounds;
pub mod ids;
pub mod viewport;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use ids::*;
pub use viewport::*;
