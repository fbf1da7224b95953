pub mod annotate;
pub mod config;
pub mod session;

pub use annotate::*;
pub use config::*;
pub use session::*;
