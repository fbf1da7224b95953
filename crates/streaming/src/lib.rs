pub mod buffer;
pub mod cache;
pub mod config;
pub mod fetch;
pub mod http;
pub mod pipeline;
pub mod place;
pub mod protocol;
pub mod request;
pub mod search;

pub use buffer::*;
pub use cache::*;
pub use config::*;
pub use fetch::*;
pub use http::*;
pub use pipeline::*;
pub use place::*;
pub use protocol::*;
pub use request::*;
pub use search::*;
