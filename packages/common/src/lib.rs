pub mod api;
pub mod cache;
pub mod error;

pub use api::*;
pub use cache::*;
pub use error::*;
