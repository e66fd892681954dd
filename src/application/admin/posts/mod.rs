mod commands;
mod service;
pub mod types;

pub use service::*;
pub use types::{AdminPostError, NormalizedPost, ensure_max_chars, ensure_non_empty, publication_time};
