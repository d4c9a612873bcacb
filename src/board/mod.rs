//! Posts and threaded comments.

pub mod handlers;
mod service;

pub use service::{BoardService, MAX_COMMENT_LENGTH};
