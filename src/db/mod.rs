//! Persistence for accounts, refresh sessions, posts and comments.
//!
//! Services talk to the `CredentialStore` and `BoardStore` traits; Postgres
//! (`DbOperations`) and an in-process `MemoryStore` implement both.

pub mod memory;
pub mod models;
pub mod operations;
pub mod store;

pub use memory::MemoryStore;
pub use models::{Comment, NewComment, NewPost, NewUser, Post, User};
pub use operations::DbOperations;
pub use store::{BoardStore, CredentialStore};
