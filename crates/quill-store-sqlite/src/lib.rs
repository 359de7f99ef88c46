//! SQLite backends for the Quill document store and identity directory.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The store and the directory each own a
//! connection and may point at the same file or at separate files.

mod directory;
mod encode;
mod schema;
mod store;

pub mod error;

pub use directory::SqliteDirectory;
pub use error::{Error, Result};
pub use store::SqliteStore;
