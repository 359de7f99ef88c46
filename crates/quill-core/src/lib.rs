//! Content model, storage and directory traits, and author enrichment for
//! Quill.
//!
//! No HTTP or database code lives here; backends and the API crate build on
//! these types.

// Trait methods return `impl Future + Send` explicitly; impls use `async fn`.
#![allow(async_fn_in_trait)]

pub mod author;
pub mod comment;
pub mod directory;
pub mod enrich;
pub mod error;
pub mod post;
pub mod resolver;
pub mod store;

#[cfg(test)]
mod testing;

pub use enrich::enrich;
pub use error::{Error, Result};
pub use resolver::{AuthorResolver, Resolution};
