//! The `BlogStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `quill-store-sqlite`).
//! Handlers depend on this abstraction, not on any concrete backend. Every
//! method is a single independent call: no transactions, no conditional
//! writes, no retries.

use std::future::Future;

use crate::{
  comment::{Comment, NewComment},
  post::{NewPost, Post},
};

/// Ordering of a partition query on `created_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
  Ascending,
  /// Newest first.
  #[default]
  Descending,
}

/// Abstraction over the document store holding posts and comments.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait BlogStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Posts ─────────────────────────────────────────────────────────────

  /// Persist a new post. The store assigns `post_id` and `created_at`.
  fn create_post(
    &self,
    input: NewPost,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  /// Point lookup by partition key. Returns `None` if not found.
  fn get_post<'a>(
    &'a self,
    post_id: &'a str,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + 'a;

  /// Full scan of every post, newest first.
  fn list_posts(
    &self,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  /// Persist a new comment. The store assigns `comment_id` and `created_at`.
  fn create_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// All comments in the `post_id` partition.
  fn list_comments<'a>(
    &'a self,
    post_id: &'a str,
    order: SortOrder,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + 'a;
}
