//! Error type for `quill-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] quill_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown post type: {0:?}")]
  UnknownPostType(String),

  #[error("user not found: {0}")]
  UserNotFound(String),

  #[error("user already exists: {0}")]
  UserExists(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
