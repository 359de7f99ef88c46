//! Error types for `quill-core`.

use thiserror::Error;

use crate::post::PostType;

#[derive(Debug, Error)]
pub enum Error {
  #[error("missing required field: {0}")]
  MissingField(&'static str),

  #[error("{post_type} post requires {field} in media_data")]
  MissingMedia {
    post_type: PostType,
    field:     &'static str,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
