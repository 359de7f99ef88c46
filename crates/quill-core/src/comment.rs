//! Comments, short replies partitioned under a post.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  author::{Authored, Authorship},
};

/// A comment, keyed by `(post_id, comment_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
  pub post_id:    String,
  pub comment_id: String,
  pub text:       String,
  #[serde(flatten)]
  pub authorship: Authorship,
  pub created_at: DateTime<Utc>,
}

impl Authored for Comment {
  fn item_id(&self) -> &str { &self.comment_id }

  fn authorship(&self) -> &Authorship { &self.authorship }

  fn authorship_mut(&mut self) -> &mut Authorship { &mut self.authorship }
}

/// Input to [`crate::store::BlogStore::create_comment`].
#[derive(Debug, Clone)]
pub struct NewComment {
  pub post_id:    String,
  pub text:       String,
  pub authorship: Authorship,
}

impl NewComment {
  pub fn validate(&self) -> Result<()> {
    if self.post_id.is_empty() {
      return Err(Error::MissingField("post_id"));
    }
    if self.text.trim().is_empty() {
      return Err(Error::MissingField("text"));
    }
    Ok(())
  }
}
