//! Posts: the top-level content items of the blog.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  author::{Authored, Authorship},
};

// ─── Media ───────────────────────────────────────────────────────────────────

/// How a post's body should be presented.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
  #[default]
  Text,
  Image,
  Video,
}

impl PostType {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Text => "text",
      Self::Image => "image",
      Self::Video => "video",
    }
  }
}

impl fmt::Display for PostType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Rich-media references attached to image and video posts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaData {
  /// An absolute URL or a blob-store key.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_url:  Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub youtube_id: Option<String>,
}

// ─── Post ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
  pub post_id:    String,
  pub title:      String,
  pub content:    String,
  pub post_type:  PostType,
  pub media_data: MediaData,
  #[serde(flatten)]
  pub authorship: Authorship,
  /// Server-assigned; never changes after creation.
  pub created_at: DateTime<Utc>,
}

impl Authored for Post {
  fn item_id(&self) -> &str { &self.post_id }

  fn authorship(&self) -> &Authorship { &self.authorship }

  fn authorship_mut(&mut self) -> &mut Authorship { &mut self.authorship }
}

// ─── NewPost ─────────────────────────────────────────────────────────────────

/// Input to [`crate::store::BlogStore::create_post`].
/// `post_id` and `created_at` are always set by the store.
#[derive(Debug, Clone)]
pub struct NewPost {
  pub title:      String,
  pub content:    String,
  pub post_type:  PostType,
  pub media_data: MediaData,
  pub authorship: Authorship,
}

impl NewPost {
  /// Check required fields and the media reference demanded by `post_type`.
  pub fn validate(&self) -> Result<()> {
    if self.title.trim().is_empty() {
      return Err(Error::MissingField("title"));
    }
    if self.content.trim().is_empty() {
      return Err(Error::MissingField("content"));
    }
    let required = match self.post_type {
      PostType::Text => None,
      PostType::Image => Some(("image_url", &self.media_data.image_url)),
      PostType::Video => Some(("youtube_id", &self.media_data.youtube_id)),
    };
    if let Some((field, value)) = required
      && value.as_deref().is_none_or(str::is_empty)
    {
      return Err(Error::MissingMedia {
        post_type: self.post_type,
        field,
      });
    }
    Ok(())
  }
}
