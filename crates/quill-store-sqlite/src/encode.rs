//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings with millisecond
//! precision so that lexical order matches chronological order. Structured
//! fields (MediaData, AuthorInfo) are stored as compact JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use quill_core::{
  author::{AuthorInfo, Authorship},
  comment::Comment,
  post::{MediaData, Post, PostType},
};

use crate::{Error, Result};

// ─── DateTime<Utc>
// ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── PostType
// ─────────────────────────────────────────────────────────────────

pub fn encode_post_type(t: PostType) -> &'static str { t.as_str() }

pub fn decode_post_type(s: &str) -> Result<PostType> {
  match s {
    "text" => Ok(PostType::Text),
    "image" => Ok(PostType::Image),
    "video" => Ok(PostType::Video),
    other => Err(Error::UnknownPostType(other.to_owned())),
  }
}

// ─── MediaData / AuthorInfo
// ───────────────────────────────────────────────────

pub fn encode_media(m: &MediaData) -> Result<String> {
  Ok(serde_json::to_string(m)?)
}

pub fn decode_media(s: &str) -> Result<MediaData> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_author(a: Option<&AuthorInfo>) -> Result<Option<String>> {
  a.map(serde_json::to_string).transpose().map_err(Error::from)
}

pub fn decode_author(s: Option<&str>) -> Result<Option<AuthorInfo>> {
  s.map(serde_json::from_str::<AuthorInfo>).transpose().map_err(Error::from)
}

// ─── Authorship columns ──────────────────────────────────────────────────────

/// The five authorship columns shared by `posts` and `comments`.
pub struct AuthorshipColumns {
  pub subject_id:          Option<String>,
  pub cached_username:     Option<String>,
  pub author_json:         Option<String>,
  pub author_display_name: Option<String>,
  pub author_avatar_key:   Option<String>,
}

impl AuthorshipColumns {
  pub fn encode(a: &Authorship) -> Result<Self> {
    Ok(Self {
      subject_id:          a.subject_id.clone(),
      cached_username:     a.cached_username.clone(),
      author_json:         encode_author(a.author.as_ref())?,
      author_display_name: a.author_display_name.clone(),
      author_avatar_key:   a.author_avatar_key.clone(),
    })
  }

  fn decode(self) -> Result<Authorship> {
    Ok(Authorship {
      subject_id:          self.subject_id,
      cached_username:     self.cached_username,
      author:              decode_author(self.author_json.as_deref())?,
      author_display_name: self.author_display_name,
      author_avatar_key:   self.author_avatar_key,
    })
  }

  /// Read the columns starting at `offset`.
  fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id:          row.get(offset)?,
      cached_username:     row.get(offset + 1)?,
      author_json:         row.get(offset + 2)?,
      author_display_name: row.get(offset + 3)?,
      author_avatar_key:   row.get(offset + 4)?,
    })
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const POST_COLUMNS: &str = "post_id, title, content, post_type, media_data,
  subject_id, cached_username, author_json, author_display_name, author_avatar_key,
  created_at";

/// Raw strings read directly from a `posts` row.
pub struct RawPost {
  pub post_id:    String,
  pub title:      String,
  pub content:    String,
  pub post_type:  String,
  pub media_data: String,
  pub authorship: AuthorshipColumns,
  pub created_at: String,
}

impl RawPost {
  /// Map a row selected with [`POST_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      post_id:    row.get(0)?,
      title:      row.get(1)?,
      content:    row.get(2)?,
      post_type:  row.get(3)?,
      media_data: row.get(4)?,
      authorship: AuthorshipColumns::from_row(row, 5)?,
      created_at: row.get(10)?,
    })
  }

  pub fn into_post(self) -> Result<Post> {
    Ok(Post {
      post_id:    self.post_id,
      title:      self.title,
      content:    self.content,
      post_type:  decode_post_type(&self.post_type)?,
      media_data: decode_media(&self.media_data)?,
      authorship: self.authorship.decode()?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const COMMENT_COLUMNS: &str = "post_id, comment_id, text,
  subject_id, cached_username, author_json, author_display_name, author_avatar_key,
  created_at";

/// Raw strings read directly from a `comments` row.
pub struct RawComment {
  pub post_id:    String,
  pub comment_id: String,
  pub text:       String,
  pub authorship: AuthorshipColumns,
  pub created_at: String,
}

impl RawComment {
  /// Map a row selected with [`COMMENT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      post_id:    row.get(0)?,
      comment_id: row.get(1)?,
      text:       row.get(2)?,
      authorship: AuthorshipColumns::from_row(row, 3)?,
      created_at: row.get(8)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      post_id:    self.post_id,
      comment_id: self.comment_id,
      text:       self.text,
      authorship: self.authorship.decode()?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
