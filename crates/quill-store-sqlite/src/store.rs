//! [`SqliteStore`], the SQLite implementation of [`BlogStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use quill_core::{
  comment::{Comment, NewComment},
  post::{NewPost, Post},
  store::{BlogStore, SortOrder},
};

use crate::{
  Result,
  encode::{
    AuthorshipColumns, COMMENT_COLUMNS, POST_COLUMNS, RawComment, RawPost,
    encode_dt, encode_media, encode_post_type,
  },
  schema::STORE_SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Quill document store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(STORE_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── BlogStore impl ──────────────────────────────────────────────────────────

impl BlogStore for SqliteStore {
  type Error = crate::Error;

  // ── Posts ─────────────────────────────────────────────────────────────────

  async fn create_post(&self, input: NewPost) -> Result<Post> {
    input.validate()?;

    let post = Post {
      post_id:    format!("post-{}", Uuid::new_v4().simple()),
      title:      input.title,
      content:    input.content,
      post_type:  input.post_type,
      media_data: input.media_data,
      authorship: input.authorship,
      created_at: Utc::now(),
    };

    let post_id     = post.post_id.clone();
    let title       = post.title.clone();
    let content     = post.content.clone();
    let post_type   = encode_post_type(post.post_type);
    let media_data  = encode_media(&post.media_data)?;
    let author      = AuthorshipColumns::encode(&post.authorship)?;
    let created_at  = encode_dt(post.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO posts (
             post_id, title, content, post_type, media_data,
             subject_id, cached_username, author_json,
             author_display_name, author_avatar_key, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          rusqlite::params![
            post_id,
            title,
            content,
            post_type,
            media_data,
            author.subject_id,
            author.cached_username,
            author.author_json,
            author.author_display_name,
            author.author_avatar_key,
            created_at,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(post)
  }

  async fn get_post(&self, post_id: &str) -> Result<Option<Post>> {
    let id = post_id.to_owned();

    let raw: Option<RawPost> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {POST_COLUMNS} FROM posts WHERE post_id = ?1"),
            rusqlite::params![id],
            RawPost::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPost::into_post).transpose()
  }

  async fn list_posts(&self) -> Result<Vec<Post>> {
    let raws: Vec<RawPost> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, post_id DESC"
        ))?;
        let rows = stmt
          .query_map([], RawPost::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPost::into_post).collect()
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn create_comment(&self, input: NewComment) -> Result<Comment> {
    input.validate()?;

    let comment = Comment {
      post_id:    input.post_id,
      comment_id: format!("comment-{}", Uuid::new_v4().simple()),
      text:       input.text,
      authorship: input.authorship,
      created_at: Utc::now(),
    };

    let post_id    = comment.post_id.clone();
    let comment_id = comment.comment_id.clone();
    let text       = comment.text.clone();
    let author     = AuthorshipColumns::encode(&comment.authorship)?;
    let created_at = encode_dt(comment.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO comments (
             post_id, comment_id, text,
             subject_id, cached_username, author_json,
             author_display_name, author_avatar_key, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            post_id,
            comment_id,
            text,
            author.subject_id,
            author.cached_username,
            author.author_json,
            author.author_display_name,
            author.author_avatar_key,
            created_at,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(comment)
  }

  async fn list_comments(
    &self,
    post_id: &str,
    order:   SortOrder,
  ) -> Result<Vec<Comment>> {
    let id = post_id.to_owned();
    let direction = match order {
      SortOrder::Ascending => "ASC",
      SortOrder::Descending => "DESC",
    };

    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COMMENT_COLUMNS} FROM comments
           WHERE post_id = ?1
           ORDER BY created_at {direction}, comment_id {direction}"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id], RawComment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }
}
