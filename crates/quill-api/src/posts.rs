//! Handlers for `/posts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/posts` | Newest first, enriched |
//! | `POST` | `/posts` | Body: `{"title","content","post_type","media_data"}` |
//! | `GET`  | `/posts/{id}` | 404 if not found |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use bytes::Bytes;
use quill_core::{
  author::Authorship,
  directory::IdentityDirectory,
  enrich,
  post::{MediaData, NewPost, Post, PostType},
  store::BlogStore,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppState, auth::Principal, error::ApiError, parse_json, require_id};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /posts`
pub async fn list<S, D>(
  State(state): State<AppState<S, D>>,
) -> Result<Json<Vec<Post>>, ApiError>
where
  S: BlogStore,
  D: IdentityDirectory,
{
  let posts = state
    .store
    .list_posts()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if posts.is_empty() {
    return Ok(Json(posts));
  }
  Ok(Json(enrich(&*state.directory, posts).await))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(default)]
  pub title:      String,
  #[serde(default)]
  pub content:    String,
  #[serde(default)]
  pub post_type:  PostType,
  #[serde(default)]
  pub media_data: MediaData,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Created {
  pub message: String,
  pub post_id: String,
}

/// `POST /posts`
pub async fn create<S, D>(
  State(state): State<AppState<S, D>>,
  principal: Principal,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
  S: BlogStore,
  D: IdentityDirectory,
{
  let body: CreateBody = parse_json(&body)?;
  let mut input = NewPost {
    title:      body.title,
    content:    body.content,
    post_type:  body.post_type,
    media_data: body.media_data,
    authorship: Authorship::default(),
  };
  input.validate()?;

  input.authorship = principal.authorship(&*state.directory).await;

  let post = state
    .store
    .create_post(input)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  info!(post_id = %post.post_id, subject_id = %principal.subject_id, "post created");
  Ok((
    StatusCode::CREATED,
    Json(Created {
      message: "post created".into(),
      post_id: post.post_id,
    }),
  ))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /posts/{id}`
pub async fn get_one<S, D>(
  State(state): State<AppState<S, D>>,
  Path(id): Path<String>,
) -> Result<Json<Post>, ApiError>
where
  S: BlogStore,
  D: IdentityDirectory,
{
  let id = require_id(&id, "post id")?;
  let post = state
    .store
    .get_post(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("post {id} not found")))?;

  enrich(&*state.directory, vec![post])
    .await
    .pop()
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("post {id} not found")))
}
