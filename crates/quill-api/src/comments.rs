//! Handlers for `/posts/{id}/comments`.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use bytes::Bytes;
use quill_core::{
  author::Authorship,
  comment::{Comment, NewComment},
  directory::IdentityDirectory,
  enrich,
  store::{BlogStore, SortOrder},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppState, auth::Principal, error::ApiError, parse_json, require_id};

/// `GET /posts/{id}/comments`, newest first.
pub async fn list<S, D>(
  State(state): State<AppState<S, D>>,
  Path(post_id): Path<String>,
) -> Result<Json<Vec<Comment>>, ApiError>
where
  S: BlogStore,
  D: IdentityDirectory,
{
  let post_id = require_id(&post_id, "post id")?;
  let comments = state
    .store
    .list_comments(post_id, SortOrder::Descending)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if comments.is_empty() {
    return Ok(Json(comments));
  }
  Ok(Json(enrich(&*state.directory, comments).await))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(default)]
  pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Created {
  pub message:    String,
  pub comment_id: String,
}

/// `POST /posts/{id}/comments`, body: `{"text":"..."}`
///
/// The post itself is not looked up.
pub async fn create<S, D>(
  State(state): State<AppState<S, D>>,
  Path(post_id): Path<String>,
  principal: Principal,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
  S: BlogStore,
  D: IdentityDirectory,
{
  let post_id = require_id(&post_id, "post id")?;
  let body: CreateBody = parse_json(&body)?;
  let mut input = NewComment {
    post_id:    post_id.to_owned(),
    text:       body.text,
    authorship: Authorship::default(),
  };
  input.validate()?;

  input.authorship = principal.authorship(&*state.directory).await;

  let comment = state
    .store
    .create_comment(input)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  info!(
    post_id,
    comment_id = %comment.comment_id,
    subject_id = %principal.subject_id,
    "comment created"
  );
  Ok((
    StatusCode::CREATED,
    Json(Created {
      message:    "comment created".into(),
      comment_id: comment.comment_id,
    }),
  ))
}
