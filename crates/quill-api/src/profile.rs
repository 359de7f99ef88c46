//! Handlers for `/profile`, the caller's own directory record.
//!
//! Both routes act only on the record whose subject id matches the
//! authenticated principal.

use axum::{Json, extract::State};
use bytes::Bytes;
use quill_core::{
  AuthorResolver,
  directory::{
    CUSTOM_PREFIX, IdentityDirectory, PREFERRED_USERNAME, PROFILE_PICTURE_KEY,
    UserAttribute, UserRecord,
  },
  resolver::author_info,
  store::BlogStore,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppState, auth::Principal, error::ApiError, parse_json};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub subject_id:   String,
  pub username:     String,
  pub display_name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub avatar_key:   Option<String>,
}

impl Profile {
  fn from_record(subject_id: &str, record: &UserRecord) -> Self {
    let author = author_info(record);
    Self {
      subject_id:   subject_id.to_owned(),
      username:     record.canonical_username.clone(),
      display_name: author.display_name,
      avatar_key:   author.avatar_key,
    }
  }
}

async fn owned_record<D: IdentityDirectory>(
  directory: &D,
  principal: &Principal,
) -> Result<UserRecord, ApiError> {
  AuthorResolver::new(directory)
    .owned_record(&principal.subject_id, principal.username.as_deref())
    .await
    .ok_or_else(|| {
      ApiError::NotFound(format!("no profile for subject {}", principal.subject_id))
    })
}

/// `GET /profile`
pub async fn get_one<S, D>(
  State(state): State<AppState<S, D>>,
  principal: Principal,
) -> Result<Json<Profile>, ApiError>
where
  S: BlogStore,
  D: IdentityDirectory,
{
  let record = owned_record(&*state.directory, &principal).await?;
  Ok(Json(Profile::from_record(&principal.subject_id, &record)))
}

/// Accepts the camelCase spelling the web client sends.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateBody {
  #[serde(default, alias = "preferredUsername")]
  pub preferred_username:  Option<String>,
  #[serde(default, alias = "profilePictureKey")]
  pub profile_picture_key: Option<String>,
}

impl UpdateBody {
  fn attributes(&self) -> Vec<UserAttribute> {
    let mut attributes = Vec::new();
    if let Some(name) = trimmed(&self.preferred_username) {
      attributes.push(UserAttribute::new(PREFERRED_USERNAME, name));
    }
    if let Some(key) = trimmed(&self.profile_picture_key) {
      attributes.push(UserAttribute::new(
        format!("{CUSTOM_PREFIX}{PROFILE_PICTURE_KEY}"),
        key,
      ));
    }
    attributes
  }
}

fn trimmed(value: &Option<String>) -> Option<&str> {
  value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// `PUT /profile`, body: `{"preferred_username"?, "profile_picture_key"?}`
pub async fn update<S, D>(
  State(state): State<AppState<S, D>>,
  principal: Principal,
  body: Bytes,
) -> Result<Json<Profile>, ApiError>
where
  S: BlogStore,
  D: IdentityDirectory,
{
  let body: UpdateBody = parse_json(&body)?;
  let attributes = body.attributes();
  if attributes.is_empty() {
    return Err(ApiError::BadRequest(
      "preferred_username or profile_picture_key is required".into(),
    ));
  }

  let record = owned_record(&*state.directory, &principal).await?;
  let username = record.canonical_username;

  state
    .directory
    .update_attributes(&username, attributes)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  info!(subject_id = %principal.subject_id, %username, "profile updated");

  let updated = owned_record(&*state.directory, &principal).await?;
  Ok(Json(Profile::from_record(&principal.subject_id, &updated)))
}
