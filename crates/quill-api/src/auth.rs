//! Gateway-claims extractor.
//!
//! The upstream gateway authenticates the caller and forwards its claims as
//! base64-encoded JSON in a single request header. This module only decodes
//! them; it never verifies signatures.

use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use serde_json::{Map, Value};
use tracing::warn;

use quill_core::{
  AuthorResolver, author::Authorship, directory::IdentityDirectory,
  store::BlogStore,
};

use crate::{AppState, error::ApiError};

/// Claim names tried for the username, highest precedence first.
const USERNAME_CLAIMS: [&str; 3] = ["cognito:username", "username", "email"];

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
  pub subject_id: String,
  pub username:   Option<String>,
}

impl Principal {
  /// Decode the claims carried in `header_name`.
  pub fn from_headers(headers: &HeaderMap, header_name: &str) -> Result<Self, ApiError> {
    let raw = headers.get(header_name).ok_or(ApiError::Unauthorized)?;
    let raw = raw
      .to_str()
      .map_err(|_| ApiError::Forbidden("claims header is not valid text".into()))?;

    let decoded = decode_base64(raw.trim())
      .ok_or_else(|| ApiError::Forbidden("claims header is not valid base64".into()))?;
    let claims: Map<String, Value> = serde_json::from_slice(&decoded)
      .map_err(|_| ApiError::Forbidden("claims header is not a JSON object".into()))?;

    let subject_id = claim(&claims, "sub")
      .ok_or_else(|| ApiError::Forbidden("claims carry no subject".into()))?;
    let username = USERNAME_CLAIMS.iter().find_map(|name| claim(&claims, name));

    Ok(Self {
      subject_id: subject_id.to_owned(),
      username:   username.map(str::to_owned),
    })
  }

  /// Username recorded on new content; the subject id when none was supplied.
  pub fn cached_username(&self) -> &str {
    self.username.as_deref().unwrap_or(&self.subject_id)
  }

  /// Authorship for content written by this caller.
  ///
  /// The author snapshot is fetched with a single directory lookup; a failed
  /// lookup only means the snapshot is left out.
  pub async fn authorship<D: IdentityDirectory>(&self, directory: &D) -> Authorship {
    let snapshot = AuthorResolver::new(directory)
      .lookup_username(self.cached_username())
      .await;
    if snapshot.is_none() {
      warn!(
        subject_id = %self.subject_id,
        username = self.cached_username(),
        "author snapshot unavailable, writing without it"
      );
    }
    Authorship::new(&self.subject_id, self.cached_username(), snapshot)
  }
}

fn claim<'a>(claims: &'a Map<String, Value>, name: &str) -> Option<&'a str> {
  claims
    .get(name)
    .and_then(Value::as_str)
    .filter(|s| !s.is_empty())
}

/// Accepts both alphabets, with or without padding.
fn decode_base64(raw: &str) -> Option<Vec<u8>> {
  let unpadded = raw.trim_end_matches('=');
  URL_SAFE_NO_PAD
    .decode(unpadded)
    .or_else(|_| STANDARD_NO_PAD.decode(unpadded))
    .ok()
}

impl<S, D> FromRequestParts<AppState<S, D>> for Principal
where
  S: BlogStore + Clone + 'static,
  D: IdentityDirectory + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, D>,
  ) -> Result<Self, Self::Rejection> {
    Principal::from_headers(&parts.headers, &state.config.claims_header)
  }
}
