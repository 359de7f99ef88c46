//! JSON REST API for Quill.
//!
//! Exposes an axum [`Router`] backed by any [`BlogStore`] and
//! [`IdentityDirectory`]. Authentication happens upstream; handlers only read
//! the forwarded claims (see [`auth`]).

pub mod auth;
pub mod comments;
pub mod error;
pub mod posts;
pub mod profile;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  http::{HeaderValue, Method, header},
  routing::get,
};
use bytes::Bytes;
use quill_core::{directory::IdentityDirectory, store::BlogStore};
use serde::{Deserialize, de::DeserializeOwned};
use tower_http::{
  cors::{AllowOrigin, CorsLayer},
  trace::TraceLayer,
};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `QUILL_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:           String,
  pub port:           u16,
  pub store_path:     PathBuf,
  pub directory_path: PathBuf,
  #[serde(default)]
  pub api:            ApiConfig,
}

/// Settings that shape request handling.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
  /// Header carrying the gateway's base64 JSON claims.
  pub claims_header:     String,
  /// `*` or a single exact origin.
  pub cors_allow_origin: String,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      claims_header:     "x-authenticated-claims".into(),
      cors_allow_origin: "*".into(),
    }
  }
}

impl ApiConfig {
  pub fn allow_origin(&self) -> Result<AllowOrigin, header::InvalidHeaderValue> {
    if self.cors_allow_origin == "*" {
      return Ok(AllowOrigin::any());
    }
    Ok(AllowOrigin::exact(HeaderValue::from_str(&self.cors_allow_origin)?))
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S, D> {
  pub store:     Arc<S>,
  pub directory: Arc<D>,
  pub config:    Arc<ApiConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router.
///
/// An origin that fails [`ApiConfig::allow_origin`] allows no cross-origin
/// callers; the binary rejects such a config before getting here.
pub fn router<S, D>(state: AppState<S, D>) -> Router
where
  S: BlogStore + Clone + 'static,
  D: IdentityDirectory + Clone + 'static,
{
  let cors = CorsLayer::new()
    .allow_origin(
      state
        .config
        .allow_origin()
        .unwrap_or_else(|_| AllowOrigin::list([])),
    )
    .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

  Router::new()
    .route("/posts", get(posts::list::<S, D>).post(posts::create::<S, D>))
    .route("/posts/{id}", get(posts::get_one::<S, D>))
    .route(
      "/posts/{id}/comments",
      get(comments::list::<S, D>).post(comments::create::<S, D>),
    )
    .route("/profile", get(profile::get_one::<S, D>).put(profile::update::<S, D>))
    .layer(cors)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Request helpers ─────────────────────────────────────────────────────────

/// Parse a JSON body, reporting every failure as a 400.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
  if body.is_empty() {
    return Err(ApiError::BadRequest("request body is required".into()));
  }
  serde_json::from_slice(body)
    .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))
}

pub(crate) fn require_id<'a>(id: &'a str, what: &str) -> Result<&'a str, ApiError> {
  let id = id.trim();
  if id.is_empty() {
    return Err(ApiError::BadRequest(format!("{what} is required")));
  }
  Ok(id)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::URL_SAFE_NO_PAD;
  use quill_core::{
    comment::{Comment, NewComment},
    directory::{UserAttribute, UserRecord},
    post::{NewPost, Post},
    store::SortOrder,
  };
  use quill_store_sqlite::{SqliteDirectory, SqliteStore};
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  const CLAIMS: &str = "x-authenticated-claims";

  async fn make_state() -> AppState<SqliteStore, SqliteDirectory> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let directory = SqliteDirectory::open_in_memory().await.unwrap();

    directory.add_user("alice", Some("sub-1".into())).await.unwrap();
    directory
      .update_attributes("alice", vec![
        UserAttribute::new("preferred_username", "Alicia"),
        UserAttribute::new("custom:profile_picture_key", "profiles/sub-1.png"),
      ])
      .await
      .unwrap();
    directory.add_user("bob", Some("sub-2".into())).await.unwrap();

    AppState {
      store:     Arc::new(store),
      directory: Arc::new(directory),
      config:    Arc::new(ApiConfig::default()),
    }
  }

  fn claims(sub: &str, username: Option<&str>) -> String {
    let mut value = json!({ "sub": sub });
    if let Some(u) = username {
      value["cognito:username"] = json!(u);
    }
    URL_SAFE_NO_PAD.encode(value.to_string())
  }

  async fn send<S, D>(
    state: &AppState<S, D>,
    method: &str,
    uri: &str,
    claims: Option<String>,
    body: &str,
  ) -> Response
  where
    S: BlogStore + Clone + 'static,
    D: IdentityDirectory + Clone + 'static,
  {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(c) = claims {
      builder = builder.header(CLAIMS, c);
    }
    if !body.is_empty() {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();
    router(state.clone()).oneshot(req).await.unwrap()
  }

  async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  #[derive(Debug, thiserror::Error)]
  #[error("disk on fire")]
  struct Boom;

  /// A store where every call fails.
  #[derive(Clone)]
  struct BrokenStore;

  impl BlogStore for BrokenStore {
    type Error = Boom;
    async fn create_post(&self, _: NewPost) -> Result<Post, Boom> { Err(Boom) }
    async fn get_post(&self, _: &str) -> Result<Option<Post>, Boom> { Err(Boom) }
    async fn list_posts(&self) -> Result<Vec<Post>, Boom> { Err(Boom) }
    async fn create_comment(&self, _: NewComment) -> Result<Comment, Boom> { Err(Boom) }
    async fn list_comments(&self, _: &str, _: SortOrder) -> Result<Vec<Comment>, Boom> {
      Err(Boom)
    }
  }

  /// A directory where every call fails.
  #[derive(Clone)]
  struct DownDirectory;

  impl IdentityDirectory for DownDirectory {
    type Error = Boom;
    async fn get_user_by_username(&self, _: &str) -> Result<Option<UserRecord>, Boom> {
      Err(Boom)
    }
    async fn find_user_by_subject_id(&self, _: &str) -> Result<Option<UserRecord>, Boom> {
      Err(Boom)
    }
    async fn update_attributes(&self, _: &str, _: Vec<UserAttribute>) -> Result<(), Boom> {
      Err(Boom)
    }
  }

  async fn create_post(
    state: &AppState<SqliteStore, SqliteDirectory>,
    sub: &str,
    username: Option<&str>,
    title: &str,
  ) -> String {
    let body = json!({ "title": title, "content": "Body text" }).to_string();
    let resp = send(state, "POST", "/posts", Some(claims(sub, username)), &body).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    json_body(resp).await["post_id"].as_str().unwrap().to_owned()
  }

  // ── Posts ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_and_get_post_is_enriched() {
    let state = make_state().await;
    let id = create_post(&state, "sub-1", Some("alice"), "Hello").await;
    assert!(id.starts_with("post-"));

    let resp = send(&state, "GET", &format!("/posts/{id}"), None, "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let post = json_body(resp).await;
    assert_eq!(post["title"], "Hello");
    assert_eq!(post["subject_id"], "sub-1");
    assert_eq!(post["author"]["display_name"], "Alicia");
    assert_eq!(post["author_display_name"], "Alicia");
    assert_eq!(post["author_avatar_key"], "profiles/sub-1.png");
  }

  #[tokio::test]
  async fn get_missing_post_is_404() {
    let state = make_state().await;
    let resp = send(&state, "GET", "/posts/post-nope", None, "").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(json_body(resp).await["error"].is_string());
  }

  #[tokio::test]
  async fn list_posts_empty_is_empty_array() {
    let state = make_state().await;
    let resp = send(&state, "GET", "/posts", None, "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await, json!([]));
  }

  #[tokio::test]
  async fn stale_username_resolves_through_subject() {
    let state = make_state().await;
    // The claimed username matches nobody, so no snapshot is written.
    create_post(&state, "sub-2", Some("bob-renamed"), "From bob").await;

    let posts = json_body(send(&state, "GET", "/posts", None, "").await).await;
    assert_eq!(posts[0]["cached_username"], "bob-renamed");
    assert_eq!(posts[0]["author"]["display_name"], "bob");
    assert_eq!(posts[0]["author"]["canonical_username"], "bob");
  }

  #[tokio::test]
  async fn list_posts_newest_first() {
    let state = make_state().await;
    let older = create_post(&state, "sub-1", Some("alice"), "older").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let newer = create_post(&state, "sub-1", Some("alice"), "newer").await;

    let posts = json_body(send(&state, "GET", "/posts", None, "").await).await;
    assert_eq!(posts[0]["post_id"], newer.as_str());
    assert_eq!(posts[1]["post_id"], older.as_str());
  }

  #[tokio::test]
  async fn unknown_author_falls_back_to_cached_username() {
    let state = make_state().await;
    create_post(&state, "sub-404", Some("ghost"), "Orphan").await;

    let posts = json_body(send(&state, "GET", "/posts", None, "").await).await;
    assert_eq!(posts[0]["author"]["display_name"], "ghost");
    assert_eq!(posts[0]["author_display_name"], "ghost");
  }

  #[tokio::test]
  async fn create_post_without_claims_is_401() {
    let state = make_state().await;
    let body = json!({ "title": "t", "content": "c" }).to_string();
    let resp = send(&state, "POST", "/posts", None, &body).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn create_post_with_bad_claims_is_403() {
    let state = make_state().await;
    let body = json!({ "title": "t", "content": "c" }).to_string();
    let resp = send(&state, "POST", "/posts", Some("%%%".into()), &body).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn create_post_validation_errors_are_400() {
    let state = make_state().await;
    let auth = || Some(claims("sub-1", Some("alice")));

    let missing_title = json!({ "content": "c" }).to_string();
    let resp = send(&state, "POST", "/posts", auth(), &missing_title).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let image = json!({ "title": "t", "content": "c", "post_type": "image" }).to_string();
    let resp = send(&state, "POST", "/posts", auth(), &image).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(&state, "POST", "/posts", auth(), "{not json").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(&state, "POST", "/posts", auth(), "").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let wrong_type = json!({ "title": 5, "content": "c" }).to_string();
    let resp = send(&state, "POST", "/posts", auth(), &wrong_type).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn video_post_roundtrips_media() {
    let state = make_state().await;
    let body = json!({
      "title": "Watch",
      "content": "this",
      "post_type": "video",
      "media_data": { "youtube_id": "dQw4w9WgXcQ" },
    })
    .to_string();
    let resp = send(&state, "POST", "/posts", Some(claims("sub-1", Some("alice"))), &body).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let id = json_body(resp).await["post_id"].as_str().unwrap().to_owned();

    let post = json_body(send(&state, "GET", &format!("/posts/{id}"), None, "").await).await;
    assert_eq!(post["post_type"], "video");
    assert_eq!(post["media_data"]["youtube_id"], "dQw4w9WgXcQ");
  }

  // ── Comments ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn comments_are_listed_newest_first_and_enriched() {
    let state = make_state().await;
    let id = create_post(&state, "sub-1", Some("alice"), "Post").await;
    let uri = format!("/posts/{id}/comments");

    for text in ["first", "second"] {
      let body = json!({ "text": text }).to_string();
      let resp = send(&state, "POST", &uri, Some(claims("sub-2", Some("bob"))), &body).await;
      assert_eq!(resp.status(), StatusCode::CREATED);
      assert!(json_body(resp).await["comment_id"].as_str().unwrap().starts_with("comment-"));
      tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let comments = json_body(send(&state, "GET", &uri, None, "").await).await;
    assert_eq!(comments[0]["text"], "second");
    assert_eq!(comments[1]["text"], "first");
    assert_eq!(comments[0]["author"]["display_name"], "bob");
  }

  #[tokio::test]
  async fn blank_comment_is_400() {
    let state = make_state().await;
    let body = json!({ "text": "   " }).to_string();
    let resp = send(
      &state,
      "POST",
      "/posts/post-a/comments",
      Some(claims("sub-2", Some("bob"))),
      &body,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn list_comments_for_unknown_post_is_empty() {
    let state = make_state().await;
    let resp = send(&state, "GET", "/posts/post-z/comments", None, "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await, json!([]));
  }

  // ── Profile ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn get_profile_for_principal() {
    let state = make_state().await;
    let resp = send(&state, "GET", "/profile", Some(claims("sub-1", None)), "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let profile = json_body(resp).await;
    assert_eq!(profile["username"], "alice");
    assert_eq!(profile["display_name"], "Alicia");
    assert_eq!(profile["avatar_key"], "profiles/sub-1.png");
  }

  #[tokio::test]
  async fn update_profile_only_touches_own_record() {
    let state = make_state().await;
    // Claims name alice's username but carry bob's subject.
    let body = json!({ "preferredUsername": "Bobby" }).to_string();
    let resp = send(&state, "PUT", "/profile", Some(claims("sub-2", Some("alice"))), &body).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["username"], "bob");

    let alice = send(&state, "GET", "/profile", Some(claims("sub-1", None)), "").await;
    assert_eq!(json_body(alice).await["display_name"], "Alicia");
    let bob = send(&state, "GET", "/profile", Some(claims("sub-2", None)), "").await;
    assert_eq!(json_body(bob).await["display_name"], "Bobby");
  }

  #[tokio::test]
  async fn update_profile_without_fields_is_400() {
    let state = make_state().await;
    let body = json!({ "preferred_username": "  " }).to_string();
    let resp = send(&state, "PUT", "/profile", Some(claims("sub-1", None)), &body).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn profile_for_unknown_subject_is_404() {
    let state = make_state().await;
    let resp = send(&state, "GET", "/profile", Some(claims("sub-404", None)), "").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Backend failures ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn store_failures_are_500_with_message_and_cors() {
    let state = AppState {
      store:     Arc::new(BrokenStore),
      directory: Arc::new(SqliteDirectory::open_in_memory().await.unwrap()),
      config:    Arc::new(ApiConfig::default()),
    };
    let post_body = json!({ "title": "t", "content": "c" }).to_string();
    let comment_body = json!({ "text": "hi" }).to_string();
    let requests = [
      ("GET", "/posts", None, ""),
      ("GET", "/posts/post-1", None, ""),
      ("GET", "/posts/post-1/comments", None, ""),
      ("POST", "/posts", Some(claims("sub-1", Some("alice"))), post_body.as_str()),
      (
        "POST",
        "/posts/post-1/comments",
        Some(claims("sub-1", Some("alice"))),
        comment_body.as_str(),
      ),
    ];

    for (method, uri, auth, body) in requests {
      let resp = send(&state, method, uri, auth, body).await;
      assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
      assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
      assert_eq!(json_body(resp).await, json!({ "error": "disk on fire" }));
    }
  }

  #[tokio::test]
  async fn writes_succeed_when_author_lookup_fails() {
    let state = AppState {
      store:     Arc::new(SqliteStore::open_in_memory().await.unwrap()),
      directory: Arc::new(DownDirectory),
      config:    Arc::new(ApiConfig::default()),
    };
    let auth = || Some(claims("sub-1", Some("alice")));

    let body = json!({ "title": "t", "content": "c" }).to_string();
    let resp = send(&state, "POST", "/posts", auth(), &body).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let id = json_body(resp).await["post_id"].as_str().unwrap().to_owned();

    let stored = state.store.get_post(&id).await.unwrap().unwrap();
    assert_eq!(stored.authorship.subject_id.as_deref(), Some("sub-1"));
    assert_eq!(stored.authorship.cached_username.as_deref(), Some("alice"));
    assert_eq!(stored.authorship.author, None);

    let body = json!({ "text": "hi" }).to_string();
    let resp = send(&state, "POST", &format!("/posts/{id}/comments"), auth(), &body).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let comments = state.store.list_comments(&id, SortOrder::Descending).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].authorship.cached_username.as_deref(), Some("alice"));
    assert_eq!(comments[0].authorship.author, None);
  }

  // ── CORS ────────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn cors_headers_on_success_and_error() {
    let state = make_state().await;

    let ok = send(&state, "GET", "/posts", None, "").await;
    assert_eq!(ok.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let err = send(&state, "POST", "/posts", None, "{}").await;
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(err.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
  }

  #[tokio::test]
  async fn preflight_is_answered() {
    let state = make_state().await;
    let req = Request::builder()
      .method("OPTIONS")
      .uri("/posts")
      .header(header::ORIGIN, "https://blog.example")
      .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
      .body(Body::empty())
      .unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
  }

  #[test]
  fn allow_origin_rejects_invalid_values() {
    let config = ApiConfig {
      cors_allow_origin: "bad\norigin".into(),
      ..ApiConfig::default()
    };
    assert!(config.allow_origin().is_err());
  }
}
