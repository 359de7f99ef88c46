//! Author resolution against the identity directory.
//!
//! Resolution never fails. Each directory call is attempted at most once per
//! step; errors and misses are logged and degrade to "no result for this
//! step".

use tracing::{debug, warn};

use crate::{
  author::AuthorInfo,
  directory::{IdentityDirectory, PREFERRED_USERNAME, PROFILE_PICTURE_KEY, UserRecord},
};

/// Outcome of resolving one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
  /// Found by point lookup on the cached username.
  ByUsername(AuthorInfo),
  /// Found by subject-id search, then re-fetched by canonical username.
  BySubjectId(AuthorInfo),
  Unresolved,
}

impl Resolution {
  pub fn author(&self) -> Option<&AuthorInfo> {
    match self {
      Self::ByUsername(a) | Self::BySubjectId(a) => Some(a),
      Self::Unresolved => None,
    }
  }

  pub fn into_author(self) -> Option<AuthorInfo> {
    match self {
      Self::ByUsername(a) | Self::BySubjectId(a) => Some(a),
      Self::Unresolved => None,
    }
  }
}

/// Build the display record for a full directory user.
pub fn author_info(record: &UserRecord) -> AuthorInfo {
  let attrs = record.stripped_attributes();
  AuthorInfo {
    display_name:       attrs
      .get(PREFERRED_USERNAME)
      .map_or_else(|| record.canonical_username.clone(), |s| (*s).to_owned()),
    canonical_username: Some(record.canonical_username.clone()),
    avatar_key:         attrs.get(PROFILE_PICTURE_KEY).map(|s| (*s).to_owned()),
  }
}

/// Resolves subjects to [`AuthorInfo`] through an [`IdentityDirectory`].
pub struct AuthorResolver<'d, D> {
  directory: &'d D,
}

// Manual impls: a derive would demand `D: Clone`.
impl<D> Clone for AuthorResolver<'_, D> {
  fn clone(&self) -> Self { *self }
}

impl<D> Copy for AuthorResolver<'_, D> {}

impl<'d, D: IdentityDirectory> AuthorResolver<'d, D> {
  pub fn new(directory: &'d D) -> Self { Self { directory } }

  /// Resolve `subject_id`, trying `cached_username` first when it is
  /// non-empty.
  pub async fn resolve(
    &self,
    subject_id: &str,
    cached_username: Option<&str>,
  ) -> Resolution {
    if let Some(username) = cached_username.filter(|u| !u.is_empty())
      && let Some(author) = self.lookup_username(username).await
    {
      return Resolution::ByUsername(author);
    }

    let Some(partial) = self.search_subject(subject_id).await else {
      debug!(subject_id, ?cached_username, "author unresolved");
      return Resolution::Unresolved;
    };

    // Search results may carry partial attributes; fetch the full record.
    match self.lookup_username(&partial.canonical_username).await {
      Some(author) => Resolution::BySubjectId(author),
      None => {
        debug!(subject_id, ?cached_username, "author unresolved");
        Resolution::Unresolved
      }
    }
  }

  /// A single point lookup by username. Any failure yields `None`.
  pub async fn lookup_username(&self, username: &str) -> Option<AuthorInfo> {
    self.fetch_username(username).await.map(|r| author_info(&r))
  }

  /// The full directory record belonging to `subject_id`.
  ///
  /// Unlike [`Self::resolve`], a record found through `username` is only
  /// accepted if its subject id matches, so a stale or foreign username can
  /// never select somebody else's record.
  pub async fn owned_record(
    &self,
    subject_id: &str,
    username: Option<&str>,
  ) -> Option<UserRecord> {
    if let Some(username) = username.filter(|u| !u.is_empty())
      && let Some(record) = self.fetch_username(username).await
    {
      if record.subject_id() == Some(subject_id) {
        return Some(record);
      }
      warn!(subject_id, username, "username belongs to a different subject");
    }

    let partial = self.search_subject(subject_id).await?;
    self
      .fetch_username(&partial.canonical_username)
      .await
      .filter(|r| r.subject_id() == Some(subject_id))
  }

  async fn fetch_username(&self, username: &str) -> Option<UserRecord> {
    match self.directory.get_user_by_username(username).await {
      Ok(Some(record)) => Some(record),
      Ok(None) => {
        debug!(username, "no directory user with this username");
        None
      }
      Err(e) => {
        warn!(username, error = %e, "directory lookup by username failed");
        None
      }
    }
  }

  async fn search_subject(&self, subject_id: &str) -> Option<UserRecord> {
    match self.directory.find_user_by_subject_id(subject_id).await {
      Ok(Some(record)) => Some(record),
      Ok(None) => {
        debug!(subject_id, "no directory user with this subject id");
        None
      }
      Err(e) => {
        warn!(subject_id, error = %e, "directory search by subject id failed");
        None
      }
    }
  }
}
