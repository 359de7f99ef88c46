//! The `IdentityDirectory` trait and the user records it returns.
//!
//! The directory is the source of truth for who an author is. Quill never
//! writes identity data except through [`IdentityDirectory::update_attributes`]
//! on behalf of the authenticated principal.

use std::{collections::HashMap, future::Future};

use serde::{Deserialize, Serialize};

/// Prefix the directory puts on application-defined attribute names.
pub const CUSTOM_PREFIX: &str = "custom:";

/// Attribute holding the subject id.
pub const SUBJECT_ATTRIBUTE: &str = "sub";
/// Attribute holding the user-chosen display name.
pub const PREFERRED_USERNAME: &str = "preferred_username";
/// Attribute holding the profile-picture blob key (stored with [`CUSTOM_PREFIX`]).
pub const PROFILE_PICTURE_KEY: &str = "profile_picture_key";

// ─── Records ─────────────────────────────────────────────────────────────────

/// A single named attribute as the directory returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAttribute {
  pub name:  String,
  pub value: String,
}

impl UserAttribute {
  pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
    Self {
      name:  name.into(),
      value: value.into(),
    }
  }
}

/// A directory user. Search results may carry only a subset of attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
  pub canonical_username: String,
  /// Unordered; names may carry [`CUSTOM_PREFIX`].
  pub attributes:         Vec<UserAttribute>,
}

impl UserRecord {
  /// Attributes keyed by their bare name. On a collision after stripping, the
  /// later attribute wins. Empty values are dropped.
  pub fn stripped_attributes(&self) -> HashMap<&str, &str> {
    self
      .attributes
      .iter()
      .filter(|a| !a.value.is_empty())
      .map(|a| {
        let key = a.name.strip_prefix(CUSTOM_PREFIX).unwrap_or(&a.name);
        (key, a.value.as_str())
      })
      .collect()
  }

  pub fn subject_id(&self) -> Option<&str> {
    self.stripped_attributes().get(SUBJECT_ATTRIBUTE).copied()
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the identity directory.
///
/// `Ok(None)` means the directory answered and found nothing; `Err` means the
/// directory could not answer.
pub trait IdentityDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Exact point lookup by canonical username; returns the full record.
  fn get_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<UserRecord>, Self::Error>> + Send + 'a;

  /// Attribute-filtered search on the subject id. Returns at most one match,
  /// which may carry only partial attributes.
  fn find_user_by_subject_id<'a>(
    &'a self,
    subject_id: &'a str,
  ) -> impl Future<Output = Result<Option<UserRecord>, Self::Error>> + Send + 'a;

  /// Set (insert or overwrite) attributes on an existing user.
  fn update_attributes<'a>(
    &'a self,
    username: &'a str,
    attributes: Vec<UserAttribute>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
