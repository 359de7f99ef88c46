//! Author display data and the denormalised authorship block carried by every
//! piece of content.
//!
//! The subject id is the only authoritative author reference. Everything else
//! in [`Authorship`] is a best-effort cache captured at write time, and may be
//! stale or missing entirely.

use serde::{Deserialize, Serialize};

/// Normalised author display record, derived from the identity directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorInfo {
  /// Preferred label: `preferred_username`, else the canonical username, else
  /// whatever cached name was available.
  pub display_name:       String,
  /// The directory's canonical username. Absent only on a fallback built from
  /// a cached username.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub canonical_username: Option<String>,
  /// Opaque blob-store key for the profile picture; not a URL.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub avatar_key:         Option<String>,
}

impl AuthorInfo {
  /// A minimal record carrying only a display name.
  pub fn display_only(display_name: impl Into<String>) -> Self {
    Self {
      display_name:       display_name.into(),
      canonical_username: None,
      avatar_key:         None,
    }
  }
}

/// Who wrote an item, as recorded alongside it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorship {
  /// Stable directory identifier of the author. Immutable.
  #[serde(default)]
  pub subject_id:          Option<String>,
  /// Username captured at write time.
  #[serde(default)]
  pub cached_username:     Option<String>,
  /// Snapshot captured at write time; on read responses, the enriched view.
  #[serde(default)]
  pub author:              Option<AuthorInfo>,
  /// Flattened mirror of `author.display_name`.
  #[serde(default)]
  pub author_display_name: Option<String>,
  /// Flattened mirror of `author.avatar_key`.
  #[serde(default)]
  pub author_avatar_key:   Option<String>,
}

impl Authorship {
  /// Authorship for a freshly written item, with an optional snapshot.
  pub fn new(
    subject_id: impl Into<String>,
    cached_username: impl Into<String>,
    snapshot: Option<AuthorInfo>,
  ) -> Self {
    let author_display_name = snapshot.as_ref().map(|a| a.display_name.clone());
    let author_avatar_key = snapshot.as_ref().and_then(|a| a.avatar_key.clone());
    Self {
      subject_id: Some(subject_id.into()),
      cached_username: Some(cached_username.into()),
      author: snapshot,
      author_display_name,
      author_avatar_key,
    }
  }

  /// The subject id, if present and non-empty.
  pub fn subject_id(&self) -> Option<&str> { non_empty(&self.subject_id) }

  /// The cached username, if present and non-empty.
  pub fn cached_username(&self) -> Option<&str> {
    non_empty(&self.cached_username)
  }

  /// True when the item already carries both an author snapshot and a
  /// non-empty display name, so a directory lookup can be skipped.
  pub fn is_enriched(&self) -> bool {
    self.author.is_some() && non_empty(&self.author_display_name).is_some()
  }
}

/// Content that carries an [`Authorship`] block: posts and comments.
pub trait Authored {
  /// Identifier used in log output.
  fn item_id(&self) -> &str;
  fn authorship(&self) -> &Authorship;
  fn authorship_mut(&mut self) -> &mut Authorship;
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
  value.as_deref().filter(|s| !s.is_empty())
}
