//! In-memory identity directory double that counts calls.

use std::{
  collections::HashMap,
  sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use crate::directory::{IdentityDirectory, SUBJECT_ATTRIBUTE, UserAttribute, UserRecord};

#[derive(Debug, thiserror::Error)]
#[error("directory unavailable")]
pub struct Unavailable;

#[derive(Default)]
pub struct FakeDirectory {
  users:         Mutex<HashMap<String, UserRecord>>,
  failing:       bool,
  username_hits: AtomicUsize,
  subject_hits:  AtomicUsize,
}

impl FakeDirectory {
  pub fn new() -> Self { Self::default() }

  pub fn with_user(self, username: &str, subject_id: &str, attrs: &[(&str, &str)]) -> Self {
    let mut attributes = vec![UserAttribute::new(SUBJECT_ATTRIBUTE, subject_id)];
    attributes.extend(attrs.iter().map(|(n, v)| UserAttribute::new(*n, *v)));
    self.users.lock().unwrap().insert(username.to_owned(), UserRecord {
      canonical_username: username.to_owned(),
      attributes,
    });
    self
  }

  /// Every call fails with [`Unavailable`].
  pub fn failing(mut self) -> Self {
    self.failing = true;
    self
  }

  pub fn username_calls(&self) -> usize { self.username_hits.load(Ordering::SeqCst) }

  pub fn subject_calls(&self) -> usize { self.subject_hits.load(Ordering::SeqCst) }
}

impl IdentityDirectory for FakeDirectory {
  type Error = Unavailable;

  async fn get_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, Unavailable> {
    self.username_hits.fetch_add(1, Ordering::SeqCst);
    tokio::task::yield_now().await;
    if self.failing {
      return Err(Unavailable);
    }
    Ok(self.users.lock().unwrap().get(username).cloned())
  }

  async fn find_user_by_subject_id(
    &self,
    subject_id: &str,
  ) -> Result<Option<UserRecord>, Unavailable> {
    self.subject_hits.fetch_add(1, Ordering::SeqCst);
    tokio::task::yield_now().await;
    if self.failing {
      return Err(Unavailable);
    }
    let users = self.users.lock().unwrap();
    Ok(
      users
        .values()
        .find(|u| u.subject_id() == Some(subject_id))
        .map(|u| UserRecord {
          canonical_username: u.canonical_username.clone(),
          attributes:         vec![UserAttribute::new(SUBJECT_ATTRIBUTE, subject_id)],
        }),
    )
  }

  async fn update_attributes(
    &self,
    username: &str,
    attributes: Vec<UserAttribute>,
  ) -> Result<(), Unavailable> {
    if self.failing {
      return Err(Unavailable);
    }
    if let Some(user) = self.users.lock().unwrap().get_mut(username) {
      user.attributes.extend(attributes);
    }
    Ok(())
  }
}
