//! The SQLite implementation of [`IdentityDirectory`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use quill_core::directory::{
  IdentityDirectory, SUBJECT_ATTRIBUTE, UserAttribute, UserRecord,
};

use crate::{Error, Result, encode::encode_dt, schema::DIRECTORY_SCHEMA};

/// A user directory backed by a SQLite file.
///
/// Cloning is cheap; the connection handle is shared.
#[derive(Clone)]
pub struct SqliteDirectory {
  conn: tokio_rusqlite::Connection,
}

impl SqliteDirectory {
  /// Open (or create) a directory at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let directory = Self { conn };
    directory.init_schema().await?;
    Ok(directory)
  }

  /// Open an in-memory directory.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let directory = Self { conn };
    directory.init_schema().await?;
    Ok(directory)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(DIRECTORY_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Register a user. A subject id is generated when none is supplied.
  ///
  /// Returns [`Error::UserExists`] if the username or subject id is taken.
  pub async fn add_user(
    &self,
    username: &str,
    subject_id: Option<String>,
  ) -> Result<UserRecord> {
    let name       = username.to_owned();
    let subject_id = subject_id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let sub        = subject_id.clone();
    let at         = encode_dt(Utc::now());

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let taken: bool = conn
          .query_row(
            "SELECT 1 FROM users WHERE username = ?1 OR subject_id = ?2",
            rusqlite::params![name, sub],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(false);
        }
        conn.execute(
          "INSERT INTO users (username, subject_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![name, sub, at],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::UserExists(username.to_owned()));
    }

    Ok(UserRecord {
      canonical_username: username.to_owned(),
      attributes:         vec![UserAttribute::new(SUBJECT_ATTRIBUTE, subject_id)],
    })
  }
}

// ─── IdentityDirectory impl ──────────────────────────────────────────────────

impl IdentityDirectory for SqliteDirectory {
  type Error = Error;

  async fn get_user_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
    let name = username.to_owned();

    let found: Option<(String, String, Vec<UserAttribute>)> = self
      .conn
      .call(move |conn| {
        let user: Option<(String, String)> = conn
          .query_row(
            "SELECT username, subject_id FROM users WHERE username = ?1",
            rusqlite::params![name],
            |row| Ok((row.get(0)?, row.get(1)?)),
          )
          .optional()?;

        let Some((username, subject_id)) = user else {
          return Ok(None);
        };

        let mut stmt = conn.prepare(
          "SELECT name, value FROM user_attributes WHERE username = ?1 ORDER BY rowid",
        )?;
        let attributes = stmt
          .query_map(rusqlite::params![username], |row| {
            Ok(UserAttribute {
              name:  row.get(0)?,
              value: row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some((username, subject_id, attributes)))
      })
      .await?;

    Ok(found.map(|(username, subject_id, extra)| {
      let mut attributes = vec![UserAttribute::new(SUBJECT_ATTRIBUTE, subject_id)];
      attributes.extend(extra);
      UserRecord {
        canonical_username: username,
        attributes,
      }
    }))
  }

  async fn find_user_by_subject_id(&self, subject_id: &str) -> Result<Option<UserRecord>> {
    let sub = subject_id.to_owned();

    let username: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT username FROM users WHERE subject_id = ?1 LIMIT 1",
            rusqlite::params![sub],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;

    // Search results carry only the filtered attribute.
    Ok(username.map(|canonical_username| UserRecord {
      canonical_username,
      attributes: vec![UserAttribute::new(SUBJECT_ATTRIBUTE, subject_id)],
    }))
  }

  async fn update_attributes(
    &self,
    username: &str,
    attributes: Vec<UserAttribute>,
  ) -> Result<()> {
    let name = username.to_owned();

    let updated: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let exists: bool = tx
          .query_row(
            "SELECT 1 FROM users WHERE username = ?1",
            rusqlite::params![name],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(false);
        }
        for attr in &attributes {
          tx.execute(
            "INSERT INTO user_attributes (username, name, value) VALUES (?1, ?2, ?3)
             ON CONFLICT (username, name) DO UPDATE SET value = excluded.value",
            rusqlite::params![name, attr.name, attr.value],
          )?;
        }
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if updated {
      Ok(())
    } else {
      Err(Error::UserNotFound(username.to_owned()))
    }
  }
}
