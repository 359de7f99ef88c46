//! Read-time enrichment of posts and comments with author display data.
//!
//! Enrichment produces a view for the response; nothing is written back to
//! the store. Directory lookups are deduplicated per call, so each distinct
//! subject is resolved once no matter how many items share it. The dedup table
//! lives only for the duration of one call.

use std::collections::HashMap;

use futures::future::join_all;
use tracing::debug;

use crate::{
  author::{AuthorInfo, Authored, Authorship, non_empty},
  directory::IdentityDirectory,
  resolver::AuthorResolver,
};

/// Attach author data to every item. Output has the same length and order as
/// the input.
pub async fn enrich<D, T>(directory: &D, mut items: Vec<T>) -> Vec<T>
where
  D: IdentityDirectory,
  T: Authored,
{
  // Distinct subjects in first-seen order, each with the first non-empty
  // cached username as its lookup hint.
  let mut keys: Vec<(&str, Option<&str>)> = Vec::new();
  let mut index: HashMap<&str, usize> = HashMap::new();
  for item in &items {
    let authorship = item.authorship();
    if authorship.is_enriched() {
      continue;
    }
    let Some(subject_id) = authorship.subject_id() else {
      continue;
    };
    let hint = authorship.cached_username();
    match index.get(subject_id) {
      Some(&i) => {
        if keys[i].1.is_none() {
          keys[i].1 = hint;
        }
      }
      None => {
        index.insert(subject_id, keys.len());
        keys.push((subject_id, hint));
      }
    }
  }

  let resolver = AuthorResolver::new(directory);
  let resolved: HashMap<String, Option<AuthorInfo>> =
    join_all(keys.into_iter().map(|(subject_id, hint)| async move {
      let author = resolver.resolve(subject_id, hint).await.into_author();
      (subject_id.to_owned(), author)
    }))
    .await
    .into_iter()
    .collect();

  debug!(
    items = items.len(),
    subjects = resolved.len(),
    found = resolved.values().filter(|a| a.is_some()).count(),
    "enriched batch"
  );

  for item in &mut items {
    if item.authorship().is_enriched() {
      continue;
    }
    let Some(subject_id) = item.authorship().subject_id().map(str::to_owned) else {
      item.authorship_mut().author = None;
      continue;
    };
    let fresh = resolved.get(&subject_id).cloned().flatten();
    if fresh.is_none() {
      debug!(item_id = item.item_id(), %subject_id, "using cached author fields");
    }
    apply(item.authorship_mut(), fresh);
  }

  items
}

/// Merge one resolution result into an item's authorship block.
fn apply(authorship: &mut Authorship, fresh: Option<AuthorInfo>) {
  match fresh {
    Some(author) => {
      authorship.author_display_name = Some(author.display_name.clone());
      authorship.author_avatar_key = author
        .avatar_key
        .clone()
        .or_else(|| non_empty(&authorship.author_avatar_key).map(str::to_owned));
      authorship.author = Some(author);
    }
    None => {
      let fallback = authorship.author.take().or_else(|| {
        authorship.cached_username().map(AuthorInfo::display_only)
      });
      if non_empty(&authorship.author_display_name).is_none() {
        authorship.author_display_name =
          fallback.as_ref().map(|a| a.display_name.clone());
      }
      if non_empty(&authorship.author_avatar_key).is_none() {
        authorship.author_avatar_key =
          fallback.as_ref().and_then(|a| a.avatar_key.clone());
      }
      authorship.author = fallback;
    }
  }
}
