//! QueryService: read-only projections. No session is required.

use std::sync::Arc;

use crate::{
  Error, Result,
  creator::Creator,
  deadline::Deadline,
  id::CreatorId,
  store::TagStore,
  tag::{TagListing, fold_case},
};

pub struct QueryService<S> {
  store:    Arc<S>,
  deadline: Deadline,
}

impl<S: TagStore> QueryService<S> {
  pub fn new(store: Arc<S>, deadline: Deadline) -> Self { Self { store, deadline } }

  pub async fn get_creator(&self, creator_id: CreatorId) -> Result<Creator> {
    self
      .deadline
      .run("get_creator", self.store.get_creator(creator_id))
      .await?
      .ok_or(Error::CreatorNotFound(creator_id))
  }

  /// The creator's tags in assignment order, each with its score. Empty for
  /// an unknown creator.
  pub async fn list_tags(&self, creator_id: CreatorId) -> Result<Vec<TagListing>> {
    self
      .deadline
      .run("list_tags", self.store.list_tags(creator_id))
      .await
  }

  /// Creators carrying a tag whose name contains `fragment`, compared
  /// case-insensitively. An exact name is the narrowest fragment.
  pub async fn search_creators_by_tag(&self, fragment: &str) -> Result<Vec<Creator>> {
    let fragment = fragment.trim();
    if fragment.is_empty() {
      return Err(Error::Validation("tag search term must not be empty".into()));
    }
    let key = fold_case(fragment);
    self
      .deadline
      .run("search_creators", self.store.search_creators(&key))
      .await
  }
}
