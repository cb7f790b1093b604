//! TagCatalog: the canonical, case-insensitively unique set of tag names.

use std::sync::Arc;

use crate::{
  Result,
  deadline::Deadline,
  store::TagStore,
  tag::{Tag, TagName},
};

pub struct TagCatalog<S> {
  store:    Arc<S>,
  deadline: Deadline,
}

impl<S: TagStore> TagCatalog<S> {
  pub fn new(store: Arc<S>, deadline: Deadline) -> Self { Self { store, deadline } }

  /// Find or create the tag whose name folds to the same key as `name`.
  ///
  /// Names differing only by case resolve to one tag, even when resolved
  /// concurrently. The stored display form is the first writer's.
  pub async fn resolve_tag(&self, name: &str) -> Result<Tag> {
    let name = TagName::parse(name)?;
    let tag = self
      .deadline
      .run("resolve_tag", self.store.resolve_tag(&name))
      .await?;
    tracing::debug!(tag_id = %tag.tag_id, name = %tag.name, "tag resolved");
    Ok(tag)
  }
}
