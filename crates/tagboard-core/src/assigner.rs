//! CreatorTagAssigner: creators, and the links between creators and tags.

use std::sync::Arc;

use crate::{
  Error, Result,
  catalog::TagCatalog,
  creator::{Creator, NewCreator},
  deadline::Deadline,
  id::{AccountId, CreatorId, TagId},
  store::{AssignOutcome, TagStore},
  tag::{Assignment, ProposedTag},
  upstream::{ChannelDirectory, LookupError, normalize_handle},
};

pub struct CreatorTagAssigner<S> {
  store:    Arc<S>,
  catalog:  TagCatalog<S>,
  deadline: Deadline,
}

impl<S: TagStore> CreatorTagAssigner<S> {
  pub fn new(store: Arc<S>, deadline: Deadline) -> Self {
    Self {
      catalog: TagCatalog::new(store.clone(), deadline),
      store,
      deadline,
    }
  }

  // ── Creators ────────────────────────────────────────────────────────────

  /// Insert a creator as given. Duplicate channel references are allowed.
  pub async fn create_creator(&self, input: NewCreator) -> Result<Creator> {
    if input.external_channel_ref.trim().is_empty() {
      return Err(Error::Validation("channel reference must not be empty".into()));
    }
    let creator = self
      .deadline
      .run("create_creator", self.store.create_creator(input))
      .await?;
    tracing::info!(
      creator_id = %creator.creator_id,
      channel = %creator.external_channel_ref,
      "creator created"
    );
    Ok(creator)
  }

  /// Look `handle` up in the channel directory and create a creator from the
  /// metadata it reports.
  pub async fn create_creator_from_directory<D>(
    &self,
    directory: &D,
    handle: &str,
  ) -> Result<Creator>
  where
    D: ChannelDirectory,
  {
    let handle = normalize_handle(handle);
    if handle.is_empty() {
      return Err(Error::Validation("channel handle must not be empty".into()));
    }
    let meta = directory.lookup(handle).await.map_err(|e| match e {
      LookupError::NotFound(h) => Error::ChannelNotFound(h),
      other => {
        tracing::error!(handle, error = %other, "channel directory lookup failed");
        Error::Upstream("channel directory request failed".into())
      }
    })?;

    self
      .create_creator(NewCreator {
        external_channel_ref: meta.channel_ref,
        handle:               Some(format!("@{handle}")),
        display_name:         meta.display_name,
        description:          meta.description,
      })
      .await
  }

  // ── Assignments ─────────────────────────────────────────────────────────

  /// Link `tag_id` to `creator_id`. A second assignment for the same pair is
  /// a [`Error::Conflict`], never silently merged.
  pub async fn assign_tag(
    &self,
    creator_id: CreatorId,
    tag_id: TagId,
    proposer: AccountId,
  ) -> Result<Assignment> {
    let outcome = self
      .deadline
      .run(
        "assign_tag",
        self.store.insert_assignment(creator_id, tag_id, proposer),
      )
      .await?;

    match outcome {
      AssignOutcome::Created(assignment) => {
        tracing::info!(
          assignment_id = %assignment.assignment_id,
          %creator_id,
          %tag_id,
          proposer = %proposer,
          "tag assigned"
        );
        Ok(assignment)
      }
      AssignOutcome::Duplicate(_) => Err(Error::Conflict { creator_id, tag_id }),
      AssignOutcome::MissingCreator => Err(Error::CreatorNotFound(creator_id)),
      AssignOutcome::MissingTag => Err(Error::TagNotFound(tag_id)),
    }
  }

  /// Resolve `name` and assign the resulting tag to the creator.
  ///
  /// The tag is resolved in its own unit of work before the assignment is
  /// attempted. If the assignment then fails the tag is kept; the assignment
  /// itself is either fully created or absent.
  pub async fn propose_tag(
    &self,
    creator_id: CreatorId,
    name: &str,
    proposer: AccountId,
  ) -> Result<ProposedTag> {
    // Creators are never deleted, so checking first keeps unknown ids from
    // minting orphaned tags.
    self
      .deadline
      .run("get_creator", self.store.get_creator(creator_id))
      .await?
      .ok_or(Error::CreatorNotFound(creator_id))?;

    let tag = self.catalog.resolve_tag(name).await?;
    let assignment = self.assign_tag(creator_id, tag.tag_id, proposer).await?;
    Ok(ProposedTag { assignment, tag })
  }
}
