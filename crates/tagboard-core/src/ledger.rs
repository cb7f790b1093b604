//! VoteLedger: one vote per (account, assignment), and the derived score.

use std::sync::Arc;

use crate::{
  Error, Result,
  deadline::Deadline,
  id::{AccountId, AssignmentId},
  store::TagStore,
  vote::{Vote, VoteValue},
};

pub struct VoteLedger<S> {
  store:    Arc<S>,
  deadline: Deadline,
}

impl<S: TagStore> VoteLedger<S> {
  pub fn new(store: Arc<S>, deadline: Deadline) -> Self { Self { store, deadline } }

  /// Record `value` (`1` or `-1`) as the account's vote on the assignment,
  /// replacing any earlier vote. Idempotent.
  pub async fn cast_vote(
    &self,
    account_id: AccountId,
    assignment_id: AssignmentId,
    value: i64,
  ) -> Result<Vote> {
    let value = VoteValue::try_from(value)?;
    let vote = self
      .deadline
      .run(
        "cast_vote",
        self.store.upsert_vote(account_id, assignment_id, value),
      )
      .await?
      .ok_or(Error::AssignmentNotFound(assignment_id))?;
    tracing::debug!(%account_id, %assignment_id, value = value.as_i64(), "vote cast");
    Ok(vote)
  }

  /// Remove the account's vote if there is one. Removing a vote that does not
  /// exist is not an error; the return value says whether anything changed.
  pub async fn remove_vote(
    &self,
    account_id: AccountId,
    assignment_id: AssignmentId,
  ) -> Result<bool> {
    let removed = self
      .deadline
      .run("remove_vote", self.store.delete_vote(account_id, assignment_id))
      .await?;
    tracing::debug!(%account_id, %assignment_id, removed, "vote removal");
    Ok(removed)
  }

  /// Sum of vote values for the assignment; zero when nobody has voted.
  pub async fn score(&self, assignment_id: AssignmentId) -> Result<i64> {
    self
      .deadline
      .run("score", self.store.score(assignment_id))
      .await?
      .ok_or(Error::AssignmentNotFound(assignment_id))
  }
}
