//! The `TagStore` trait and supporting outcome types.
//!
//! The trait is implemented by storage backends (e.g. `tagboard-store-sqlite`).
//! Components in this crate are constructed with an `Arc` of some `TagStore`
//! and never see a concrete backend.
//!
//! Every method is one atomic unit of work: either all of its effects commit
//! or none do. Dropping a method's future before it resolves must leave the
//! store untouched. Correctness under concurrency rests entirely on the backend's
//! transactions and uniqueness constraints, so it holds across independent
//! processes sharing one database, not only across tasks in one process.

use std::future::Future;

use crate::{
  account::Account,
  creator::{Creator, NewCreator},
  id::{AccountId, AssignmentId, CreatorId, TagId},
  tag::{Assignment, Tag, TagListing, TagName},
  vote::{Vote, VoteValue},
};

// ─── Failure classification ──────────────────────────────────────────────────

/// A backend error that can say whether the store itself was unreachable.
///
/// Unreachable stores surface to callers as upstream failures; anything else
/// is an internal error.
pub trait StoreFailure: std::error::Error + Send + Sync + 'static {
  fn is_unavailable(&self) -> bool;
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// Result of [`TagStore::insert_assignment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignOutcome {
  Created(Assignment),
  /// An assignment for the pair already exists; nothing was written.
  Duplicate(AssignmentId),
  MissingCreator,
  MissingTag,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the transactional store behind every component.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait TagStore: Send + Sync {
  type Error: StoreFailure;

  // ── Accounts ──────────────────────────────────────────────────────────

  /// Find the account for `external_identity`, creating it if absent.
  ///
  /// Concurrent calls with the same identity converge on one row: a caller
  /// that loses the insert race re-reads and returns the winner.
  fn ensure_account<'a>(
    &'a self,
    external_identity: &'a str,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + 'a;

  // ── Creators ──────────────────────────────────────────────────────────

  fn create_creator(
    &self,
    input: NewCreator,
  ) -> impl Future<Output = Result<Creator, Self::Error>> + Send + '_;

  fn get_creator(
    &self,
    id: CreatorId,
  ) -> impl Future<Output = Result<Option<Creator>, Self::Error>> + Send + '_;

  // ── Tags ──────────────────────────────────────────────────────────────

  /// Case-insensitive find-or-create keyed on [`TagName::key`]. The first
  /// writer's display form is the one persisted.
  fn resolve_tag<'a>(
    &'a self,
    name: &'a TagName,
  ) -> impl Future<Output = Result<Tag, Self::Error>> + Send + 'a;

  // ── Assignments ───────────────────────────────────────────────────────

  /// Insert the (creator, tag) link. Never overwrites an existing one.
  fn insert_assignment(
    &self,
    creator_id: CreatorId,
    tag_id: TagId,
    proposer: AccountId,
  ) -> impl Future<Output = Result<AssignOutcome, Self::Error>> + Send + '_;

  // ── Votes ─────────────────────────────────────────────────────────────

  /// Insert or overwrite the vote for (account, assignment). Returns `None`
  /// if the assignment does not exist.
  fn upsert_vote(
    &self,
    account_id: AccountId,
    assignment_id: AssignmentId,
    value: VoteValue,
  ) -> impl Future<Output = Result<Option<Vote>, Self::Error>> + Send + '_;

  /// Delete the vote for (account, assignment). Returns whether a row was
  /// removed.
  fn delete_vote(
    &self,
    account_id: AccountId,
    assignment_id: AssignmentId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Sum of vote values for the assignment, or `None` if it does not exist.
  fn score(
    &self,
    assignment_id: AssignmentId,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Tags assigned to a creator, oldest assignment first, each with its
  /// current score.
  fn list_tags(
    &self,
    creator_id: CreatorId,
  ) -> impl Future<Output = Result<Vec<TagListing>, Self::Error>> + Send + '_;

  /// Distinct creators carrying a tag whose folded name contains
  /// `fragment_key`, ordered by creator id.
  fn search_creators<'a>(
    &'a self,
    fragment_key: &'a str,
  ) -> impl Future<Output = Result<Vec<Creator>, Self::Error>> + Send + 'a;
}
