//! In-process [`TagStore`] used by the component tests.
//!
//! A single mutex stands in for the backend's transactions: each method takes
//! the lock once, so every call is atomic.

use std::{
  collections::BTreeMap,
  sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
  },
};

use chrono::Utc;

use crate::{
  account::Account,
  creator::{Creator, NewCreator},
  id::{AccountId, AssignmentId, CreatorId, TagId},
  store::{AssignOutcome, StoreFailure, TagStore},
  tag::{Assignment, Tag, TagListing, TagName, fold_case},
  vote::{Vote, VoteValue},
};

#[derive(Debug, thiserror::Error)]
#[error("memory store unavailable")]
pub struct Unavailable;

impl StoreFailure for Unavailable {
  fn is_unavailable(&self) -> bool { true }
}

#[derive(Default)]
struct State {
  accounts:    Vec<Account>,
  creators:    Vec<Creator>,
  tags:        Vec<Tag>,
  assignments: Vec<Assignment>,
  votes:       BTreeMap<(AccountId, AssignmentId), Vote>,
}

#[derive(Default)]
pub struct MemoryStore {
  state:       Mutex<State>,
  unavailable: AtomicBool,
  stalled:     AtomicBool,
}

impl MemoryStore {
  pub fn set_unavailable(&self, on: bool) {
    self.unavailable.store(on, Ordering::SeqCst);
  }

  /// Make every subsequent call hang forever.
  pub fn set_stalled(&self, on: bool) { self.stalled.store(on, Ordering::SeqCst); }

  pub fn account_count(&self) -> usize { self.lock().accounts.len() }

  pub fn tag_count(&self) -> usize { self.lock().tags.len() }

  pub fn assignment_count(&self) -> usize { self.lock().assignments.len() }

  pub fn vote_count(&self) -> usize { self.lock().votes.len() }

  fn lock(&self) -> std::sync::MutexGuard<'_, State> {
    self.state.lock().unwrap_or_else(|p| p.into_inner())
  }

  async fn gate(&self) -> Result<(), Unavailable> {
    if self.stalled.load(Ordering::SeqCst) {
      std::future::pending::<()>().await;
    }
    if self.unavailable.load(Ordering::SeqCst) {
      return Err(Unavailable);
    }
    Ok(())
  }
}

fn next_id(len: usize) -> i64 { len as i64 + 1 }

impl TagStore for MemoryStore {
  type Error = Unavailable;

  async fn ensure_account(&self, external_identity: &str) -> Result<Account, Unavailable> {
    self.gate().await?;
    let mut st = self.lock();
    if let Some(a) = st
      .accounts
      .iter()
      .find(|a| a.external_identity == external_identity)
    {
      return Ok(a.clone());
    }
    let account = Account {
      account_id:        AccountId(next_id(st.accounts.len())),
      external_identity: external_identity.to_owned(),
      created_at:        Utc::now(),
    };
    st.accounts.push(account.clone());
    Ok(account)
  }

  async fn create_creator(&self, input: NewCreator) -> Result<Creator, Unavailable> {
    self.gate().await?;
    let mut st = self.lock();
    let creator = Creator {
      creator_id:           CreatorId(next_id(st.creators.len())),
      external_channel_ref: input.external_channel_ref,
      handle:               input.handle,
      display_name:         input.display_name,
      description:          input.description,
      created_at:           Utc::now(),
    };
    st.creators.push(creator.clone());
    Ok(creator)
  }

  async fn get_creator(&self, id: CreatorId) -> Result<Option<Creator>, Unavailable> {
    self.gate().await?;
    Ok(self.lock().creators.iter().find(|c| c.creator_id == id).cloned())
  }

  async fn resolve_tag(&self, name: &TagName) -> Result<Tag, Unavailable> {
    self.gate().await?;
    let mut st = self.lock();
    if let Some(t) = st.tags.iter().find(|t| fold_case(&t.name) == name.key()) {
      return Ok(t.clone());
    }
    let tag = Tag {
      tag_id:     TagId(next_id(st.tags.len())),
      name:       name.display().to_owned(),
      created_at: Utc::now(),
    };
    st.tags.push(tag.clone());
    Ok(tag)
  }

  async fn insert_assignment(
    &self,
    creator_id: CreatorId,
    tag_id: TagId,
    proposer: AccountId,
  ) -> Result<AssignOutcome, Unavailable> {
    self.gate().await?;
    let mut st = self.lock();
    if !st.creators.iter().any(|c| c.creator_id == creator_id) {
      return Ok(AssignOutcome::MissingCreator);
    }
    if !st.tags.iter().any(|t| t.tag_id == tag_id) {
      return Ok(AssignOutcome::MissingTag);
    }
    if let Some(existing) = st
      .assignments
      .iter()
      .find(|a| a.creator_id == creator_id && a.tag_id == tag_id)
    {
      return Ok(AssignOutcome::Duplicate(existing.assignment_id));
    }
    let assignment = Assignment {
      assignment_id: AssignmentId(next_id(st.assignments.len())),
      creator_id,
      tag_id,
      proposer_account_id: proposer,
      created_at: Utc::now(),
    };
    st.assignments.push(assignment.clone());
    Ok(AssignOutcome::Created(assignment))
  }

  async fn upsert_vote(
    &self,
    account_id: AccountId,
    assignment_id: AssignmentId,
    value: VoteValue,
  ) -> Result<Option<Vote>, Unavailable> {
    self.gate().await?;
    let mut st = self.lock();
    if !st.assignments.iter().any(|a| a.assignment_id == assignment_id) {
      return Ok(None);
    }
    let vote = Vote {
      account_id,
      assignment_id,
      value,
      updated_at: Utc::now(),
    };
    st.votes.insert((account_id, assignment_id), vote.clone());
    Ok(Some(vote))
  }

  async fn delete_vote(
    &self,
    account_id: AccountId,
    assignment_id: AssignmentId,
  ) -> Result<bool, Unavailable> {
    self.gate().await?;
    Ok(self.lock().votes.remove(&(account_id, assignment_id)).is_some())
  }

  async fn score(&self, assignment_id: AssignmentId) -> Result<Option<i64>, Unavailable> {
    self.gate().await?;
    let st = self.lock();
    if !st.assignments.iter().any(|a| a.assignment_id == assignment_id) {
      return Ok(None);
    }
    Ok(Some(score_of(&st, assignment_id)))
  }

  async fn list_tags(&self, creator_id: CreatorId) -> Result<Vec<TagListing>, Unavailable> {
    self.gate().await?;
    let st = self.lock();
    Ok(
      st.assignments
        .iter()
        .filter(|a| a.creator_id == creator_id)
        .filter_map(|a| {
          let tag = st.tags.iter().find(|t| t.tag_id == a.tag_id)?;
          Some(TagListing {
            assignment_id:       a.assignment_id,
            tag_id:              a.tag_id,
            name:                tag.name.clone(),
            proposer_account_id: a.proposer_account_id,
            score:               score_of(&st, a.assignment_id),
            created_at:          a.created_at,
          })
        })
        .collect(),
    )
  }

  async fn search_creators(&self, fragment_key: &str) -> Result<Vec<Creator>, Unavailable> {
    self.gate().await?;
    let st = self.lock();
    Ok(
      st.creators
        .iter()
        .filter(|c| {
          st.assignments.iter().any(|a| {
            a.creator_id == c.creator_id
              && st.tags.iter().any(|t| {
                t.tag_id == a.tag_id && fold_case(&t.name).contains(fragment_key)
              })
          })
        })
        .cloned()
        .collect(),
    )
  }
}

fn score_of(st: &State, assignment_id: AssignmentId) -> i64 {
  st.votes
    .values()
    .filter(|v| v.assignment_id == assignment_id)
    .map(|v| v.value.as_i64())
    .sum()
}
