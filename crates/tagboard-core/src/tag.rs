//! Tags and the assignments that link them to creators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  id::{AccountId, AssignmentId, CreatorId, TagId},
};

/// Longest accepted tag name, counted in characters after trimming.
pub const MAX_TAG_NAME_CHARS: usize = 64;

// ─── Tag names ───────────────────────────────────────────────────────────────

/// A validated tag name together with its case-insensitive key.
///
/// Two names are the same tag exactly when their keys are equal. The display
/// form keeps whatever casing the caller used; the store only persists it for
/// the first writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagName {
  display: String,
  key:     String,
}

impl TagName {
  pub fn parse(raw: &str) -> Result<Self> {
    let display = raw.trim();
    if display.is_empty() {
      return Err(Error::Validation("tag name must not be empty".into()));
    }
    if display.chars().count() > MAX_TAG_NAME_CHARS {
      return Err(Error::Validation(format!(
        "tag name must be at most {MAX_TAG_NAME_CHARS} characters"
      )));
    }
    Ok(Self {
      display: display.to_owned(),
      key:     fold_case(display),
    })
  }

  pub fn display(&self) -> &str { &self.display }

  pub fn key(&self) -> &str { &self.key }
}

/// The comparison form used for tag names and search fragments.
pub fn fold_case(s: &str) -> String { s.to_lowercase() }

// ─── Entities ────────────────────────────────────────────────────────────────

/// A canonical label. No two tags have names equal under case folding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
  pub tag_id:     TagId,
  pub name:       String,
  pub created_at: DateTime<Utc>,
}

/// Records that `tag_id` was proposed for `creator_id` by
/// `proposer_account_id`. At most one exists per (creator, tag) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
  pub assignment_id:       AssignmentId,
  pub creator_id:          CreatorId,
  pub tag_id:              TagId,
  pub proposer_account_id: AccountId,
  pub created_at:          DateTime<Utc>,
}

// ─── Projections ─────────────────────────────────────────────────────────────

/// One entry of a creator's tag list, with the assignment's current score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagListing {
  pub assignment_id:       AssignmentId,
  pub tag_id:              TagId,
  pub name:                String,
  pub proposer_account_id: AccountId,
  pub score:               i64,
  pub created_at:          DateTime<Utc>,
}

/// The result of proposing a tag by name for a creator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposedTag {
  pub assignment: Assignment,
  pub tag:        Tag,
}
