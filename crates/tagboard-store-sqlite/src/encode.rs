//! Encoding and decoding helpers between domain types and the plain values
//! stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings. Ids are stored as the integer
//! row keys SQLite assigns.

use chrono::{DateTime, Utc};
use tagboard_core::{
  account::Account,
  creator::Creator,
  id::{AccountId, AssignmentId, CreatorId, TagId},
  store::AssignOutcome,
  tag::{Assignment, Tag, TagListing},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Constraint errors ───────────────────────────────────────────────────────

/// Whether `e` is a UNIQUE or PRIMARY KEY violation, i.e. a lost race
/// against another writer of the same key.
pub fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.code == rusqlite::ErrorCode::ConstraintViolation
        && matches!(
          f.extended_code,
          rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        )
  )
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from an `accounts` row.
pub struct RawAccount {
  pub account_id:        i64,
  pub external_identity: String,
  pub created_at:        String,
}

impl RawAccount {
  pub const COLUMNS: &'static str = "account_id, external_identity, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      account_id:        row.get(0)?,
      external_identity: row.get(1)?,
      created_at:        row.get(2)?,
    })
  }

  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      account_id:        AccountId(self.account_id),
      external_identity: self.external_identity,
      created_at:        decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `creators` row.
pub struct RawCreator {
  pub creator_id:           i64,
  pub external_channel_ref: String,
  pub handle:               Option<String>,
  pub display_name:         String,
  pub description:          String,
  pub created_at:           String,
}

impl RawCreator {
  pub const COLUMNS: &'static str = "c.creator_id, c.external_channel_ref, c.handle, \
                                     c.display_name, c.description, c.created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      creator_id:           row.get(0)?,
      external_channel_ref: row.get(1)?,
      handle:               row.get(2)?,
      display_name:         row.get(3)?,
      description:          row.get(4)?,
      created_at:           row.get(5)?,
    })
  }

  pub fn into_creator(self) -> Result<Creator> {
    Ok(Creator {
      creator_id:           CreatorId(self.creator_id),
      external_channel_ref: self.external_channel_ref,
      handle:               self.handle,
      display_name:         self.display_name,
      description:          self.description,
      created_at:           decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `tags` row.
pub struct RawTag {
  pub tag_id:     i64,
  pub name:       String,
  pub created_at: String,
}

impl RawTag {
  pub const COLUMNS: &'static str = "tag_id, name, created_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      tag_id:     row.get(0)?,
      name:       row.get(1)?,
      created_at: row.get(2)?,
    })
  }

  pub fn into_tag(self) -> Result<Tag> {
    Ok(Tag {
      tag_id:     TagId(self.tag_id),
      name:       self.name,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from an `assignments` row.
pub struct RawAssignment {
  pub assignment_id:       i64,
  pub creator_id:          i64,
  pub tag_id:              i64,
  pub proposer_account_id: i64,
  pub created_at:          String,
}

impl RawAssignment {
  pub fn into_assignment(self) -> Result<Assignment> {
    Ok(Assignment {
      assignment_id:       AssignmentId(self.assignment_id),
      creator_id:          CreatorId(self.creator_id),
      tag_id:              TagId(self.tag_id),
      proposer_account_id: AccountId(self.proposer_account_id),
      created_at:          decode_dt(&self.created_at)?,
    })
  }
}

/// Raw outcome of the assignment transaction.
pub enum RawAssignOutcome {
  Created(RawAssignment),
  Duplicate(i64),
  MissingCreator,
  MissingTag,
}

impl RawAssignOutcome {
  pub fn into_outcome(self) -> Result<AssignOutcome> {
    Ok(match self {
      Self::Created(raw) => AssignOutcome::Created(raw.into_assignment()?),
      Self::Duplicate(id) => AssignOutcome::Duplicate(AssignmentId(id)),
      Self::MissingCreator => AssignOutcome::MissingCreator,
      Self::MissingTag => AssignOutcome::MissingTag,
    })
  }
}

/// Raw values of one `list_tags` result row.
pub struct RawTagListing {
  pub assignment_id:       i64,
  pub tag_id:              i64,
  pub name:                String,
  pub proposer_account_id: i64,
  pub score:               i64,
  pub created_at:          String,
}

impl RawTagListing {
  pub fn into_listing(self) -> Result<TagListing> {
    Ok(TagListing {
      assignment_id:       AssignmentId(self.assignment_id),
      tag_id:              TagId(self.tag_id),
      name:                self.name,
      proposer_account_id: AccountId(self.proposer_account_id),
      score:               self.score,
      created_at:          decode_dt(&self.created_at)?,
    })
  }
}
