//! Votes on assignments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error,
  id::{AccountId, AssignmentId},
};

/// One account's opinion of an assignment. Serialised as `1` or `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum VoteValue {
  Up,
  Down,
}

impl VoteValue {
  pub fn as_i64(self) -> i64 {
    match self {
      Self::Up => 1,
      Self::Down => -1,
    }
  }
}

impl TryFrom<i64> for VoteValue {
  type Error = Error;

  fn try_from(raw: i64) -> Result<Self, Self::Error> {
    match raw {
      1 => Ok(Self::Up),
      -1 => Ok(Self::Down),
      other => Err(Error::Validation(format!(
        "vote value must be 1 or -1, got {other}"
      ))),
    }
  }
}

impl From<VoteValue> for i64 {
  fn from(v: VoteValue) -> Self { v.as_i64() }
}

/// At most one exists per (account, assignment); re-casting overwrites
/// `value` in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
  pub account_id:    AccountId,
  pub assignment_id: AssignmentId,
  pub value:         VoteValue,
  pub updated_at:    DateTime<Utc>,
}
