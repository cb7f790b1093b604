//! Error types for `tagboard-core`.
//!
//! Domain errors (validation, not-found, conflict, unauthorized) are raised by
//! the component that detects them and travel to the boundary unchanged.
//! Upstream, timeout and internal failures are logged where they originate and
//! carry only a short description.

use std::time::Duration;

use thiserror::Error;

use crate::id::{AssignmentId, CreatorId, TagId};

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid input: {0}")]
  Validation(String),

  #[error("creator not found: {0}")]
  CreatorNotFound(CreatorId),

  #[error("tag not found: {0}")]
  TagNotFound(TagId),

  #[error("assignment not found: {0}")]
  AssignmentNotFound(AssignmentId),

  #[error("channel not found: {0}")]
  ChannelNotFound(String),

  #[error("tag {tag_id} is already assigned to creator {creator_id}")]
  Conflict {
    creator_id: CreatorId,
    tag_id:     TagId,
  },

  #[error("unauthorized")]
  Unauthorized,

  #[error("upstream failure: {0}")]
  Upstream(String),

  #[error("{operation} exceeded its {deadline:?} deadline")]
  Timeout {
    operation: &'static str,
    deadline:  Duration,
  },

  #[error("internal error: {0}")]
  Internal(String),

  #[error("configuration error: {0}")]
  Configuration(String),
}

/// The coarse category of an [`Error`], used at the boundary to pick a status
/// and decide whether the message may be shown to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Validation,
  NotFound,
  Conflict,
  Unauthorized,
  Upstream,
  Timeout,
  Internal,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_) => ErrorKind::Validation,
      Self::CreatorNotFound(_)
      | Self::TagNotFound(_)
      | Self::AssignmentNotFound(_)
      | Self::ChannelNotFound(_) => ErrorKind::NotFound,
      Self::Conflict { .. } => ErrorKind::Conflict,
      Self::Unauthorized => ErrorKind::Unauthorized,
      Self::Upstream(_) => ErrorKind::Upstream,
      Self::Timeout { .. } => ErrorKind::Timeout,
      Self::Internal(_) | Self::Configuration(_) => ErrorKind::Internal,
    }
  }

  /// Whether the error describes the caller's request rather than a failure
  /// of this service or its dependencies.
  pub fn is_domain(&self) -> bool {
    matches!(
      self.kind(),
      ErrorKind::Validation
        | ErrorKind::NotFound
        | ErrorKind::Conflict
        | ErrorKind::Unauthorized
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
