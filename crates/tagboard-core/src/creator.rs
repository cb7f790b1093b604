//! The subject that tags are proposed for.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::CreatorId;

/// A content channel plus the display metadata the directory reported for it
/// when the creator was proposed. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
  pub creator_id:           CreatorId,
  /// The provider's stable channel identifier.
  pub external_channel_ref: String,
  /// The handle the creator was proposed by, e.g. `@somechannel`.
  pub handle:               Option<String>,
  pub display_name:         String,
  pub description:          String,
  pub created_at:           DateTime<Utc>,
}

/// Input to [`crate::store::TagStore::create_creator`].
///
/// No uniqueness is imposed on `external_channel_ref`; directory metadata is
/// trusted as given per call.
#[derive(Debug, Clone)]
pub struct NewCreator {
  pub external_channel_ref: String,
  pub handle:               Option<String>,
  pub display_name:         String,
  pub description:          String,
}

impl NewCreator {
  pub fn new(
    external_channel_ref: impl Into<String>,
    display_name: impl Into<String>,
    description: impl Into<String>,
  ) -> Self {
    Self {
      external_channel_ref: external_channel_ref.into(),
      handle:               None,
      display_name:         display_name.into(),
      description:          description.into(),
    }
  }
}
