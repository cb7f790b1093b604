//! Identifier newtypes.
//!
//! Every entity is keyed by a store-assigned, monotonically increasing integer.
//! Wrapping each in its own type keeps a `creator_id` from being passed where a
//! `tag_id` is expected.

use std::{fmt, num::ParseIntError, str::FromStr};

use serde::{Deserialize, Serialize};

macro_rules! id_type {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(
      Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
      Deserialize,
    )]
    #[serde(transparent)]
    pub struct $name(pub i64);

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
      }
    }

    impl FromStr for $name {
      type Err = ParseIntError;

      fn from_str(s: &str) -> Result<Self, Self::Err> { s.parse().map(Self) }
    }
  };
}

id_type!(
  /// An internal account, one per distinct external identity.
  AccountId
);
id_type!(
  /// A tagged content creator.
  CreatorId
);
id_type!(
  /// A canonical, case-insensitively unique tag.
  TagId
);
id_type!(
  /// The link between one creator and one tag.
  AssignmentId
);
