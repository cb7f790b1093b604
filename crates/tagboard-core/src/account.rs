//! The internal identity record behind an external identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::AccountId;

/// Created on the first successful login for an external identity and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
  pub account_id:        AccountId,
  /// Opaque identity issued by the identity provider (a verified email).
  pub external_identity: String,
  pub created_at:        DateTime<Utc>,
}
