//! Contracts for the external collaborators: the identity provider and the
//! channel-metadata directory.
//!
//! Concrete HTTP clients live in `tagboard-server`. Neither collaborator is
//! ever retried by this crate.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─── Identity exchange ───────────────────────────────────────────────────────

/// Which step of the authorization-code exchange failed.
#[derive(Debug, Error)]
pub enum ExchangeError {
  /// Authorization code → provider access token.
  #[error("token exchange failed: {0}")]
  Token(String),
  /// Provider access token → verified identity.
  #[error("userinfo lookup failed: {0}")]
  UserInfo(String),
}

/// Turns an authorization code into a verified external identity string.
pub trait IdentityExchange: Send + Sync {
  /// Where to send the user to start a login carrying `state`.
  fn authorize_url(&self, state: &str) -> String;

  fn exchange<'a>(
    &'a self,
    code: &'a str,
  ) -> impl Future<Output = Result<String, ExchangeError>> + Send + 'a;
}

// ─── Channel directory ───────────────────────────────────────────────────────

/// Display metadata the directory reports for a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMetadata {
  pub channel_ref:  String,
  pub display_name: String,
  pub description:  String,
}

/// Failure of a directory lookup, named by the step that failed.
#[derive(Debug, Error)]
pub enum LookupError {
  /// The handle search returned no channel.
  #[error("no channel found for handle {0}")]
  NotFound(String),
  /// The channel was found but its details could not be fetched.
  #[error("details fetch failed for channel {channel_ref}: {reason}")]
  DetailsFetch {
    channel_ref: String,
    reason:      String,
  },
  #[error("directory request failed: {0}")]
  Transport(String),
}

/// Resolves a user-facing channel handle to channel metadata.
///
/// Implementations may need several upstream calls; callers only see the
/// handle-in, metadata-out contract.
pub trait ChannelDirectory: Send + Sync {
  fn lookup<'a>(
    &'a self,
    handle: &'a str,
  ) -> impl Future<Output = Result<ChannelMetadata, LookupError>> + Send + 'a;
}

/// Strip surrounding whitespace and a single leading `@` from a handle.
pub fn normalize_handle(handle: &str) -> &str {
  let trimmed = handle.trim();
  trimmed.strip_prefix('@').unwrap_or(trimmed)
}
