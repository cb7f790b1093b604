//! Stateless session tokens.
//!
//! A session is an HS256 JWT carrying the account id and an absolute expiry.
//! Nothing is stored server-side; logging out means the client discards the
//! token.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, id::AccountId};

/// Shortest signing secret accepted at construction.
pub const MIN_SECRET_BYTES: usize = 32;

/// Default token lifetime.
pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
  account_id: AccountId,
  iat:        i64,
  exp:        i64,
  jti:        String,
}

/// A freshly issued session credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub token:      String,
  pub account_id: AccountId,
  pub expires_at: DateTime<Utc>,
}

/// Issues and verifies session tokens with a configured secret.
#[derive(Clone)]
pub struct SessionSigner {
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  validation: Validation,
  lifetime:   TimeDelta,
}

impl SessionSigner {
  /// Build a signer, refusing secrets that are missing or too short to be
  /// safe for HMAC-SHA256.
  pub fn new(secret: &str, lifetime: Duration) -> Result<Self> {
    if secret.len() < MIN_SECRET_BYTES {
      return Err(Error::Configuration(format!(
        "session secret must be at least {MIN_SECRET_BYTES} bytes"
      )));
    }
    let lifetime = TimeDelta::from_std(lifetime)
      .ok()
      .filter(|l| *l > TimeDelta::zero())
      .ok_or_else(|| {
        Error::Configuration("session lifetime must be positive".into())
      })?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    Ok(Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
      validation,
      lifetime,
    })
  }

  /// Issue a token for `account_id` expiring after the configured lifetime.
  pub fn issue(&self, account_id: AccountId) -> Result<Session> {
    self.issue_expiring(account_id, Utc::now() + self.lifetime)
  }

  /// Issue a token with an explicit expiry.
  pub fn issue_expiring(
    &self,
    account_id: AccountId,
    expires_at: DateTime<Utc>,
  ) -> Result<Session> {
    let claims = Claims {
      account_id,
      iat: Utc::now().timestamp(),
      exp: expires_at.timestamp(),
      jti: Uuid::new_v4().to_string(),
    };
    let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
      .map_err(|e| {
        tracing::error!(error = %e, "failed to sign session token");
        Error::Internal("failed to sign session token".into())
      })?;
    Ok(Session {
      token,
      account_id,
      expires_at,
    })
  }

  /// Verify signature and expiry, returning the embedded account id.
  pub fn validate(&self, token: &str) -> Result<AccountId> {
    decode::<Claims>(token, &self.decoding, &self.validation)
      .map(|data| data.claims.account_id)
      .map_err(|e| {
        tracing::warn!(reason = %e, "rejected session token");
        Error::Unauthorized
      })
  }
}
