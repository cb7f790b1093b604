//! IdentityProvisioner: external identity → account → session token.

use std::sync::Arc;

use crate::{
  Error, Result,
  deadline::Deadline,
  id::AccountId,
  session::{Session, SessionSigner},
  store::TagStore,
  upstream::IdentityExchange,
};

pub struct IdentityProvisioner<S> {
  store:    Arc<S>,
  sessions: SessionSigner,
  deadline: Deadline,
}

impl<S: TagStore> IdentityProvisioner<S> {
  pub fn new(store: Arc<S>, sessions: SessionSigner, deadline: Deadline) -> Self {
    Self {
      store,
      sessions,
      deadline,
    }
  }

  /// Map an external identity to its account id, creating the account on
  /// first sight. Safe to call concurrently and to retry.
  pub async fn ensure_account(&self, external_identity: &str) -> Result<AccountId> {
    let identity = external_identity.trim();
    if identity.is_empty() {
      return Err(Error::Validation("external identity must not be empty".into()));
    }
    let account = self
      .deadline
      .run("ensure_account", self.store.ensure_account(identity))
      .await?;
    tracing::debug!(account_id = %account.account_id, "account ensured");
    Ok(account.account_id)
  }

  pub fn issue_session(&self, account_id: AccountId) -> Result<Session> {
    self.sessions.issue(account_id)
  }

  pub fn validate_session(&self, token: &str) -> Result<AccountId> {
    self.sessions.validate(token)
  }

  /// Complete a login: exchange the authorization code for an identity,
  /// provision its account and issue a session.
  pub async fn login<X>(&self, exchange: &X, code: &str) -> Result<Session>
  where
    X: IdentityExchange,
  {
    let identity = exchange.exchange(code).await.map_err(|e| {
      tracing::error!(error = %e, "identity exchange failed");
      Error::Upstream("identity provider request failed".into())
    })?;
    let account_id = self.ensure_account(&identity).await?;
    tracing::info!(%account_id, "login completed");
    self.issue_session(account_id)
  }
}
