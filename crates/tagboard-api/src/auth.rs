//! Bearer-token extractor.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use tagboard_core::{Error, id::AccountId, store::TagStore, upstream::ChannelDirectory};

use crate::{AppState, error::ApiError};

/// Present in a handler's arguments means the request carried a valid
/// session; holds the account it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub AccountId);

/// The token from an `Authorization: Bearer <token>` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let (scheme, token) = value.split_once(' ')?;
  let token = token.trim();
  (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl<S, C> FromRequestParts<AppState<S, C>> for Authenticated
where
  S: TagStore + 'static,
  C: ChannelDirectory + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, C>,
  ) -> Result<Self, Self::Rejection> {
    let Some(token) = bearer_token(&parts.headers) else {
      tracing::debug!(path = %parts.uri.path(), "request without bearer token");
      return Err(ApiError(Error::Unauthorized));
    };
    let account_id = state.identity.validate_session(token)?;
    Ok(Authenticated(account_id))
  }
}
