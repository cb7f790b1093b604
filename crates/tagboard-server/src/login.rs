//! `/auth/*` routes: the browser side of the login flow.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/auth/google` | 307 to the provider; sets the state cookie |
//! | `GET`  | `/auth/google/callback` | `?code&state`; state must equal the cookie; returns a session |
//! | `POST` | `/auth/logout` | Acknowledgement only; sessions are stateless |

use std::sync::Arc;

use axum::{
  Json, Router,
  extract::{Query, State, rejection::QueryRejection},
  http::{HeaderMap, header},
  response::{IntoResponse, Redirect},
  routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tagboard_api::ApiError;
use tagboard_core::{
  Error,
  identity::IdentityProvisioner,
  store::TagStore,
  upstream::IdentityExchange,
};
use uuid::Uuid;

/// Cookie binding a callback to the browser that started the login.
pub const STATE_COOKIE: &str = "tagboard_oauth_state";

const STATE_COOKIE_ATTRS: &str = "HttpOnly; SameSite=Lax; Path=/auth";

pub struct LoginState<S, X> {
  identity: Arc<IdentityProvisioner<S>>,
  exchange: Arc<X>,
}

impl<S, X> Clone for LoginState<S, X> {
  fn clone(&self) -> Self {
    Self {
      identity: self.identity.clone(),
      exchange: self.exchange.clone(),
    }
  }
}

pub fn login_router<S, X>(
  identity: Arc<IdentityProvisioner<S>>,
  exchange: Arc<X>,
) -> Router<()>
where
  S: TagStore + 'static,
  X: IdentityExchange + 'static,
{
  Router::new()
    .route("/auth/google", get(start::<S, X>))
    .route("/auth/google/callback", get(callback::<S, X>))
    .route("/auth/logout", post(logout))
    .with_state(LoginState { identity, exchange })
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

/// `GET /auth/google`
async fn start<S, X>(State(state): State<LoginState<S, X>>) -> impl IntoResponse
where
  S: TagStore + 'static,
  X: IdentityExchange + 'static,
{
  let nonce = Uuid::new_v4().simple().to_string();
  let cookie = format!("{STATE_COOKIE}={nonce}; {STATE_COOKIE_ATTRS}; Max-Age=600");
  (
    [(header::SET_COOKIE, cookie)],
    Redirect::temporary(&state.exchange.authorize_url(&nonce)),
  )
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
  code:  Option<String>,
  state: Option<String>,
  error: Option<String>,
}

/// `GET /auth/google/callback?code=...&state=...`
async fn callback<S, X>(
  State(state): State<LoginState<S, X>>,
  headers: HeaderMap,
  query: Result<Query<CallbackParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TagStore + 'static,
  X: IdentityExchange + 'static,
{
  let Query(params) = query?;
  if let Some(error) = params.error {
    tracing::warn!(%error, "provider declined the login");
    return Err(ApiError(Error::Unauthorized));
  }

  let Some(expected) = state_cookie(&headers) else {
    return Err(ApiError(Error::Validation("missing login state cookie".into())));
  };
  if params.state.as_deref() != Some(expected) {
    tracing::warn!("login state does not match its cookie");
    return Err(ApiError(Error::Validation("login state mismatch".into())));
  }
  let code = params
    .code
    .filter(|c| !c.is_empty())
    .ok_or_else(|| Error::Validation("missing authorization code".into()))?;

  let session = state.identity.login(state.exchange.as_ref(), &code).await?;

  let cleared = format!("{STATE_COOKIE}=; {STATE_COOKIE_ATTRS}; Max-Age=0");
  Ok(([(header::SET_COOKIE, cleared)], Json(session)))
}

/// `POST /auth/logout`
async fn logout() -> impl IntoResponse {
  Json(json!({ "message": "logged out; discard the session token" }))
}

/// The value of the state cookie, if the request carries one.
fn state_cookie(headers: &HeaderMap) -> Option<&str> {
  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .find_map(|pair| {
      let (name, value) = pair.trim().split_once('=')?;
      (name == STATE_COOKIE).then_some(value)
    })
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use serde_json::Value;
  use tagboard_core::{
    deadline::Deadline,
    session::{DEFAULT_LIFETIME, SessionSigner},
    upstream::ExchangeError,
  };
  use tagboard_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  use super::*;

  struct FakeProvider;

  impl IdentityExchange for FakeProvider {
    fn authorize_url(&self, state: &str) -> String {
      format!("https://idp.example/authorize?state={state}")
    }

    async fn exchange(&self, code: &str) -> Result<String, ExchangeError> {
      match code {
        "good" => Ok("alice@example.com".into()),
        _ => Err(ExchangeError::Token("invalid_grant".into())),
      }
    }
  }

  async fn setup() -> (Router, Arc<IdentityProvisioner<SqliteStore>>) {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let sessions =
      SessionSigner::new("0123456789abcdef0123456789abcdef", DEFAULT_LIFETIME).unwrap();
    let identity = Arc::new(IdentityProvisioner::new(store, sessions, Deadline::default()));
    (login_router(identity.clone(), Arc::new(FakeProvider)), identity)
  }

  async fn get(router: Router, uri: &str, cookie: Option<&str>) -> axum::response::Response {
    let mut req = Request::builder().uri(uri);
    if let Some(c) = cookie {
      req = req.header(header::COOKIE, c);
    }
    router.oneshot(req.body(Body::empty()).unwrap()).await.unwrap()
  }

  async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  #[tokio::test]
  async fn start_redirects_and_sets_state_cookie() {
    let (router, _) = setup().await;
    let resp = get(router, "/auth/google", None).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);

    let location = resp.headers()[header::LOCATION].to_str().unwrap();
    let cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
    let nonce = location.rsplit_once("state=").unwrap().1;

    assert!(cookie.starts_with(&format!("{STATE_COOKIE}={nonce};")));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=600"));
  }

  #[tokio::test]
  async fn callback_issues_a_session() {
    let (router, identity) = setup().await;
    let resp = get(
      router,
      "/auth/google/callback?code=good&state=n1",
      Some(&format!("other=1; {STATE_COOKIE}=n1")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
      resp.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .contains("Max-Age=0")
    );

    let body = json_body(resp).await;
    let token = body["token"].as_str().unwrap();
    let account_id = identity.validate_session(token).unwrap();
    assert_eq!(body["account_id"], account_id.0);
    assert!(body["expires_at"].is_string());

    assert_eq!(identity.ensure_account("alice@example.com").await.unwrap(), account_id);
  }

  #[tokio::test]
  async fn callback_rejects_mismatched_or_missing_state() {
    let (router, _) = setup().await;
    let cookie = format!("{STATE_COOKIE}=n1");

    let resp = get(
      router.clone(),
      "/auth/google/callback?code=good&state=n2",
      Some(&cookie),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = get(router.clone(), "/auth/google/callback?code=good&state=n1", None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = get(
      router,
      "/auth/google/callback?code=a&code=b&state=n1",
      Some(&cookie),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(resp).await["error"].is_string());
  }

  #[tokio::test]
  async fn failed_exchange_is_502() {
    let (router, _) = setup().await;
    let resp = get(
      router,
      "/auth/google/callback?code=stale&state=n1",
      Some(&format!("{STATE_COOKIE}=n1")),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
  }

  #[tokio::test]
  async fn logout_acknowledges() {
    let (router, _) = setup().await;
    let resp = router
      .oneshot(
        Request::builder()
          .method("POST")
          .uri("/auth/logout")
          .body(Body::empty())
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(json_body(resp).await["message"].is_string());
  }
}
