//! Google OAuth 2.0 authorization-code flow over `reqwest`.
//!
//! The verified e-mail address from the userinfo endpoint is the external
//! identity handed to the account layer.

use std::time::Duration;

use anyhow::Context as _;
use reqwest::{Client, Url};
use serde::Deserialize;
use tagboard_core::upstream::{ExchangeError, IdentityExchange};

use crate::config::OAuthConfig;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const EMAIL_SCOPE: &str = "https://www.googleapis.com/auth/userinfo.email";

/// Where the provider lives. Overridable so tests can stand in for Google.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
  pub authorize: Url,
  pub token:     Url,
  pub userinfo:  Url,
}

impl GoogleEndpoints {
  pub fn google() -> anyhow::Result<Self> {
    Ok(Self {
      authorize: Url::parse(AUTHORIZE_URL).context("authorize endpoint")?,
      token:     Url::parse(TOKEN_URL).context("token endpoint")?,
      userinfo:  Url::parse(USERINFO_URL).context("userinfo endpoint")?,
    })
  }
}

pub struct GoogleIdentity {
  client:    Client,
  oauth:     OAuthConfig,
  endpoints: GoogleEndpoints,
}

#[derive(Deserialize)]
struct TokenResponse {
  access_token: String,
}

#[derive(Deserialize)]
struct UserInfo {
  email:          Option<String>,
  #[serde(default)]
  verified_email: bool,
}

impl GoogleIdentity {
  pub fn new(
    oauth: OAuthConfig,
    endpoints: GoogleEndpoints,
    timeout: Duration,
  ) -> anyhow::Result<Self> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self {
      client,
      oauth,
      endpoints,
    })
  }

  async fn access_token(&self, code: &str) -> Result<String, ExchangeError> {
    let resp = self
      .client
      .post(self.endpoints.token.clone())
      .form(&[
        ("code", code),
        ("client_id", self.oauth.client_id.as_str()),
        ("client_secret", self.oauth.client_secret.as_str()),
        ("redirect_uri", self.oauth.redirect_url.as_str()),
        ("grant_type", "authorization_code"),
      ])
      .send()
      .await
      .map_err(|e| ExchangeError::Token(e.to_string()))?;

    if !resp.status().is_success() {
      return Err(ExchangeError::Token(format!("token endpoint → {}", resp.status())));
    }
    let token: TokenResponse = resp
      .json()
      .await
      .map_err(|e| ExchangeError::Token(e.to_string()))?;
    Ok(token.access_token)
  }

  async fn email(&self, access_token: &str) -> Result<String, ExchangeError> {
    let resp = self
      .client
      .get(self.endpoints.userinfo.clone())
      .bearer_auth(access_token)
      .send()
      .await
      .map_err(|e| ExchangeError::UserInfo(e.to_string()))?;

    if !resp.status().is_success() {
      return Err(ExchangeError::UserInfo(format!(
        "userinfo endpoint → {}",
        resp.status()
      )));
    }
    let info: UserInfo = resp
      .json()
      .await
      .map_err(|e| ExchangeError::UserInfo(e.to_string()))?;
    let email = info
      .email
      .filter(|e| !e.trim().is_empty())
      .ok_or_else(|| ExchangeError::UserInfo("userinfo carried no e-mail address".into()))?;
    if !info.verified_email {
      tracing::warn!("provider returned an unverified e-mail address");
      return Err(ExchangeError::UserInfo("e-mail not verified".into()));
    }
    Ok(email)
  }
}

impl IdentityExchange for GoogleIdentity {
  fn authorize_url(&self, state: &str) -> String {
    let mut url = self.endpoints.authorize.clone();
    url
      .query_pairs_mut()
      .append_pair("client_id", &self.oauth.client_id)
      .append_pair("redirect_uri", &self.oauth.redirect_url)
      .append_pair("response_type", "code")
      .append_pair("scope", EMAIL_SCOPE)
      .append_pair("access_type", "offline")
      .append_pair("state", state);
    url.into()
  }

  async fn exchange(&self, code: &str) -> Result<String, ExchangeError> {
    let access_token = self.access_token(code).await?;
    self.email(&access_token).await
  }
}
