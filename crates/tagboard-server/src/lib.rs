//! Tagboard HTTP server.
//!
//! Wires the SQLite store, the Tagboard components and the real upstream
//! collaborators (Google sign-in and the YouTube channel directory) into one
//! axum [`Router`].

pub mod config;
pub mod google;
pub mod login;
pub mod youtube;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use anyhow::Context as _;
use axum::Router;
use tagboard_api::{AppState, api_router};
use tagboard_core::session::SessionSigner;
use tagboard_store_sqlite::SqliteStore;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;

use google::{GoogleEndpoints, GoogleIdentity};
use login::login_router;
use youtube::YouTubeDirectory;

/// Build the full application router for a validated configuration.
pub async fn build_app(cfg: &ServerConfig) -> anyhow::Result<Router> {
  cfg.validate()?;

  let store_path = cfg.store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let sessions = SessionSigner::new(&cfg.session.secret, cfg.session_lifetime())?;
  let directory = YouTubeDirectory::new(cfg.youtube.api_key.clone(), cfg.request_timeout())?;
  let google = GoogleIdentity::new(
    cfg.oauth.clone(),
    GoogleEndpoints::google()?,
    cfg.request_timeout(),
  )?;

  let state = AppState::new(Arc::new(store), sessions, cfg.deadline(), Arc::new(directory));
  let login = login_router(state.identity.clone(), Arc::new(google));

  Ok(
    api_router(state)
      .merge(login)
      .layer(TraceLayer::new_for_http()),
  )
}
