//! JSON REST API for Tagboard.
//!
//! Exposes an axum [`Router`] over the Tagboard components, backed by any
//! [`TagStore`] and any [`ChannelDirectory`]. Session issuance (the login
//! flow), TLS and transport concerns belong to the binary.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = tagboard_api::api_router(state).merge(auth_routes);
//! ```

pub mod auth;
pub mod creators;
pub mod error;
pub mod search;
pub mod votes;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use tagboard_core::{
  assigner::CreatorTagAssigner,
  deadline::Deadline,
  identity::IdentityProvisioner,
  ledger::VoteLedger,
  query::QueryService,
  session::SessionSigner,
  store::TagStore,
  upstream::ChannelDirectory,
};

pub use auth::Authenticated;
pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers. Every component holds the
/// same injected store.
pub struct AppState<S, C> {
  pub identity:  Arc<IdentityProvisioner<S>>,
  pub assigner:  Arc<CreatorTagAssigner<S>>,
  pub ledger:    Arc<VoteLedger<S>>,
  pub query:     Arc<QueryService<S>>,
  pub directory: Arc<C>,
}

impl<S, C> Clone for AppState<S, C> {
  fn clone(&self) -> Self {
    Self {
      identity:  self.identity.clone(),
      assigner:  self.assigner.clone(),
      ledger:    self.ledger.clone(),
      query:     self.query.clone(),
      directory: self.directory.clone(),
    }
  }
}

impl<S: TagStore, C> AppState<S, C> {
  pub fn new(
    store: Arc<S>,
    sessions: SessionSigner,
    deadline: Deadline,
    directory: Arc<C>,
  ) -> Self {
    Self {
      identity: Arc::new(IdentityProvisioner::new(store.clone(), sessions, deadline)),
      assigner: Arc::new(CreatorTagAssigner::new(store.clone(), deadline)),
      ledger: Arc::new(VoteLedger::new(store.clone(), deadline)),
      query: Arc::new(QueryService::new(store, deadline)),
      directory,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be merged into any parent router regardless
/// of its own state type.
pub fn api_router<S, C>(state: AppState<S, C>) -> Router<()>
where
  S: TagStore + 'static,
  C: ChannelDirectory + 'static,
{
  Router::new()
    // Creators
    .route("/creators", post(creators::create::<S, C>))
    .route("/creators/{id}", get(creators::get_one::<S, C>))
    .route(
      "/creators/{id}/tags",
      get(creators::list_tags::<S, C>).post(creators::propose_tag::<S, C>),
    )
    // Votes
    .route("/votes", post(votes::cast::<S, C>))
    .route("/votes/{creator_tag_id}", delete(votes::remove::<S, C>))
    .route("/assignments/{id}/score", get(votes::score::<S, C>))
    // Search
    .route("/search", get(search::handler::<S, C>))
    .with_state(state)
}
