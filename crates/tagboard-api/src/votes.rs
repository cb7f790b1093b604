//! Handlers for votes and scores.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/votes` | Bearer. Body: `{"creator_tag_id":1,"vote_type":1}`; `vote_type` is `1` or `-1` |
//! | `DELETE` | `/votes/{creator_tag_id}` | Bearer. `{"removed":bool}`; removing nothing is fine |
//! | `GET`    | `/assignments/{id}/score` | 404 for an unknown assignment |

use axum::{
  Json,
  extract::{
    Path, State,
    rejection::{JsonRejection, PathRejection},
  },
};
use serde::{Deserialize, Serialize};
use tagboard_core::{
  id::AssignmentId,
  store::TagStore,
  upstream::ChannelDirectory,
  vote::Vote,
};

use crate::{AppState, auth::Authenticated, error::ApiError};

// ─── Cast ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CastBody {
  pub creator_tag_id: AssignmentId,
  /// Kept as a plain integer so out-of-range values reach validation.
  pub vote_type:      i64,
}

/// `POST /votes`
pub async fn cast<S, C>(
  State(state): State<AppState<S, C>>,
  Authenticated(account_id): Authenticated,
  body: Result<Json<CastBody>, JsonRejection>,
) -> Result<Json<Vote>, ApiError>
where
  S: TagStore + 'static,
  C: ChannelDirectory + 'static,
{
  let Json(body) = body?;
  let vote = state
    .ledger
    .cast_vote(account_id, body.creator_tag_id, body.vote_type)
    .await?;
  Ok(Json(vote))
}

// ─── Remove ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Removed {
  pub removed: bool,
}

/// `DELETE /votes/{creator_tag_id}`
pub async fn remove<S, C>(
  State(state): State<AppState<S, C>>,
  Authenticated(account_id): Authenticated,
  path: Result<Path<AssignmentId>, PathRejection>,
) -> Result<Json<Removed>, ApiError>
where
  S: TagStore + 'static,
  C: ChannelDirectory + 'static,
{
  let Path(creator_tag_id) = path?;
  let removed = state.ledger.remove_vote(account_id, creator_tag_id).await?;
  Ok(Json(Removed { removed }))
}

// ─── Score ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Score {
  pub assignment_id: AssignmentId,
  pub score:         i64,
}

/// `GET /assignments/{id}/score`
pub async fn score<S, C>(
  State(state): State<AppState<S, C>>,
  path: Result<Path<AssignmentId>, PathRejection>,
) -> Result<Json<Score>, ApiError>
where
  S: TagStore + 'static,
  C: ChannelDirectory + 'static,
{
  let Path(assignment_id) = path?;
  let score = state.ledger.score(assignment_id).await?;
  Ok(Json(Score {
    assignment_id,
    score,
  }))
}
