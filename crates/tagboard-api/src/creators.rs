//! Handlers for `/creators` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/creators` | Bearer. Body: `{"youtube_handle":"@x"}`; 201 + creator |
//! | `GET`  | `/creators/{id}` | 404 if not found |
//! | `GET`  | `/creators/{id}/tags` | `{"tags":[...]}`, empty for unknown creators |
//! | `POST` | `/creators/{id}/tags` | Bearer. Body: `{"tag_name":"Gaming"}`; 201, 409 if already assigned |

use axum::{
  Json,
  extract::{
    Path, State,
    rejection::{JsonRejection, PathRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tagboard_core::{
  creator::Creator,
  id::CreatorId,
  store::TagStore,
  tag::TagListing,
  upstream::ChannelDirectory,
};

use crate::{AppState, auth::Authenticated, error::ApiError};

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub youtube_handle: String,
}

/// `POST /creators` with body `{"youtube_handle":"@somechannel"}`
pub async fn create<S, C>(
  State(state): State<AppState<S, C>>,
  Authenticated(account_id): Authenticated,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TagStore + 'static,
  C: ChannelDirectory + 'static,
{
  let Json(body) = body?;
  let creator = state
    .assigner
    .create_creator_from_directory(state.directory.as_ref(), &body.youtube_handle)
    .await?;
  tracing::debug!(%account_id, creator_id = %creator.creator_id, "creator proposed");
  Ok((StatusCode::CREATED, Json(creator)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /creators/{id}`
pub async fn get_one<S, C>(
  State(state): State<AppState<S, C>>,
  path: Result<Path<CreatorId>, PathRejection>,
) -> Result<Json<Creator>, ApiError>
where
  S: TagStore + 'static,
  C: ChannelDirectory + 'static,
{
  let Path(id) = path?;
  Ok(Json(state.query.get_creator(id).await?))
}

// ─── Tags ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TagList {
  pub tags: Vec<TagListing>,
}

/// `GET /creators/{id}/tags`
pub async fn list_tags<S, C>(
  State(state): State<AppState<S, C>>,
  path: Result<Path<CreatorId>, PathRejection>,
) -> Result<Json<TagList>, ApiError>
where
  S: TagStore + 'static,
  C: ChannelDirectory + 'static,
{
  let Path(id) = path?;
  let tags = state.query.list_tags(id).await?;
  Ok(Json(TagList { tags }))
}

#[derive(Debug, Deserialize)]
pub struct ProposeBody {
  pub tag_name: String,
}

/// `POST /creators/{id}/tags` with body `{"tag_name":"Gaming"}`
pub async fn propose_tag<S, C>(
  State(state): State<AppState<S, C>>,
  Authenticated(account_id): Authenticated,
  path: Result<Path<CreatorId>, PathRejection>,
  body: Result<Json<ProposeBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TagStore + 'static,
  C: ChannelDirectory + 'static,
{
  let Path(id) = path?;
  let Json(body) = body?;
  let proposed = state
    .assigner
    .propose_tag(id, &body.tag_name, account_id)
    .await?;
  Ok((StatusCode::CREATED, Json(proposed)))
}
