//! Handler for `GET /search`.
//!
//! `?tag=` is a case-insensitive fragment of a tag name; an exact name
//! matches too. Missing or blank is a 400.

use axum::{
  Json,
  extract::{Query, State, rejection::QueryRejection},
};
use serde::{Deserialize, Serialize};
use tagboard_core::{creator::Creator, store::TagStore, upstream::ChannelDirectory};

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  pub tag: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
  pub creators: Vec<Creator>,
}

/// `GET /search?tag=<fragment>`
pub async fn handler<S, C>(
  State(state): State<AppState<S, C>>,
  query: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResults>, ApiError>
where
  S: TagStore + 'static,
  C: ChannelDirectory + 'static,
{
  let Query(params) = query?;
  let fragment = params.tag.unwrap_or_default();
  let creators = state.query.search_creators_by_tag(&fragment).await?;
  Ok(Json(SearchResults { creators }))
}
