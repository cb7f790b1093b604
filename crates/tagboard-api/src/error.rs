//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use tagboard_core::{Error, ErrorKind};
use thiserror::Error;

/// An error returned by an API handler: a core error on its way to the
/// client.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub Error);

macro_rules! rejection_is_validation {
  ($($rejection:ty),+) => {
    $(
      impl From<$rejection> for ApiError {
        fn from(rejection: $rejection) -> Self {
          Self(Error::Validation(rejection.body_text()))
        }
      }
    )+
  };
}

rejection_is_validation!(JsonRejection, PathRejection, QueryRejection);

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self.0.kind() {
      ErrorKind::Validation => StatusCode::BAD_REQUEST,
      ErrorKind::NotFound => StatusCode::NOT_FOUND,
      ErrorKind::Conflict => StatusCode::CONFLICT,
      ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
      ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
      ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
      ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  /// The message shown to the caller. Failures of the service itself are
  /// reduced to a fixed phrase; the detail was logged where they arose.
  fn public_message(&self) -> String {
    if self.0.is_domain() {
      return self.0.to_string();
    }
    match self.0.kind() {
      ErrorKind::Upstream => "upstream service unavailable",
      ErrorKind::Timeout => "request timed out",
      _ => "internal server error",
    }
    .to_owned()
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = Json(json!({ "error": self.public_message() }));
    if status == StatusCode::UNAUTHORIZED {
      return (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response();
    }
    (status, body).into_response()
  }
}
