//! Request-scoped deadlines around store calls.

use std::{future::Future, time::Duration};

use crate::{Error, Result, store::StoreFailure};

/// Upper bound on a single store round trip.
///
/// Every component call goes through [`Deadline::run`], so an unresponsive
/// store surfaces as [`Error::Timeout`] instead of holding the caller. Expiry
/// drops the store future, and a [`TagStore`](crate::store::TagStore) must
/// not commit a write whose future was dropped, so a timed-out operation has
/// no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
  limit: Duration,
}

impl Deadline {
  pub const DEFAULT: Duration = Duration::from_secs(3);

  pub fn new(limit: Duration) -> Self { Self { limit } }

  /// Await `fut`, converting backend errors and deadline expiry into
  /// [`Error`]s. Failures are logged here, where their detail is known.
  pub async fn run<T, E, F>(&self, operation: &'static str, fut: F) -> Result<T>
  where
    E: StoreFailure,
    F: Future<Output = Result<T, E>>,
  {
    match tokio::time::timeout(self.limit, fut).await {
      Ok(Ok(value)) => Ok(value),
      Ok(Err(e)) => Err(store_failure(operation, &e)),
      Err(_) => {
        tracing::error!(
          operation,
          deadline = ?self.limit,
          "store call exceeded deadline"
        );
        Err(Error::Timeout {
          operation,
          deadline: self.limit,
        })
      }
    }
  }
}

impl Default for Deadline {
  fn default() -> Self { Self::new(Self::DEFAULT) }
}

fn store_failure<E: StoreFailure>(operation: &'static str, e: &E) -> Error {
  if e.is_unavailable() {
    tracing::error!(operation, error = %e, "store unavailable");
    Error::Upstream(format!("store unavailable during {operation}"))
  } else {
    tracing::error!(operation, error = %e, "store failure");
    Error::Internal(format!("store failure during {operation}"))
  }
}
