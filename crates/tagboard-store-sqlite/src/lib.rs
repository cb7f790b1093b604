//! SQLite backend for the Tagboard store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Several [`SqliteStore`]s (in one
//! process or many) may share a database file; every guarantee is enforced by
//! SQLite transactions and constraints.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
