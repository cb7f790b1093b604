//! Core types, the store trait and the components of the Tagboard service.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! components here hold an injected [`store::TagStore`] and rely on its
//! transactions and uniqueness constraints for every concurrency guarantee;
//! nothing is cached or locked in-process.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod assigner;
pub mod catalog;
pub mod creator;
pub mod deadline;
pub mod error;
pub mod id;
pub mod identity;
pub mod ledger;
pub mod query;
pub mod session;
pub mod store;
pub mod tag;
pub mod upstream;
pub mod vote;

#[cfg(test)]
mod memory;

pub use error::{Error, ErrorKind, Result};
