//! SQLite backend for the Grove note store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every mutation runs inside one
//! `BEGIN IMMEDIATE` transaction, so concurrent writers are serialised and a
//! failed publish or move leaves no trace.

mod encode;
mod join_code;
mod queries;
mod schema;
mod store;
mod tx;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
