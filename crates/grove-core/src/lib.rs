//! Core types, tree algorithms and trait definitions for Grove.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! publish/move algorithms in [`tree`] run against the [`tree::TreeTx`]
//! abstraction, which storage backends implement over a live transaction.

pub mod domain;
pub mod error;
pub mod node;
pub mod store;
pub mod tree;
pub mod user;

pub use error::{AsCoreError, Error, Result};
