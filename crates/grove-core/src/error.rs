//! Error types for `grove-core`.

use std::fmt;

use thiserror::Error;

/// The kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
  Node,
  DomainNode,
  Domain,
  User,
}

impl fmt::Display for Entity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Entity::Node => "node",
      Entity::DomainNode => "domain node",
      Entity::Domain => "domain",
      Entity::User => "user",
    })
  }
}

/// Why a reparent was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
  /// The node was asked to become its own parent.
  SelfParent,
  /// The target parent is a text node; only folders hold children.
  ParentNotFolder,
  /// The target parent lies inside the subtree being moved.
  Cycle,
}

impl fmt::Display for MoveRejection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      MoveRejection::SelfParent => "cannot move a node into itself",
      MoveRejection::ParentNotFolder => "target parent must be a folder",
      MoveRejection::Cycle => "cannot move a node into its own descendant",
    })
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0} {1} not found")]
  NotFound(Entity, i64),

  #[error("permission denied: {0}")]
  PermissionDenied(String),

  #[error("validation failed: {0}")]
  Validation(String),

  #[error("invalid move: {0}")]
  InvalidMove(MoveRejection),

  #[error("tree exceeds the maximum depth of {0}")]
  TreeTooDeep(usize),

  #[error("user {user_id} is already a member of domain {domain_id}")]
  AlreadyMember { domain_id: i64, user_id: i64 },

  #[error("username {0:?} is already taken")]
  UsernameTaken(String),

  #[error("operation cancelled")]
  Cancelled,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Exposes the domain-level cause of a backend error.
///
/// Backends wrap [`Error`] alongside their own storage failures. Callers that
/// need to tell "not found" apart from "database unavailable" go through this
/// trait instead of matching on backend-specific variants.
pub trait AsCoreError {
  /// The core error behind `self`, or `None` for storage faults.
  fn as_core(&self) -> Option<&Error>;
}

impl AsCoreError for Error {
  fn as_core(&self) -> Option<&Error> { Some(self) }
}
