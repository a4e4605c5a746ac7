//! Node types shared by the personal and domain trees.
//!
//! Both trees are forests of parent-pointer rows. A row never holds a link to
//! its children; the storage layer is the single source of truth for the
//! hierarchy and every traversal re-reads it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, error::Entity};

pub type UserId = i64;
pub type DomainId = i64;
pub type NodeId = i64;

/// Longest title accepted, counted in characters.
pub const MAX_TITLE_LEN: usize = 255;

// ─── Kind ────────────────────────────────────────────────────────────────────

/// Whether a node is a container or a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
  Folder,
  Text,
}

impl NodeKind {
  pub fn is_folder(self) -> bool { matches!(self, Self::Folder) }
}

// ─── Scope ───────────────────────────────────────────────────────────────────

/// The owner partition a node lives in.
///
/// Personal nodes are scoped by their user, domain nodes by their domain.
/// Every lookup carries a scope; a row outside it is treated as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
  User(UserId),
  Domain(DomainId),
}

impl Scope {
  /// The raw owner key (user id or domain id).
  pub fn owner(self) -> i64 {
    match self {
      Scope::User(id) | Scope::Domain(id) => id,
    }
  }

  /// What a missing row in this scope is called in errors.
  pub fn entity(self) -> Entity {
    match self {
      Scope::User(_) => Entity::Node,
      Scope::Domain(_) => Entity::DomainNode,
    }
  }

  pub fn not_found(self, id: NodeId) -> Error { Error::NotFound(self.entity(), id) }
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// A node in a user's personal tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
  pub id:         NodeId,
  pub user_id:    UserId,
  pub parent_id:  Option<NodeId>,
  #[serde(rename = "node_type")]
  pub kind:       NodeKind,
  pub title:      String,
  pub content:    String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// A node in a domain's shared tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainNode {
  pub id:             NodeId,
  pub domain_id:      DomainId,
  pub parent_id:      Option<NodeId>,
  #[serde(rename = "node_type")]
  pub kind:           NodeKind,
  pub title:          String,
  pub content:        String,
  pub comments_count: i64,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Attributes for a node about to be created in either tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNode {
  pub parent_id: Option<NodeId>,
  #[serde(rename = "node_type")]
  pub kind:      NodeKind,
  pub title:     String,
  #[serde(default)]
  pub content:   String,
}

impl NewNode {
  pub fn folder(parent_id: Option<NodeId>, title: impl Into<String>) -> Self {
    Self {
      parent_id,
      kind: NodeKind::Folder,
      title: title.into(),
      content: String::new(),
    }
  }

  pub fn text(
    parent_id: Option<NodeId>,
    title: impl Into<String>,
    content: impl Into<String>,
  ) -> Self {
    Self {
      parent_id,
      kind: NodeKind::Text,
      title: title.into(),
      content: content.into(),
    }
  }

  /// Check the title and drop any content supplied for a folder.
  pub fn normalized(mut self) -> Result<Self> {
    validate_title(&self.title)?;
    if self.kind.is_folder() {
      self.content.clear();
    }
    Ok(self)
  }
}

/// A partial title/content update. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeUpdate {
  pub title:   Option<String>,
  pub content: Option<String>,
}

impl NodeUpdate {
  /// Validate the update against the kind of the node it targets.
  pub fn validate(&self, kind: NodeKind) -> Result<()> {
    if let Some(title) = &self.title {
      validate_title(title)?;
    }
    if self.content.is_some() && kind.is_folder() {
      return Err(Error::Validation("cannot set content for a folder".into()));
    }
    Ok(())
  }
}

pub fn validate_title(title: &str) -> Result<()> {
  if title.trim().is_empty() {
    return Err(Error::Validation("title cannot be empty".into()));
  }
  if title.chars().count() > MAX_TITLE_LEN {
    return Err(Error::Validation(format!(
      "title is longer than {MAX_TITLE_LEN} characters"
    )));
  }
  Ok(())
}
