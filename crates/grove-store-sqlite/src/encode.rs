//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings; enums as lowercase words.

use chrono::{DateTime, Utc};
use grove_core::{
  domain::{Comment, Domain, DomainMember, Role},
  node::{DomainNode, Node, NodeKind},
  tree::TreeNode,
  user::User,
};
use rusqlite::Row;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn now() -> String { encode_dt(Utc::now()) }

// ─── NodeKind ────────────────────────────────────────────────────────────────

pub fn encode_kind(k: NodeKind) -> &'static str {
  match k {
    NodeKind::Folder => "folder",
    NodeKind::Text => "text",
  }
}

pub fn decode_kind(s: &str) -> Result<NodeKind> {
  match s {
    "folder" => Ok(NodeKind::Folder),
    "text" => Ok(NodeKind::Text),
    other => Err(Error::Decode { column: "node_type", value: other.to_owned() }),
  }
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str {
  match r {
    Role::Owner => "owner",
    Role::Admin => "admin",
    Role::Member => "member",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "owner" => Ok(Role::Owner),
    "admin" => Ok(Role::Admin),
    "member" => Ok(Role::Member),
    other => Err(Error::Decode { column: "role", value: other.to_owned() }),
  }
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// Column list matching [`RawTreeNode::from_row`].
pub const TREE_COLUMNS: &str = "id, parent_id, node_type, title, content";

/// The structural columns shared by `nodes` and `domain_nodes`.
pub struct RawTreeNode {
  pub id:        i64,
  pub parent_id: Option<i64>,
  pub kind:      String,
  pub title:     String,
  pub content:   String,
}

impl RawTreeNode {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:        row.get(0)?,
      parent_id: row.get(1)?,
      kind:      row.get(2)?,
      title:     row.get(3)?,
      content:   row.get(4)?,
    })
  }

  pub fn into_tree_node(self) -> Result<TreeNode> {
    Ok(TreeNode {
      id:        self.id,
      parent_id: self.parent_id,
      kind:      decode_kind(&self.kind)?,
      title:     self.title,
      content:   self.content,
    })
  }
}

/// Column list matching [`RawNode::from_row`].
pub const NODE_COLUMNS: &str =
  "id, user_id, parent_id, node_type, title, content, created_at, updated_at";

/// Raw values read directly from a `nodes` row.
pub struct RawNode {
  pub id:         i64,
  pub user_id:    i64,
  pub parent_id:  Option<i64>,
  pub kind:       String,
  pub title:      String,
  pub content:    String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawNode {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      user_id:    row.get(1)?,
      parent_id:  row.get(2)?,
      kind:       row.get(3)?,
      title:      row.get(4)?,
      content:    row.get(5)?,
      created_at: row.get(6)?,
      updated_at: row.get(7)?,
    })
  }

  pub fn into_node(self) -> Result<Node> {
    Ok(Node {
      id:         self.id,
      user_id:    self.user_id,
      parent_id:  self.parent_id,
      kind:       decode_kind(&self.kind)?,
      title:      self.title,
      content:    self.content,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Column list matching [`RawDomainNode::from_row`].
pub const DOMAIN_NODE_COLUMNS: &str = "id, domain_id, parent_id, node_type, title, content, \
                                       comments_count, created_at, updated_at";

/// Raw values read directly from a `domain_nodes` row.
pub struct RawDomainNode {
  pub id:             i64,
  pub domain_id:      i64,
  pub parent_id:      Option<i64>,
  pub kind:           String,
  pub title:          String,
  pub content:        String,
  pub comments_count: i64,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawDomainNode {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      domain_id:      row.get(1)?,
      parent_id:      row.get(2)?,
      kind:           row.get(3)?,
      title:          row.get(4)?,
      content:        row.get(5)?,
      comments_count: row.get(6)?,
      created_at:     row.get(7)?,
      updated_at:     row.get(8)?,
    })
  }

  pub fn into_domain_node(self) -> Result<DomainNode> {
    Ok(DomainNode {
      id:             self.id,
      domain_id:      self.domain_id,
      parent_id:      self.parent_id,
      kind:           decode_kind(&self.kind)?,
      title:          self.title,
      content:        self.content,
      comments_count: self.comments_count,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

pub const USER_COLUMNS: &str = "id, username, created_at";

pub struct RawUser {
  pub id:         i64,
  pub username:   String,
  pub created_at: String,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { id: row.get(0)?, username: row.get(1)?, created_at: row.get(2)? })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:         self.id,
      username:   self.username,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const DOMAIN_COLUMNS: &str = "id, owner_id, name, description, join_code, created_at";

pub struct RawDomain {
  pub id:          i64,
  pub owner_id:    i64,
  pub name:        String,
  pub description: String,
  pub join_code:   String,
  pub created_at:  String,
}

impl RawDomain {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      owner_id:    row.get(1)?,
      name:        row.get(2)?,
      description: row.get(3)?,
      join_code:   row.get(4)?,
      created_at:  row.get(5)?,
    })
  }

  pub fn into_domain(self) -> Result<Domain> {
    Ok(Domain {
      id:          self.id,
      owner_id:    self.owner_id,
      name:        self.name,
      description: self.description,
      join_code:   self.join_code,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub const MEMBER_COLUMNS: &str = "domain_id, user_id, role, joined_at";

pub struct RawMember {
  pub domain_id: i64,
  pub user_id:   i64,
  pub role:      String,
  pub joined_at: String,
}

impl RawMember {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      domain_id: row.get(0)?,
      user_id:   row.get(1)?,
      role:      row.get(2)?,
      joined_at: row.get(3)?,
    })
  }

  pub fn into_member(self) -> Result<DomainMember> {
    Ok(DomainMember {
      domain_id: self.domain_id,
      user_id:   self.user_id,
      role:      decode_role(&self.role)?,
      joined_at: decode_dt(&self.joined_at)?,
    })
  }
}

pub const COMMENT_COLUMNS: &str = "id, domain_node_id, user_id, content, created_at";

pub struct RawComment {
  pub id:             i64,
  pub domain_node_id: i64,
  pub user_id:        i64,
  pub content:        String,
  pub created_at:     String,
  pub username:       String,
}

impl RawComment {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      domain_node_id: row.get(1)?,
      user_id:        row.get(2)?,
      content:        row.get(3)?,
      created_at:     row.get(4)?,
      username:       row.get(5)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      id:             self.id,
      domain_node_id: self.domain_node_id,
      user_id:        self.user_id,
      username:       self.username,
      content:        self.content,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_kind_is_a_decode_error() {
    let err = decode_kind("image").unwrap_err();
    assert!(matches!(err, Error::Decode { column: "node_type", .. }));
  }

  #[test]
  fn timestamps_survive_storage_format() {
    let at = Utc::now();
    assert_eq!(decode_dt(&encode_dt(at)).unwrap(), at);
  }
}
