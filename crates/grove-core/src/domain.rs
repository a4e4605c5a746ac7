//! Domains (shared circles), their membership roster and node comments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  node::{DomainId, NodeId, UserId},
};

/// Longest domain name accepted, counted in characters.
pub const MAX_DOMAIN_NAME_LEN: usize = 100;

/// Length of a generated join code.
pub const JOIN_CODE_LEN: usize = 8;

/// A named shared circle with its own node tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
  pub id:          DomainId,
  pub owner_id:    UserId,
  pub name:        String,
  pub description: String,
  pub join_code:   String,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDomain {
  pub name:        String,
  #[serde(default)]
  pub description: String,
}

impl NewDomain {
  pub fn validate(&self) -> Result<()> {
    let len = self.name.trim().chars().count();
    if len == 0 {
      return Err(Error::Validation("domain name cannot be empty".into()));
    }
    if self.name.chars().count() > MAX_DOMAIN_NAME_LEN {
      return Err(Error::Validation(format!(
        "domain name is longer than {MAX_DOMAIN_NAME_LEN} characters"
      )));
    }
    Ok(())
  }
}

/// A member's standing inside a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Owner,
  Admin,
  Member,
}

impl Role {
  /// Owners and admins may edit the domain tree and publish into it.
  pub fn can_manage(self) -> bool { matches!(self, Self::Owner | Self::Admin) }
}

/// One row of a domain's roster; unique per (domain, user).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainMember {
  pub domain_id: DomainId,
  pub user_id:   UserId,
  pub role:      Role,
  pub joined_at: DateTime<Utc>,
}

/// A comment left by a member on a domain node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
  pub id:             i64,
  pub domain_node_id: NodeId,
  pub user_id:        UserId,
  /// Author's username at read time.
  pub username:       String,
  pub content:        String,
  pub created_at:     DateTime<Utc>,
}

pub fn validate_comment(content: &str) -> Result<()> {
  if content.trim().is_empty() {
    return Err(Error::Validation("comment cannot be empty".into()));
  }
  Ok(())
}

/// Result of publishing a personal subtree into a domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Published {
  /// The copy of the source node; the rest of the subtree hangs below it.
  pub root:       crate::node::DomainNode,
  /// Number of domain nodes created, root included.
  pub node_count: usize,
}
