//! Whole-row reads shared by the store's read paths and its transactions.
//!
//! Each function takes a plain [`Connection`] so it can run either directly
//! inside `tokio_rusqlite::Connection::call` or against an open transaction.

use grove_core::{
  domain::{Comment, Domain, DomainMember},
  node::{DomainId, DomainNode, Node, NodeId, UserId},
  user::{User, UserCredentials},
};
use rusqlite::{Connection, OptionalExtension as _, Params, params};

use crate::{
  Result,
  encode::{
    COMMENT_COLUMNS, DOMAIN_COLUMNS, DOMAIN_NODE_COLUMNS, MEMBER_COLUMNS, NODE_COLUMNS,
    RawComment, RawDomain, RawDomainNode, RawMember, RawNode, RawUser, USER_COLUMNS,
  },
  tx::CHILD_ORDER,
};

fn collect<R, P, F>(conn: &Connection, sql: &str, params: P, map: F) -> Result<Vec<R>>
where
  P: Params,
  F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<R>,
{
  let mut stmt = conn.prepare_cached(sql)?;
  let rows = stmt.query_map(params, map)?.collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

// ─── Users ───────────────────────────────────────────────────────────────────

pub fn user(conn: &Connection, id: UserId) -> Result<Option<User>> {
  conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
      params![id],
      RawUser::from_row,
    )
    .optional()?
    .map(RawUser::into_user)
    .transpose()
}

pub fn credentials(conn: &Connection, username: &str) -> Result<Option<UserCredentials>> {
  let found = conn
    .query_row(
      &format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE username = ?1"),
      params![username],
      |row| Ok((RawUser::from_row(row)?, row.get::<_, String>(3)?)),
    )
    .optional()?;

  found
    .map(|(raw, password_hash)| Ok(UserCredentials { user: raw.into_user()?, password_hash }))
    .transpose()
}

// ─── Personal nodes ──────────────────────────────────────────────────────────

pub fn node(conn: &Connection, user_id: UserId, id: NodeId) -> Result<Option<Node>> {
  conn
    .prepare_cached(&format!(
      "SELECT {NODE_COLUMNS} FROM nodes
       WHERE id = ?1 AND user_id = ?2 AND deleted_at IS NULL"
    ))?
    .query_row(params![id, user_id], RawNode::from_row)
    .optional()?
    .map(RawNode::into_node)
    .transpose()
}

/// `parent_id IS ?2` matches NULL for roots and plain equality otherwise.
pub fn nodes_under(conn: &Connection, user_id: UserId, parent: Option<NodeId>) -> Result<Vec<Node>> {
  let sql = format!(
    "SELECT {NODE_COLUMNS} FROM nodes
     WHERE user_id = ?1 AND parent_id IS ?2 AND deleted_at IS NULL
     ORDER BY {CHILD_ORDER}"
  );
  collect(conn, &sql, params![user_id, parent], RawNode::from_row)?
    .into_iter()
    .map(RawNode::into_node)
    .collect()
}

/// Case-insensitive (ASCII) substring match on title or content.
pub fn search_nodes(conn: &Connection, user_id: UserId, needle: &str) -> Result<Vec<Node>> {
  let pattern = format!("%{}%", escape_like(needle));
  let sql = format!(
    "SELECT {NODE_COLUMNS} FROM nodes
     WHERE user_id = ?1 AND deleted_at IS NULL
       AND (title LIKE ?2 ESCAPE '\\' OR content LIKE ?2 ESCAPE '\\')
     ORDER BY updated_at DESC, id DESC"
  );
  collect(conn, &sql, params![user_id, pattern], RawNode::from_row)?
    .into_iter()
    .map(RawNode::into_node)
    .collect()
}

fn escape_like(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

// ─── Domain nodes ────────────────────────────────────────────────────────────

pub fn domain_node(conn: &Connection, domain_id: DomainId, id: NodeId) -> Result<Option<DomainNode>> {
  conn
    .prepare_cached(&format!(
      "SELECT {DOMAIN_NODE_COLUMNS} FROM domain_nodes
       WHERE id = ?1 AND domain_id = ?2 AND deleted_at IS NULL"
    ))?
    .query_row(params![id, domain_id], RawDomainNode::from_row)
    .optional()?
    .map(RawDomainNode::into_domain_node)
    .transpose()
}

pub fn domain_nodes_under(
  conn: &Connection,
  domain_id: DomainId,
  parent: Option<NodeId>,
) -> Result<Vec<DomainNode>> {
  let sql = format!(
    "SELECT {DOMAIN_NODE_COLUMNS} FROM domain_nodes
     WHERE domain_id = ?1 AND parent_id IS ?2 AND deleted_at IS NULL
     ORDER BY {CHILD_ORDER}"
  );
  collect(conn, &sql, params![domain_id, parent], RawDomainNode::from_row)?
    .into_iter()
    .map(RawDomainNode::into_domain_node)
    .collect()
}

pub fn domain_of_node(conn: &Connection, id: NodeId) -> Result<Option<DomainId>> {
  Ok(
    conn
      .query_row(
        "SELECT domain_id FROM domain_nodes WHERE id = ?1 AND deleted_at IS NULL",
        params![id],
        |r| r.get(0),
      )
      .optional()?,
  )
}

// ─── Domains ─────────────────────────────────────────────────────────────────

pub fn domain(conn: &Connection, id: DomainId) -> Result<Option<Domain>> {
  conn
    .query_row(
      &format!("SELECT {DOMAIN_COLUMNS} FROM domains WHERE id = ?1"),
      params![id],
      RawDomain::from_row,
    )
    .optional()?
    .map(RawDomain::into_domain)
    .transpose()
}

/// The domain only if `join_code` matches it.
pub fn domain_with_code(conn: &Connection, id: DomainId, join_code: &str) -> Result<Option<Domain>> {
  conn
    .query_row(
      &format!("SELECT {DOMAIN_COLUMNS} FROM domains WHERE id = ?1 AND join_code = ?2"),
      params![id, join_code],
      RawDomain::from_row,
    )
    .optional()?
    .map(RawDomain::into_domain)
    .transpose()
}

pub fn join_code_taken(conn: &Connection, join_code: &str) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM domains WHERE join_code = ?1",
        params![join_code],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

pub fn member(conn: &Connection, domain_id: DomainId, user_id: UserId) -> Result<Option<DomainMember>> {
  conn
    .query_row(
      &format!(
        "SELECT {MEMBER_COLUMNS} FROM domain_members WHERE domain_id = ?1 AND user_id = ?2"
      ),
      params![domain_id, user_id],
      RawMember::from_row,
    )
    .optional()?
    .map(RawMember::into_member)
    .transpose()
}

pub fn member_domains(conn: &Connection, user_id: UserId) -> Result<Vec<Domain>> {
  let sql = format!(
    "SELECT {} FROM domains d
     JOIN domain_members m ON m.domain_id = d.id
     WHERE m.user_id = ?1
     ORDER BY m.joined_at, d.id",
    prefixed("d", DOMAIN_COLUMNS),
  );
  collect(conn, &sql, params![user_id], RawDomain::from_row)?
    .into_iter()
    .map(RawDomain::into_domain)
    .collect()
}

pub fn owned_domains(conn: &Connection, user_id: UserId) -> Result<Vec<Domain>> {
  let sql = format!(
    "SELECT {DOMAIN_COLUMNS} FROM domains WHERE owner_id = ?1 ORDER BY created_at, id"
  );
  collect(conn, &sql, params![user_id], RawDomain::from_row)?
    .into_iter()
    .map(RawDomain::into_domain)
    .collect()
}

/// Qualify every name in a column list with a table alias.
fn prefixed(alias: &str, columns: &str) -> String {
  columns
    .split(", ")
    .map(|c| format!("{alias}.{c}"))
    .collect::<Vec<_>>()
    .join(", ")
}

// ─── Comments ────────────────────────────────────────────────────────────────

/// Comment columns followed by the author's username.
fn comment_select() -> String {
  format!(
    "SELECT {}, u.username FROM domain_node_comments c JOIN users u ON u.id = c.user_id",
    prefixed("c", COMMENT_COLUMNS)
  )
}

pub fn comment(conn: &Connection, id: i64) -> Result<Option<Comment>> {
  conn
    .query_row(
      &format!("{} WHERE c.id = ?1", comment_select()),
      params![id],
      RawComment::from_row,
    )
    .optional()?
    .map(RawComment::into_comment)
    .transpose()
}

pub fn comments(conn: &Connection, domain_node_id: NodeId) -> Result<Vec<Comment>> {
  let sql = format!(
    "{} WHERE c.domain_node_id = ?1 ORDER BY c.created_at DESC, c.id DESC",
    comment_select()
  );
  collect(conn, &sql, params![domain_node_id], RawComment::from_row)?
    .into_iter()
    .map(RawComment::into_comment)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn like_wildcards_are_escaped() {
    assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
  }

  #[test]
  fn columns_are_prefixed() {
    assert_eq!(prefixed("d", "id, name"), "d.id, d.name");
  }

  #[test]
  fn comment_select_joins_the_author() {
    let sql = comment_select();
    assert!(sql.starts_with(
      "SELECT c.id, c.domain_node_id, c.user_id, c.content, c.created_at, u.username"
    ));
    assert!(sql.ends_with("JOIN users u ON u.id = c.user_id"));
  }
}
