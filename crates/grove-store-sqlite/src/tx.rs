//! [`TreeTx`] over an open SQLite transaction.
//!
//! The personal and domain trees share one shape; a [`Scope`] selects the
//! table and the owner column every statement filters on.

use grove_core::{
  node::{NodeId, NodeKind, Scope},
  tree::{TreeNode, TreeTx},
};
use rusqlite::{Connection, OptionalExtension as _, params};

use crate::{
  Error, Result,
  encode::{RawTreeNode, TREE_COLUMNS, encode_kind, now},
};

/// Sibling order used by every listing: folders first, then title.
pub const CHILD_ORDER: &str = "CASE node_type WHEN 'folder' THEN 0 ELSE 1 END, title, id";

/// `(table, owner column)` holding a scope's rows.
pub fn table(scope: Scope) -> (&'static str, &'static str) {
  match scope {
    Scope::User(_) => ("nodes", "user_id"),
    Scope::Domain(_) => ("domain_nodes", "domain_id"),
  }
}

/// Tree reads and writes bound to one connection inside a transaction.
///
/// All writes made through one instance share a single `updated_at`.
pub struct SqliteTreeTx<'c> {
  conn: &'c Connection,
  now:  String,
}

impl<'c> SqliteTreeTx<'c> {
  pub fn new(conn: &'c Connection) -> Self { Self { conn, now: now() } }
}

impl TreeTx for SqliteTreeTx<'_> {
  type Error = Error;

  fn node(&self, scope: Scope, id: NodeId) -> Result<Option<TreeNode>> {
    let (table, owner) = table(scope);
    let sql = format!(
      "SELECT {TREE_COLUMNS} FROM {table}
       WHERE id = ?1 AND {owner} = ?2 AND deleted_at IS NULL"
    );
    self
      .conn
      .prepare_cached(&sql)?
      .query_row(params![id, scope.owner()], RawTreeNode::from_row)
      .optional()?
      .map(RawTreeNode::into_tree_node)
      .transpose()
  }

  fn parent_of(&self, scope: Scope, id: NodeId) -> Result<Option<Option<NodeId>>> {
    let (table, owner) = table(scope);
    let sql = format!(
      "SELECT parent_id FROM {table}
       WHERE id = ?1 AND {owner} = ?2 AND deleted_at IS NULL"
    );
    Ok(
      self
        .conn
        .prepare_cached(&sql)?
        .query_row(params![id, scope.owner()], |r| r.get::<_, Option<NodeId>>(0))
        .optional()?,
    )
  }

  fn children(&self, scope: Scope, parent: NodeId) -> Result<Vec<TreeNode>> {
    let (table, owner) = table(scope);
    let sql = format!(
      "SELECT {TREE_COLUMNS} FROM {table}
       WHERE parent_id = ?1 AND {owner} = ?2 AND deleted_at IS NULL
       ORDER BY {CHILD_ORDER}"
    );
    let mut stmt = self.conn.prepare_cached(&sql)?;
    let raws = stmt
      .query_map(params![parent, scope.owner()], RawTreeNode::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    raws.into_iter().map(RawTreeNode::into_tree_node).collect()
  }

  fn insert(
    &self,
    scope: Scope,
    parent: Option<NodeId>,
    kind: NodeKind,
    title: &str,
    content: &str,
  ) -> Result<NodeId> {
    let (table, owner) = table(scope);
    let sql = format!(
      "INSERT INTO {table} ({owner}, parent_id, node_type, title, content, created_at, updated_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)"
    );
    self.conn.prepare_cached(&sql)?.execute(params![
      scope.owner(),
      parent,
      encode_kind(kind),
      title,
      content,
      self.now,
    ])?;
    Ok(self.conn.last_insert_rowid())
  }

  fn set_parent(&self, scope: Scope, id: NodeId, parent: Option<NodeId>) -> Result<()> {
    let (table, owner) = table(scope);
    let sql = format!(
      "UPDATE {table} SET parent_id = ?1, updated_at = ?2
       WHERE id = ?3 AND {owner} = ?4 AND deleted_at IS NULL"
    );
    self
      .conn
      .prepare_cached(&sql)?
      .execute(params![parent, self.now, id, scope.owner()])?;
    Ok(())
  }

  fn set_body(&self, scope: Scope, id: NodeId, title: &str, content: &str) -> Result<()> {
    let (table, owner) = table(scope);
    let sql = format!(
      "UPDATE {table} SET title = ?1, content = ?2, updated_at = ?3
       WHERE id = ?4 AND {owner} = ?5 AND deleted_at IS NULL"
    );
    self
      .conn
      .prepare_cached(&sql)?
      .execute(params![title, content, self.now, id, scope.owner()])?;
    Ok(())
  }

  fn soft_delete(&self, scope: Scope, id: NodeId) -> Result<usize> {
    let (table, owner) = table(scope);
    // UNION (not UNION ALL) stops at rows already collected, so a corrupted
    // cycle cannot make the recursion run forever.
    let sql = format!(
      "WITH RECURSIVE subtree(id) AS (
         SELECT id FROM {table}
         WHERE id = ?1 AND {owner} = ?2 AND deleted_at IS NULL
         UNION
         SELECT t.id FROM {table} t JOIN subtree s ON t.parent_id = s.id
         WHERE t.{owner} = ?2 AND t.deleted_at IS NULL
       )
       UPDATE {table} SET deleted_at = ?3, updated_at = ?3
       WHERE id IN (SELECT id FROM subtree)"
    );
    Ok(
      self
        .conn
        .prepare_cached(&sql)?
        .execute(params![id, scope.owner(), self.now])?,
    )
  }
}
