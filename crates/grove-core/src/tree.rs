//! Tree algorithms: node CRUD, the ancestry walk, reparenting and publishing.
//!
//! Everything here runs against [`TreeTx`], a synchronous view of one open
//! storage transaction. Backends open the transaction, call into this module
//! and commit only if it returns `Ok`; any error leaves the store untouched.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{
  Error,
  error::MoveRejection,
  node::{DomainId, NewNode, NodeId, NodeKind, NodeUpdate, Scope, UserId},
};

// ─── Transaction view ────────────────────────────────────────────────────────

/// The tree-relevant columns of a live node in either tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
  pub id:        NodeId,
  pub parent_id: Option<NodeId>,
  pub kind:      NodeKind,
  pub title:     String,
  pub content:   String,
}

/// Scoped reads and writes against one open transaction.
///
/// Every method takes the owner [`Scope`] and must apply it as a query
/// predicate: a row that exists under another owner, or that has been soft
/// deleted, is reported as absent.
pub trait TreeTx {
  type Error: From<Error>;

  /// Fetch a live node.
  fn node(&self, scope: Scope, id: NodeId) -> Result<Option<TreeNode>, Self::Error>;

  /// Fetch only the parent pointer of a live node.
  ///
  /// The outer `None` means the row could not be resolved in `scope`.
  fn parent_of(
    &self,
    scope: Scope,
    id: NodeId,
  ) -> Result<Option<Option<NodeId>>, Self::Error> {
    Ok(self.node(scope, id)?.map(|n| n.parent_id))
  }

  /// Live direct children of `parent`, folders first, then by title.
  fn children(&self, scope: Scope, parent: NodeId) -> Result<Vec<TreeNode>, Self::Error>;

  /// Insert a node and return its new id.
  fn insert(
    &self,
    scope: Scope,
    parent: Option<NodeId>,
    kind: NodeKind,
    title: &str,
    content: &str,
  ) -> Result<NodeId, Self::Error>;

  /// Rewrite a single row's parent pointer.
  fn set_parent(
    &self,
    scope: Scope,
    id: NodeId,
    parent: Option<NodeId>,
  ) -> Result<(), Self::Error>;

  fn set_body(
    &self,
    scope: Scope,
    id: NodeId,
    title: &str,
    content: &str,
  ) -> Result<(), Self::Error>;

  /// Soft-delete `id` and all of its live descendants. Returns the number of
  /// rows marked.
  fn soft_delete(&self, scope: Scope, id: NodeId) -> Result<usize, Self::Error>;
}

// ─── Limits and cancellation ─────────────────────────────────────────────────

pub const DEFAULT_MAX_DEPTH: usize = 10_000;

/// Bounds applied to ancestry walks and subtree copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeLimits {
  /// Maximum number of parent links followed in a walk, and maximum nesting
  /// below the root of a published subtree. A node whose chain has exactly
  /// this many links is still within bounds.
  pub max_depth: usize,
}

impl Default for TreeLimits {
  fn default() -> Self { Self { max_depth: DEFAULT_MAX_DEPTH } }
}

/// Fails with [`Error::Cancelled`] once `cancel` has fired.
///
/// Callers that await a write hold `cancel.clone().drop_guard()`: dropping
/// their future cancels the token and the open transaction rolls back.
pub fn check(cancel: &CancellationToken) -> Result<(), Error> {
  if cancel.is_cancelled() { Err(Error::Cancelled) } else { Ok(()) }
}

// ─── Node CRUD ───────────────────────────────────────────────────────────────

/// Create a node. A parent, if given, must be a live folder in `scope`.
pub fn create_node<T: TreeTx>(
  tx: &T,
  scope: Scope,
  draft: NewNode,
) -> Result<NodeId, T::Error> {
  let draft = draft.normalized()?;

  if let Some(parent_id) = draft.parent_id {
    let parent = tx.node(scope, parent_id)?.ok_or_else(|| scope.not_found(parent_id))?;
    if !parent.kind.is_folder() {
      return Err(Error::Validation("cannot create a node under a text node".into()).into());
    }
  }

  tx.insert(scope, draft.parent_id, draft.kind, &draft.title, &draft.content)
}

pub fn update_node<T: TreeTx>(
  tx: &T,
  scope: Scope,
  id: NodeId,
  update: &NodeUpdate,
) -> Result<(), T::Error> {
  let node = tx.node(scope, id)?.ok_or_else(|| scope.not_found(id))?;
  update.validate(node.kind)?;

  let title = update.title.as_deref().unwrap_or(&node.title);
  let content = update.content.as_deref().unwrap_or(&node.content);
  tx.set_body(scope, id, title, content)
}

pub fn delete_node<T: TreeTx>(tx: &T, scope: Scope, id: NodeId) -> Result<usize, T::Error> {
  tx.node(scope, id)?.ok_or_else(|| scope.not_found(id))?;
  tx.soft_delete(scope, id)
}

// ─── Ancestry ────────────────────────────────────────────────────────────────

/// Whether `node` appears on the ancestor chain of `candidate_parent`
/// (`candidate_parent` itself included).
///
/// A parent pointer that cannot be resolved ends the walk without a verdict
/// of "cycle": a broken chain is not evidence that `node` is above it.
pub fn is_descendant<T: TreeTx>(
  tx: &T,
  scope: Scope,
  candidate_parent: NodeId,
  node: NodeId,
  limits: TreeLimits,
) -> Result<bool, T::Error> {
  let mut current = candidate_parent;
  let mut hops = 0usize;

  loop {
    if current == node {
      return Ok(true);
    }

    current = match tx.parent_of(scope, current)? {
      Some(Some(parent)) => parent,
      Some(None) | None => return Ok(false),
    };
    hops += 1;
    if hops > limits.max_depth {
      return Err(Error::TreeTooDeep(limits.max_depth).into());
    }
  }
}

// ─── Move ────────────────────────────────────────────────────────────────────

/// Reparent `node_id` under `new_parent` (or to the root when `None`).
///
/// Checks run in a fixed order and stop at the first failure; nothing is
/// written unless all of them pass. Descendants follow implicitly, since only
/// the moved row's parent pointer changes.
pub fn move_node<T: TreeTx>(
  tx: &T,
  scope: Scope,
  node_id: NodeId,
  new_parent: Option<NodeId>,
  limits: TreeLimits,
) -> Result<(), T::Error> {
  tx.node(scope, node_id)?.ok_or_else(|| scope.not_found(node_id))?;

  if let Some(parent_id) = new_parent {
    let parent = tx.node(scope, parent_id)?.ok_or_else(|| scope.not_found(parent_id))?;
    if !parent.kind.is_folder() {
      return Err(Error::InvalidMove(MoveRejection::ParentNotFolder).into());
    }
    if parent_id == node_id {
      return Err(Error::InvalidMove(MoveRejection::SelfParent).into());
    }
    if is_descendant(tx, scope, parent_id, node_id, limits)? {
      return Err(Error::InvalidMove(MoveRejection::Cycle).into());
    }
  }

  tx.set_parent(scope, node_id, new_parent)
}

// ─── Publish ─────────────────────────────────────────────────────────────────

/// A verified request to copy a personal subtree into a domain.
///
/// The caller has already established that `user_id` may publish into
/// `domain_id`; the source is looked up in `user_id`'s scope only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRequest {
  pub user_id:          UserId,
  pub source_node_id:   NodeId,
  pub domain_id:        DomainId,
  /// Folder in the domain tree to attach the copy under; `None` for the root.
  pub target_parent_id: Option<NodeId>,
}

/// Ids produced by [`publish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyReceipt {
  pub root_id:    NodeId,
  pub node_count: usize,
}

/// Deep-copy the source subtree into the domain tree.
///
/// Uses an explicit work stack rather than recursion. Siblings are created in
/// the order [`TreeTx::children`] returns them and folders are expanded in
/// that same order, so a given source tree always yields the same id layout.
pub fn publish<T: TreeTx>(
  tx: &T,
  request: &PublishRequest,
  limits: TreeLimits,
  cancel: &CancellationToken,
) -> Result<CopyReceipt, T::Error> {
  let source_scope = Scope::User(request.user_id);
  let target_scope = Scope::Domain(request.domain_id);

  if let Some(parent_id) = request.target_parent_id {
    let parent = tx
      .node(target_scope, parent_id)?
      .ok_or_else(|| target_scope.not_found(parent_id))?;
    if !parent.kind.is_folder() {
      return Err(Error::Validation("publish target must be a folder".into()).into());
    }
  }

  let source = tx
    .node(source_scope, request.source_node_id)?
    .ok_or_else(|| source_scope.not_found(request.source_node_id))?;

  let root_id = tx.insert(
    target_scope,
    request.target_parent_id,
    source.kind,
    &source.title,
    &source.content,
  )?;
  let mut node_count = 1;

  // (source folder, its copy, depth of its children)
  let mut pending: Vec<(NodeId, NodeId, usize)> = Vec::new();
  if source.kind.is_folder() {
    pending.push((source.id, root_id, 1));
  }

  while let Some((source_id, copy_id, depth)) = pending.pop() {
    check(cancel)?;

    let mut folders = Vec::new();
    for child in tx.children(source_scope, source_id)? {
      if depth > limits.max_depth {
        return Err(Error::TreeTooDeep(limits.max_depth).into());
      }
      let child_copy =
        tx.insert(target_scope, Some(copy_id), child.kind, &child.title, &child.content)?;
      node_count += 1;
      if child.kind.is_folder() {
        folders.push((child.id, child_copy, depth + 1));
      }
    }
    pending.extend(folders.into_iter().rev());
  }

  Ok(CopyReceipt { root_id, node_count })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::cell::{Cell, RefCell};

  use super::*;

  #[derive(Debug)]
  enum MemError {
    Core(Error),
    Injected,
  }

  impl From<Error> for MemError {
    fn from(e: Error) -> Self { MemError::Core(e) }
  }

  #[derive(Debug, Clone)]
  struct Row {
    scope:   Scope,
    node:    TreeNode,
    deleted: bool,
  }

  /// Vec-backed tree with call counters and failure injection.
  #[derive(Default)]
  struct MemTree {
    rows:           RefCell<Vec<Row>>,
    parent_lookups: Cell<usize>,
    inserts:        Cell<usize>,
    fail_on_insert: Cell<Option<usize>>,
  }

  impl MemTree {
    fn add(&self, scope: Scope, parent: Option<NodeId>, kind: NodeKind, title: &str) -> NodeId {
      self.insert(scope, parent, kind, title, "").unwrap()
    }

    fn find(&self, scope: Scope, id: NodeId) -> Option<Row> {
      self
        .rows
        .borrow()
        .iter()
        .find(|r| same_table(r.scope, scope) && r.node.id == id)
        .cloned()
    }

    fn live(&self, scope: Scope) -> Vec<TreeNode> {
      self
        .rows
        .borrow()
        .iter()
        .filter(|r| r.scope == scope && !r.deleted)
        .map(|r| r.node.clone())
        .collect()
    }

    fn parents(&self, scope: Scope) -> Vec<(NodeId, Option<NodeId>)> {
      self.live(scope).into_iter().map(|n| (n.id, n.parent_id)).collect()
    }

    /// Corrupt a parent pointer directly, bypassing all checks.
    fn force_parent(&self, scope: Scope, id: NodeId, parent: Option<NodeId>) {
      for row in self.rows.borrow_mut().iter_mut() {
        if row.scope == scope && row.node.id == id {
          row.node.parent_id = parent;
        }
      }
    }
  }

  fn same_table(a: Scope, b: Scope) -> bool {
    matches!((a, b), (Scope::User(_), Scope::User(_)) | (Scope::Domain(_), Scope::Domain(_)))
  }

  impl TreeTx for MemTree {
    type Error = MemError;

    fn node(&self, scope: Scope, id: NodeId) -> Result<Option<TreeNode>, MemError> {
      Ok(
        self
          .find(scope, id)
          .filter(|r| r.scope == scope && !r.deleted)
          .map(|r| r.node),
      )
    }

    fn parent_of(&self, scope: Scope, id: NodeId) -> Result<Option<Option<NodeId>>, MemError> {
      self.parent_lookups.set(self.parent_lookups.get() + 1);
      Ok(self.node(scope, id)?.map(|n| n.parent_id))
    }

    fn children(&self, scope: Scope, parent: NodeId) -> Result<Vec<TreeNode>, MemError> {
      let mut out: Vec<TreeNode> = self
        .live(scope)
        .into_iter()
        .filter(|n| n.parent_id == Some(parent))
        .collect();
      out.sort_by(|a, b| {
        (!a.kind.is_folder(), &a.title, a.id).cmp(&(!b.kind.is_folder(), &b.title, b.id))
      });
      Ok(out)
    }

    fn insert(
      &self,
      scope: Scope,
      parent: Option<NodeId>,
      kind: NodeKind,
      title: &str,
      content: &str,
    ) -> Result<NodeId, MemError> {
      let n = self.inserts.get() + 1;
      if self.fail_on_insert.get() == Some(n) {
        return Err(MemError::Injected);
      }
      self.inserts.set(n);

      let mut rows = self.rows.borrow_mut();
      let id = rows.iter().filter(|r| same_table(r.scope, scope)).count() as NodeId + 1;
      rows.push(Row {
        scope,
        node: TreeNode {
          id,
          parent_id: parent,
          kind,
          title: title.to_owned(),
          content: content.to_owned(),
        },
        deleted: false,
      });
      Ok(id)
    }

    fn set_parent(&self, scope: Scope, id: NodeId, parent: Option<NodeId>) -> Result<(), MemError> {
      self.force_parent(scope, id, parent);
      Ok(())
    }

    fn set_body(&self, scope: Scope, id: NodeId, title: &str, content: &str) -> Result<(), MemError> {
      for row in self.rows.borrow_mut().iter_mut() {
        if row.scope == scope && row.node.id == id {
          row.node.title = title.to_owned();
          row.node.content = content.to_owned();
        }
      }
      Ok(())
    }

    fn soft_delete(&self, scope: Scope, id: NodeId) -> Result<usize, MemError> {
      let mut frontier = vec![id];
      let mut marked = 0;
      while let Some(current) = frontier.pop() {
        let mut rows = self.rows.borrow_mut();
        for row in rows.iter_mut().filter(|r| r.scope == scope && !r.deleted) {
          if row.node.id == current {
            row.deleted = true;
            marked += 1;
          } else if row.node.parent_id == Some(current) {
            frontier.push(row.node.id);
          }
        }
      }
      Ok(marked)
    }
  }

  const ALICE: Scope = Scope::User(1);
  const BOB: Scope = Scope::User(2);
  const CIRCLE: Scope = Scope::Domain(7);

  fn limits() -> TreeLimits { TreeLimits::default() }

  /// root(1) → a(2) → b(3) → c(4), all folders, owned by ALICE.
  fn chain() -> MemTree {
    let t = MemTree::default();
    let root = t.add(ALICE, None, NodeKind::Folder, "root");
    let a = t.add(ALICE, Some(root), NodeKind::Folder, "a");
    let b = t.add(ALICE, Some(a), NodeKind::Folder, "b");
    t.add(ALICE, Some(b), NodeKind::Folder, "c");
    t
  }

  fn expect_core(err: MemError) -> Error {
    match err {
      MemError::Core(e) => e,
      MemError::Injected => panic!("unexpected injected failure"),
    }
  }

  // ── Ancestry ──────────────────────────────────────────────────────────────

  #[test]
  fn descendant_found_on_chain() {
    let t = chain();
    assert!(is_descendant(&t, ALICE, 4, 1, limits()).unwrap());
    assert!(is_descendant(&t, ALICE, 3, 2, limits()).unwrap());
  }

  #[test]
  fn unrelated_node_is_not_descendant() {
    let t = chain();
    let other = t.add(ALICE, None, NodeKind::Folder, "other");
    assert!(!is_descendant(&t, ALICE, 4, other, limits()).unwrap());
  }

  #[test]
  fn dangling_parent_ends_walk_without_cycle() {
    let t = chain();
    t.force_parent(ALICE, 2, Some(999));
    assert!(!is_descendant(&t, ALICE, 4, 1, limits()).unwrap());
  }

  #[test]
  fn walk_does_not_cross_scopes() {
    let t = chain();
    // Bob's node claims Alice's deepest node as parent. An unscoped walk would
    // climb 4 → 3 → 2; Bob's walk must stop at the first foreign row.
    let stray = t.add(BOB, None, NodeKind::Folder, "stray");
    t.force_parent(BOB, stray, Some(4));
    assert!(!is_descendant(&t, BOB, stray, 2, limits()).unwrap());
  }

  #[test]
  fn walk_is_bounded() {
    let t = chain();
    // Corrupt the chain into a loop that never reaches node 99.
    t.force_parent(ALICE, 1, Some(4));
    let err = is_descendant(&t, ALICE, 4, 99, TreeLimits { max_depth: 16 }).unwrap_err();
    assert!(matches!(expect_core(err), Error::TreeTooDeep(16)));
  }

  // ── Move ──────────────────────────────────────────────────────────────────

  #[test]
  fn move_under_own_descendant_is_rejected() {
    let t = chain();
    let before = t.parents(ALICE);
    let err = move_node(&t, ALICE, 1, Some(4), limits()).unwrap_err();
    assert!(matches!(expect_core(err), Error::InvalidMove(MoveRejection::Cycle)));
    assert_eq!(t.parents(ALICE), before);
  }

  #[test]
  fn self_move_is_rejected_before_walk() {
    let t = chain();
    let err = move_node(&t, ALICE, 2, Some(2), limits()).unwrap_err();
    assert!(matches!(expect_core(err), Error::InvalidMove(MoveRejection::SelfParent)));
    assert_eq!(t.parent_lookups.get(), 0);
  }

  #[test]
  fn move_under_text_is_rejected() {
    let t = chain();
    let note = t.add(ALICE, Some(1), NodeKind::Text, "note");
    let err = move_node(&t, ALICE, 3, Some(note), limits()).unwrap_err();
    assert!(matches!(expect_core(err), Error::InvalidMove(MoveRejection::ParentNotFolder)));
  }

  #[test]
  fn move_to_root_changes_one_row() {
    let t = chain();
    let before = t.parents(ALICE);
    move_node(&t, ALICE, 3, None, limits()).unwrap();

    let after = t.parents(ALICE);
    let changed: Vec<_> = before.iter().zip(&after).filter(|(b, a)| b != a).collect();
    assert_eq!(changed.len(), 1);
    assert_eq!(*changed[0].1, (3, None));
  }

  #[test]
  fn move_across_owners_is_not_found() {
    let t = chain();
    let bobs = t.add(BOB, None, NodeKind::Folder, "bob's");
    let err = move_node(&t, ALICE, 2, Some(bobs), limits()).unwrap_err();
    assert!(matches!(expect_core(err), Error::NotFound(_, id) if id == bobs));
    let err = move_node(&t, BOB, 2, None, limits()).unwrap_err();
    assert!(matches!(expect_core(err), Error::NotFound(_, 2)));
  }

  // ── CRUD ──────────────────────────────────────────────────────────────────

  #[test]
  fn create_under_text_is_rejected() {
    let t = MemTree::default();
    let note = t.add(ALICE, None, NodeKind::Text, "note");
    let err = create_node(&t, ALICE, NewNode::text(Some(note), "child", "")).unwrap_err();
    assert!(matches!(expect_core(err), Error::Validation(_)));
  }

  #[test]
  fn delete_cascades_to_descendants() {
    let t = chain();
    let marked = delete_node(&t, ALICE, 2).unwrap();
    assert_eq!(marked, 3);
    assert_eq!(t.live(ALICE).len(), 1);
  }

  // ── Publish ───────────────────────────────────────────────────────────────

  fn request(source: NodeId) -> PublishRequest {
    PublishRequest {
      user_id:          ALICE.owner(),
      source_node_id:   source,
      domain_id:        CIRCLE.owner(),
      target_parent_id: None,
    }
  }

  #[test]
  fn publish_copies_folder_with_text() {
    let t = MemTree::default();
    let folder = t.add(ALICE, None, NodeKind::Folder, "Folder1");
    t.insert(ALICE, Some(folder), NodeKind::Text, "weather", "today weather is nice")
      .unwrap();

    let receipt = publish(&t, &request(folder), limits(), &CancellationToken::new()).unwrap();
    assert_eq!(receipt.node_count, 2);

    let root = t.node(CIRCLE, receipt.root_id).unwrap().unwrap();
    assert_eq!(root.title, "Folder1");
    assert_eq!(root.parent_id, None);
    let kids = t.children(CIRCLE, receipt.root_id).unwrap();
    assert_eq!(kids.len(), 1);
    assert_eq!(kids[0].content, "today weather is nice");
  }

  #[test]
  fn publish_preserves_sibling_order() {
    let t = MemTree::default();
    let top = t.add(ALICE, None, NodeKind::Folder, "top");
    t.add(ALICE, Some(top), NodeKind::Text, "b");
    t.add(ALICE, Some(top), NodeKind::Text, "a");
    let sub = t.add(ALICE, Some(top), NodeKind::Folder, "z-folder");
    t.add(ALICE, Some(sub), NodeKind::Text, "inner");

    let receipt = publish(&t, &request(top), limits(), &CancellationToken::new()).unwrap();
    let titles: Vec<String> =
      t.children(CIRCLE, receipt.root_id).unwrap().into_iter().map(|n| n.title).collect();
    assert_eq!(titles, ["z-folder", "a", "b"]);
    // Copies are inserted in listing order: folder first, then a, then b.
    let ids: Vec<NodeId> =
      t.children(CIRCLE, receipt.root_id).unwrap().into_iter().map(|n| n.id).collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
  }

  #[test]
  fn publish_under_text_target_is_rejected() {
    let t = MemTree::default();
    let src = t.add(ALICE, None, NodeKind::Text, "src");
    let leaf = t.add(CIRCLE, None, NodeKind::Text, "leaf");
    let mut req = request(src);
    req.target_parent_id = Some(leaf);
    let err = publish(&t, &req, limits(), &CancellationToken::new()).unwrap_err();
    assert!(matches!(expect_core(err), Error::Validation(_)));
  }

  #[test]
  fn publish_of_foreign_source_is_not_found() {
    let t = MemTree::default();
    let bobs = t.add(BOB, None, NodeKind::Folder, "bob's");
    let err = publish(&t, &request(bobs), limits(), &CancellationToken::new()).unwrap_err();
    assert!(matches!(expect_core(err), Error::NotFound(_, id) if id == bobs));
  }

  #[test]
  fn publish_stops_at_first_failed_insert() {
    let t = chain();
    let already = t.inserts.get();
    t.fail_on_insert.set(Some(already + 3));
    let err = publish(&t, &request(1), limits(), &CancellationToken::new()).unwrap_err();
    assert!(matches!(err, MemError::Injected));
    assert_eq!(t.live(CIRCLE).len(), 2);
  }

  #[test]
  fn publish_observes_cancellation() {
    let t = chain();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = publish(&t, &request(1), limits(), &cancel).unwrap_err();
    assert!(matches!(expect_core(err), Error::Cancelled));
  }

  #[test]
  fn publish_aborts_on_corrupted_cycle() {
    let t = chain();
    // A cycle 2 → 3 → 4 → 2 that a racing writer could have produced.
    t.force_parent(ALICE, 2, Some(4));
    let err = publish(&t, &request(2), TreeLimits { max_depth: 32 }, &CancellationToken::new())
      .unwrap_err();
    assert!(matches!(expect_core(err), Error::TreeTooDeep(32)));
  }

  #[test]
  fn dropped_guard_cancels_publish() {
    let t = chain();
    let cancel = CancellationToken::new();
    drop(cancel.clone().drop_guard());
    let err = publish(&t, &request(1), limits(), &cancel).unwrap_err();
    assert!(matches!(expect_core(err), Error::Cancelled));
  }

  #[test]
  fn publish_accepts_nesting_at_the_limit() {
    // root(1) → a(2) → b(3) → c(4): c sits three links below the root.
    let t = chain();
    let receipt = publish(&t, &request(1), TreeLimits { max_depth: 3 }, &CancellationToken::new())
      .unwrap();
    assert_eq!(receipt.node_count, 4);

    let t = chain();
    let err = publish(&t, &request(1), TreeLimits { max_depth: 2 }, &CancellationToken::new())
      .unwrap_err();
    assert!(matches!(expect_core(err), Error::TreeTooDeep(2)));
  }

  #[test]
  fn walk_accepts_chain_at_the_limit() {
    let t = chain();
    let loose = t.add(ALICE, None, NodeKind::Folder, "loose");
    assert!(!is_descendant(&t, ALICE, 4, loose, TreeLimits { max_depth: 3 }).unwrap());
    move_node(&t, ALICE, loose, Some(4), TreeLimits { max_depth: 3 }).unwrap();

    let below = t.add(ALICE, None, NodeKind::Folder, "below");
    let err = move_node(&t, ALICE, below, Some(loose), TreeLimits { max_depth: 3 }).unwrap_err();
    assert!(matches!(expect_core(err), Error::TreeTooDeep(3)));
  }
}
