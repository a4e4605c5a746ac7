//! The `GroveStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `grove-store-sqlite`).
//! The HTTP layer depends on this abstraction, not on any concrete backend.
//!
//! Identity and role checks are the caller's job. Methods taking a
//! `user_id` or `domain_id` apply it as an owner-scope predicate and report
//! rows outside that scope as not found.

use std::future::Future;

use crate::{
  AsCoreError,
  domain::{Comment, Domain, DomainMember, NewDomain, Published},
  node::{DomainId, DomainNode, NewNode, Node, NodeId, NodeUpdate, UserId},
  tree::PublishRequest,
  user::{User, UserCredentials},
};

/// Abstraction over a Grove storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait GroveStore: Send + Sync {
  type Error: std::error::Error + AsCoreError + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user. Fails with `UsernameTaken` on a duplicate name.
  fn create_user(
    &self,
    username: String,
    password_hash: String,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Look up a user and its password hash by username.
  fn find_credentials(
    &self,
    username: String,
  ) -> impl Future<Output = Result<Option<UserCredentials>, Self::Error>> + Send + '_;

  // ── Personal nodes ────────────────────────────────────────────────────

  fn create_node(
    &self,
    user_id: UserId,
    input: NewNode,
  ) -> impl Future<Output = Result<Node, Self::Error>> + Send + '_;

  fn get_node(
    &self,
    user_id: UserId,
    id: NodeId,
  ) -> impl Future<Output = Result<Option<Node>, Self::Error>> + Send + '_;

  /// Children of `parent` (roots when `None`), folders first, then by title.
  fn list_nodes(
    &self,
    user_id: UserId,
    parent: Option<NodeId>,
  ) -> impl Future<Output = Result<Vec<Node>, Self::Error>> + Send + '_;

  fn update_node(
    &self,
    user_id: UserId,
    id: NodeId,
    update: NodeUpdate,
  ) -> impl Future<Output = Result<Node, Self::Error>> + Send + '_;

  /// Soft-delete a node and its descendants. Returns the number of rows
  /// marked.
  fn delete_node(
    &self,
    user_id: UserId,
    id: NodeId,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Substring search over titles and content, most recently updated first.
  fn search_nodes(
    &self,
    user_id: UserId,
    query: String,
  ) -> impl Future<Output = Result<Vec<Node>, Self::Error>> + Send + '_;

  /// Reparent a node within the user's tree.
  fn move_node(
    &self,
    user_id: UserId,
    id: NodeId,
    new_parent: Option<NodeId>,
  ) -> impl Future<Output = Result<Node, Self::Error>> + Send + '_;

  // ── Domains ───────────────────────────────────────────────────────────

  /// Create a domain and enrol `owner_id` as its owner, atomically.
  fn create_domain(
    &self,
    owner_id: UserId,
    input: NewDomain,
  ) -> impl Future<Output = Result<Domain, Self::Error>> + Send + '_;

  /// Join a domain as a plain member. A wrong (id, code) pair is reported as
  /// the domain not being found.
  fn join_domain(
    &self,
    user_id: UserId,
    domain_id: DomainId,
    join_code: String,
  ) -> impl Future<Output = Result<Domain, Self::Error>> + Send + '_;

  fn get_domain(
    &self,
    id: DomainId,
  ) -> impl Future<Output = Result<Option<Domain>, Self::Error>> + Send + '_;

  fn membership(
    &self,
    domain_id: DomainId,
    user_id: UserId,
  ) -> impl Future<Output = Result<Option<DomainMember>, Self::Error>> + Send + '_;

  /// Domains `user_id` belongs to in any role.
  fn list_member_domains(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Vec<Domain>, Self::Error>> + Send + '_;

  fn list_owned_domains(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Vec<Domain>, Self::Error>> + Send + '_;

  // ── Domain nodes ──────────────────────────────────────────────────────

  fn create_domain_node(
    &self,
    domain_id: DomainId,
    input: NewNode,
  ) -> impl Future<Output = Result<DomainNode, Self::Error>> + Send + '_;

  fn get_domain_node(
    &self,
    domain_id: DomainId,
    id: NodeId,
  ) -> impl Future<Output = Result<Option<DomainNode>, Self::Error>> + Send + '_;

  /// Resolve which domain a node belongs to, for authorization of routes
  /// that address a domain node by id alone.
  fn domain_of_node(
    &self,
    id: NodeId,
  ) -> impl Future<Output = Result<Option<DomainId>, Self::Error>> + Send + '_;

  fn list_domain_nodes(
    &self,
    domain_id: DomainId,
    parent: Option<NodeId>,
  ) -> impl Future<Output = Result<Vec<DomainNode>, Self::Error>> + Send + '_;

  fn update_domain_node(
    &self,
    domain_id: DomainId,
    id: NodeId,
    update: NodeUpdate,
  ) -> impl Future<Output = Result<DomainNode, Self::Error>> + Send + '_;

  fn delete_domain_node(
    &self,
    domain_id: DomainId,
    id: NodeId,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn move_domain_node(
    &self,
    domain_id: DomainId,
    id: NodeId,
    new_parent: Option<NodeId>,
  ) -> impl Future<Output = Result<DomainNode, Self::Error>> + Send + '_;

  // ── Publishing ────────────────────────────────────────────────────────

  /// Deep-copy a personal subtree into a domain tree in one transaction.
  ///
  /// Either the whole subtree is created or nothing is. Dropping the
  /// returned future before it resolves rolls the copy back.
  fn publish(
    &self,
    request: PublishRequest,
  ) -> impl Future<Output = Result<Published, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  /// Add a comment and bump the node's `comments_count` atomically.
  fn add_comment(
    &self,
    user_id: UserId,
    domain_node_id: NodeId,
    content: String,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// Comments on a domain node, newest first.
  fn list_comments(
    &self,
    domain_node_id: NodeId,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;
}
