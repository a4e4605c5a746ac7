//! [`SqliteStore`], the SQLite implementation of [`GroveStore`].

use std::path::Path;

use grove_core::{
  domain::{Comment, Domain, DomainMember, NewDomain, Published, Role, validate_comment},
  error::Entity,
  node::{DomainId, DomainNode, NewNode, Node, NodeId, NodeUpdate, Scope, UserId},
  store::GroveStore,
  tree::{self, PublishRequest, TreeLimits},
  user::{User, UserCredentials, validate_username},
};
use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use tokio_util::sync::CancellationToken;

use crate::{
  Error, Result,
  encode::{encode_role, now},
  join_code, queries,
  schema::SCHEMA,
  tx::SqliteTreeTx,
};

/// Attempts at drawing an unused join code before giving up.
const JOIN_CODE_ATTEMPTS: usize = 8;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Grove store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All work is
/// funnelled through that one connection, so `BEGIN IMMEDIATE` transactions
/// never interleave.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
  limits:          TreeLimits,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, limits: TreeLimits::default() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, limits: TreeLimits::default() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Replace the depth bound applied to ancestry walks and publishes.
  pub fn with_limits(mut self, limits: TreeLimits) -> Self {
    self.limits = limits;
    self
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `op` against the connection outside any explicit transaction.
  async fn read<T, F>(&self, op: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(op(conn))).await?
  }

  /// Run `op` inside one `BEGIN IMMEDIATE` transaction.
  ///
  /// The transaction commits only if `op` returns `Ok` and the calling future
  /// is still alive; otherwise it is dropped, which rolls it back.
  async fn write<T, F>(&self, op: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Transaction<'_>, &CancellationToken) -> Result<T> + Send + 'static,
  {
    let cancel = CancellationToken::new();
    let _rollback_on_drop = cancel.clone().drop_guard();
    self.write_with(cancel, op).await
  }

  /// [`Self::write`] with a caller-supplied cancellation token.
  async fn write_with<T, F>(&self, cancel: CancellationToken, op: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Transaction<'_>, &CancellationToken) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let outcome = op(&tx, &cancel).and_then(|value| {
          tree::check(&cancel)?;
          Ok(value)
        });
        match outcome {
          Ok(value) => {
            tx.commit()?;
            Ok(Ok(value))
          }
          Err(e) => Ok(Err(e)),
        }
      })
      .await?
  }

  /// Publish with an externally controlled cancellation token.
  ///
  /// Cancelling `cancel` before the copy commits rolls the whole copy back and
  /// fails with [`grove_core::Error::Cancelled`].
  pub async fn publish_cancellable(
    &self,
    request: PublishRequest,
    cancel: CancellationToken,
  ) -> Result<Published> {
    let limits = self.limits;
    let published = self
      .write_with(cancel, move |tx, cancel| {
        queries::domain(tx, request.domain_id)?
          .ok_or(grove_core::Error::NotFound(Entity::Domain, request.domain_id))?;

        let receipt = tree::publish(&SqliteTreeTx::new(tx), &request, limits, cancel)?;
        let root = queries::domain_node(tx, request.domain_id, receipt.root_id)?
          .ok_or(grove_core::Error::NotFound(Entity::DomainNode, receipt.root_id))?;
        Ok(Published { root, node_count: receipt.node_count })
      })
      .await
      .inspect_err(|e| {
        tracing::warn!(
          source = request.source_node_id,
          domain = request.domain_id,
          error = %e,
          "publish rolled back"
        )
      })?;

    tracing::info!(
      source = request.source_node_id,
      domain = request.domain_id,
      root = published.root.id,
      nodes = published.node_count,
      "published subtree"
    );
    Ok(published)
  }
}

fn fetch_node(conn: &Connection, user_id: UserId, id: NodeId) -> Result<Node> {
  queries::node(conn, user_id, id)?.ok_or_else(|| Scope::User(user_id).not_found(id).into())
}

fn fetch_domain_node(conn: &Connection, domain_id: DomainId, id: NodeId) -> Result<DomainNode> {
  queries::domain_node(conn, domain_id, id)?
    .ok_or_else(|| Scope::Domain(domain_id).not_found(id).into())
}

fn fetch_domain(conn: &Connection, id: DomainId) -> Result<Domain> {
  queries::domain(conn, id)?.ok_or_else(|| grove_core::Error::NotFound(Entity::Domain, id).into())
}

fn require_domain(conn: &Connection, id: DomainId) -> Result<()> {
  fetch_domain(conn, id).map(drop)
}

fn insert_member(conn: &Connection, domain_id: DomainId, user_id: UserId, role: Role) -> Result<()> {
  conn.execute(
    "INSERT INTO domain_members (domain_id, user_id, role, joined_at) VALUES (?1, ?2, ?3, ?4)",
    params![domain_id, user_id, encode_role(role), now()],
  )?;
  Ok(())
}

// ─── GroveStore impl ─────────────────────────────────────────────────────────

impl GroveStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, username: String, password_hash: String) -> Result<User> {
    validate_username(&username)?;
    let user = self
      .write(move |tx, _| {
        if queries::credentials(tx, &username)?.is_some() {
          return Err(grove_core::Error::UsernameTaken(username).into());
        }
        tx.execute(
          "INSERT INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
          params![username, password_hash, now()],
        )?;
        let id = tx.last_insert_rowid();
        queries::user(tx, id)?.ok_or_else(|| grove_core::Error::NotFound(Entity::User, id).into())
      })
      .await?;
    tracing::info!(user = user.id, username = %user.username, "registered user");
    Ok(user)
  }

  async fn find_credentials(&self, username: String) -> Result<Option<UserCredentials>> {
    self.read(move |conn| queries::credentials(conn, &username)).await
  }

  // ── Personal nodes ────────────────────────────────────────────────────────

  async fn create_node(&self, user_id: UserId, input: NewNode) -> Result<Node> {
    self
      .write(move |tx, _| {
        let id = tree::create_node(&SqliteTreeTx::new(tx), Scope::User(user_id), input)?;
        fetch_node(tx, user_id, id)
      })
      .await
  }

  async fn get_node(&self, user_id: UserId, id: NodeId) -> Result<Option<Node>> {
    self.read(move |conn| queries::node(conn, user_id, id)).await
  }

  async fn list_nodes(&self, user_id: UserId, parent: Option<NodeId>) -> Result<Vec<Node>> {
    self.read(move |conn| queries::nodes_under(conn, user_id, parent)).await
  }

  async fn update_node(&self, user_id: UserId, id: NodeId, update: NodeUpdate) -> Result<Node> {
    self
      .write(move |tx, _| {
        tree::update_node(&SqliteTreeTx::new(tx), Scope::User(user_id), id, &update)?;
        fetch_node(tx, user_id, id)
      })
      .await
  }

  async fn delete_node(&self, user_id: UserId, id: NodeId) -> Result<usize> {
    let removed = self
      .write(move |tx, _| tree::delete_node(&SqliteTreeTx::new(tx), Scope::User(user_id), id))
      .await?;
    tracing::debug!(user = user_id, node = id, removed, "deleted node");
    Ok(removed)
  }

  async fn search_nodes(&self, user_id: UserId, query: String) -> Result<Vec<Node>> {
    let needle = query.trim().to_owned();
    if needle.is_empty() {
      return Err(grove_core::Error::Validation("search query cannot be empty".into()).into());
    }
    self.read(move |conn| queries::search_nodes(conn, user_id, &needle)).await
  }

  async fn move_node(&self, user_id: UserId, id: NodeId, new_parent: Option<NodeId>) -> Result<Node> {
    let limits = self.limits;
    let node = self
      .write(move |tx, _| {
        tree::move_node(&SqliteTreeTx::new(tx), Scope::User(user_id), id, new_parent, limits)?;
        fetch_node(tx, user_id, id)
      })
      .await
      .inspect_err(|e| tracing::debug!(user = user_id, node = id, error = %e, "move refused"))?;
    tracing::info!(user = user_id, node = id, parent = ?new_parent, "moved node");
    Ok(node)
  }

  // ── Domains ───────────────────────────────────────────────────────────────

  async fn create_domain(&self, owner_id: UserId, input: NewDomain) -> Result<Domain> {
    input.validate()?;
    let domain = self
      .write(move |tx, _| {
        let mut code = join_code::generate();
        let mut attempts = 1;
        while queries::join_code_taken(tx, &code)? {
          if attempts == JOIN_CODE_ATTEMPTS {
            return Err(Error::JoinCodeExhausted);
          }
          code = join_code::generate();
          attempts += 1;
        }

        tx.execute(
          "INSERT INTO domains (owner_id, name, description, join_code, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![owner_id, input.name.trim(), input.description, code, now()],
        )?;
        let id = tx.last_insert_rowid();
        insert_member(tx, id, owner_id, Role::Owner)?;
        fetch_domain(tx, id)
      })
      .await?;
    tracing::info!(domain = domain.id, owner = owner_id, "created domain");
    Ok(domain)
  }

  async fn join_domain(&self, user_id: UserId, domain_id: DomainId, join_code: String) -> Result<Domain> {
    let domain = self
      .write(move |tx, _| {
        let domain = queries::domain_with_code(tx, domain_id, join_code.trim())?
          .ok_or(grove_core::Error::NotFound(Entity::Domain, domain_id))?;
        if queries::member(tx, domain_id, user_id)?.is_some() {
          return Err(grove_core::Error::AlreadyMember { domain_id, user_id }.into());
        }
        insert_member(tx, domain_id, user_id, Role::Member)?;
        Ok(domain)
      })
      .await?;
    tracing::info!(domain = domain_id, user = user_id, "joined domain");
    Ok(domain)
  }

  async fn get_domain(&self, id: DomainId) -> Result<Option<Domain>> {
    self.read(move |conn| queries::domain(conn, id)).await
  }

  async fn membership(&self, domain_id: DomainId, user_id: UserId) -> Result<Option<DomainMember>> {
    self.read(move |conn| queries::member(conn, domain_id, user_id)).await
  }

  async fn list_member_domains(&self, user_id: UserId) -> Result<Vec<Domain>> {
    self.read(move |conn| queries::member_domains(conn, user_id)).await
  }

  async fn list_owned_domains(&self, user_id: UserId) -> Result<Vec<Domain>> {
    self.read(move |conn| queries::owned_domains(conn, user_id)).await
  }

  // ── Domain nodes ──────────────────────────────────────────────────────────

  async fn create_domain_node(&self, domain_id: DomainId, input: NewNode) -> Result<DomainNode> {
    self
      .write(move |tx, _| {
        require_domain(tx, domain_id)?;
        let id = tree::create_node(&SqliteTreeTx::new(tx), Scope::Domain(domain_id), input)?;
        fetch_domain_node(tx, domain_id, id)
      })
      .await
  }

  async fn get_domain_node(&self, domain_id: DomainId, id: NodeId) -> Result<Option<DomainNode>> {
    self.read(move |conn| queries::domain_node(conn, domain_id, id)).await
  }

  async fn domain_of_node(&self, id: NodeId) -> Result<Option<DomainId>> {
    self.read(move |conn| queries::domain_of_node(conn, id)).await
  }

  async fn list_domain_nodes(&self, domain_id: DomainId, parent: Option<NodeId>) -> Result<Vec<DomainNode>> {
    self.read(move |conn| queries::domain_nodes_under(conn, domain_id, parent)).await
  }

  async fn update_domain_node(&self, domain_id: DomainId, id: NodeId, update: NodeUpdate) -> Result<DomainNode> {
    self
      .write(move |tx, _| {
        tree::update_node(&SqliteTreeTx::new(tx), Scope::Domain(domain_id), id, &update)?;
        fetch_domain_node(tx, domain_id, id)
      })
      .await
  }

  async fn delete_domain_node(&self, domain_id: DomainId, id: NodeId) -> Result<usize> {
    let removed = self
      .write(move |tx, _| tree::delete_node(&SqliteTreeTx::new(tx), Scope::Domain(domain_id), id))
      .await?;
    tracing::debug!(domain = domain_id, node = id, removed, "deleted domain node");
    Ok(removed)
  }

  async fn move_domain_node(
    &self,
    domain_id: DomainId,
    id: NodeId,
    new_parent: Option<NodeId>,
  ) -> Result<DomainNode> {
    let limits = self.limits;
    let node = self
      .write(move |tx, _| {
        tree::move_node(&SqliteTreeTx::new(tx), Scope::Domain(domain_id), id, new_parent, limits)?;
        fetch_domain_node(tx, domain_id, id)
      })
      .await
      .inspect_err(|e| tracing::debug!(domain = domain_id, node = id, error = %e, "move refused"))?;
    tracing::info!(domain = domain_id, node = id, parent = ?new_parent, "moved domain node");
    Ok(node)
  }

  // ── Publishing ────────────────────────────────────────────────────────────

  async fn publish(&self, request: PublishRequest) -> Result<Published> {
    let cancel = CancellationToken::new();
    let _rollback_on_drop = cancel.clone().drop_guard();
    self.publish_cancellable(request, cancel).await
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn add_comment(&self, user_id: UserId, domain_node_id: NodeId, content: String) -> Result<Comment> {
    validate_comment(&content)?;
    self
      .write(move |tx, _| {
        let bumped = tx.execute(
          "UPDATE domain_nodes SET comments_count = comments_count + 1
           WHERE id = ?1 AND deleted_at IS NULL",
          params![domain_node_id],
        )?;
        if bumped == 0 {
          return Err(grove_core::Error::NotFound(Entity::DomainNode, domain_node_id).into());
        }
        tx.execute(
          "INSERT INTO domain_node_comments (domain_node_id, user_id, content, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          params![domain_node_id, user_id, content, now()],
        )?;
        let id = tx.last_insert_rowid();
        queries::comment(tx, id)?.ok_or_else(|| grove_core::Error::NotFound(Entity::DomainNode, id).into())
      })
      .await
  }

  async fn list_comments(&self, domain_node_id: NodeId) -> Result<Vec<Comment>> {
    self
      .read(move |conn| {
        if queries::domain_of_node(conn, domain_node_id)?.is_none() {
          return Err(grove_core::Error::NotFound(Entity::DomainNode, domain_node_id).into());
        }
        queries::comments(conn, domain_node_id)
      })
      .await
  }
}
