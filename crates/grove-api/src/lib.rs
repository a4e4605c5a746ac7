//! JSON REST API for Grove.
//!
//! Exposes an axum [`Router`] backed by any [`GroveStore`]. Callers
//! authenticate with HTTP Basic credentials checked against the user table.
//! Identity and domain roles are resolved here before any store call, so the
//! store only ever sees verified `(user, domain)` pairs.

pub mod auth;
pub mod comments;
pub mod domain_nodes;
pub mod domains;
pub mod error;
pub mod nodes;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post, put},
};
use grove_core::{
  node::NodeId,
  store::GroveStore,
  tree::{DEFAULT_MAX_DEPTH, TreeLimits},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `GROVE_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:           String,
  pub port:           u16,
  pub store_path:     PathBuf,
  /// Bound on ancestry walks and on the nesting of a published subtree.
  #[serde(default = "default_max_tree_depth")]
  pub max_tree_depth: usize,
}

fn default_max_tree_depth() -> usize { DEFAULT_MAX_DEPTH }

impl ServerConfig {
  pub fn tree_limits(&self) -> TreeLimits { TreeLimits { max_depth: self.max_tree_depth } }
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: GroveStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: GroveStore + Clone + 'static,
{
  Router::new()
    // Accounts
    .route("/register",                              post(auth::register::<S>))
    .route("/me",                                    get(auth::me))
    // Personal tree
    .route("/nodes",                                 get(nodes::list::<S>).post(nodes::create::<S>))
    .route("/nodes/search",                          get(nodes::search::<S>))
    .route(
      "/nodes/{id}",
      get(nodes::get_one::<S>).put(nodes::update::<S>).delete(nodes::remove::<S>),
    )
    .route("/nodes/{id}/move",                       put(nodes::move_one::<S>))
    // Domains
    .route("/domains",                               post(domains::create::<S>))
    .route("/domains/join",                          post(domains::join::<S>))
    .route("/domains/my",                            get(domains::mine::<S>))
    .route("/domains/owned",                         get(domains::owned::<S>))
    .route("/domains/{domain_id}/details",           get(domains::details::<S>))
    // Domain tree
    .route(
      "/domains/{domain_id}/nodes",
      get(domain_nodes::list::<S>).post(domain_nodes::create::<S>),
    )
    .route(
      "/domains/{domain_id}/nodes/{node_id}",
      put(domain_nodes::update::<S>).delete(domain_nodes::remove::<S>),
    )
    .route("/domains/{domain_id}/nodes/{node_id}/move", put(domain_nodes::move_one::<S>))
    .route("/domains/{domain_id}/publish",           post(domain_nodes::publish::<S>))
    // Comments
    .route(
      "/domain-nodes/{id}/comments",
      get(comments::list::<S>).post(comments::create::<S>),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Query helpers ───────────────────────────────────────────────────────────

/// `?parent_id=` as accepted by the listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ParentQuery {
  pub parent_id: Option<String>,
}

impl ParentQuery {
  /// Absent, empty, `null` and `0` all select the roots.
  pub fn parent(&self) -> Result<Option<NodeId>, ApiError> {
    match self.parent_id.as_deref().map(str::trim) {
      None | Some("") | Some("null") | Some("0") => Ok(None),
      Some(raw) => raw
        .parse()
        .map(Some)
        .map_err(|_| ApiError::BadRequest(format!("invalid parent_id: {raw:?}"))),
    }
  }
}

#[cfg(test)]
mod tests;
