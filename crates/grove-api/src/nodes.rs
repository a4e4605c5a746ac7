//! Handlers for the caller's personal tree.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/nodes` | `?parent_id=<id>`; roots when absent |
//! | `POST`   | `/nodes` | Body: `{"node_type":"folder","title":"…"}` |
//! | `GET`    | `/nodes/search` | `?q=<text>` |
//! | `GET`    | `/nodes/{id}` | 404 if not the caller's |
//! | `PUT`    | `/nodes/{id}` | Body: `{"title":"…","content":"…"}`, both optional |
//! | `DELETE` | `/nodes/{id}` | Removes the whole subtree |
//! | `PUT`    | `/nodes/{id}/move` | Body: `{"new_parent_id":<id or null>}` |

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use grove_core::{
  error::Entity,
  node::{NewNode, Node, NodeId, NodeUpdate},
  store::GroveStore,
};
use serde::Deserialize;

use crate::{
  AppState, ParentQuery,
  auth::Authenticated,
  error::{ApiError, Json, Path, Query},
};

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /nodes[?parent_id=<id>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Query(params): Query<ParentQuery>,
) -> Result<Json<Vec<Node>>, ApiError>
where
  S: GroveStore + Clone + 'static,
{
  let nodes = state
    .store
    .list_nodes(auth.user.id, params.parent()?)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(nodes))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /nodes`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Json(body): Json<NewNode>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GroveStore + Clone + 'static,
{
  let node = state
    .store
    .create_node(auth.user.id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(node)))
}

// ─── Search ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchParams {
  pub q: String,
}

/// `GET /nodes/search?q=<text>`
pub async fn search<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Node>>, ApiError>
where
  S: GroveStore + Clone + 'static,
{
  let nodes = state
    .store
    .search_nodes(auth.user.id, params.q)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(nodes))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /nodes/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<NodeId>,
) -> Result<Json<Node>, ApiError>
where
  S: GroveStore + Clone + 'static,
{
  let node = state
    .store
    .get_node(auth.user.id, id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| grove_core::Error::NotFound(Entity::Node, id))?;
  Ok(Json(node))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PUT /nodes/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<NodeId>,
  Json(body): Json<NodeUpdate>,
) -> Result<Json<Node>, ApiError>
where
  S: GroveStore + Clone + 'static,
{
  let node = state
    .store
    .update_node(auth.user.id, id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(node))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /nodes/{id}`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<NodeId>,
) -> Result<StatusCode, ApiError>
where
  S: GroveStore + Clone + 'static,
{
  state
    .store
    .delete_node(auth.user.id, id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Move ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MoveBody {
  /// Target folder; `null` or absent moves the node to the root.
  #[serde(default)]
  pub new_parent_id: Option<NodeId>,
}

/// `PUT /nodes/{id}/move`
pub async fn move_one<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(id): Path<NodeId>,
  Json(body): Json<MoveBody>,
) -> Result<Json<Node>, ApiError>
where
  S: GroveStore + Clone + 'static,
{
  let node = state
    .store
    .move_node(auth.user.id, id, body.new_parent_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(node))
}
