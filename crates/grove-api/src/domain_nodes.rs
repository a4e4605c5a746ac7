//! Handlers for a domain's shared tree, including publishing into it.
//!
//! Reads are open to every member; writes need the owner or an admin.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/domains/{domain_id}/nodes` | `?parent_id=<id>` |
//! | `POST`   | `/domains/{domain_id}/nodes` | Same body as `POST /nodes` |
//! | `PUT`    | `/domains/{domain_id}/nodes/{node_id}` | Title/content update |
//! | `DELETE` | `/domains/{domain_id}/nodes/{node_id}` | Removes the whole subtree |
//! | `PUT`    | `/domains/{domain_id}/nodes/{node_id}/move` | `{"new_parent_id":…}` |
//! | `POST`   | `/domains/{domain_id}/publish` | `{"source_node_id":…,"target_parent_id":…}` |

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use grove_core::{
  node::{DomainId, DomainNode, NewNode, NodeId, NodeUpdate},
  store::GroveStore,
  tree::PublishRequest,
};
use serde::Deserialize;

use crate::{
  AppState, ParentQuery,
  auth::Authenticated,
  domains::{require_manager, require_member},
  error::{ApiError, Json, Path, Query},
  nodes::MoveBody,
};

/// `GET /domains/{domain_id}/nodes[?parent_id=<id>]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(domain_id): Path<DomainId>,
  Query(params): Query<ParentQuery>,
) -> Result<Json<Vec<DomainNode>>, ApiError>
where
  S: GroveStore + Clone + 'static,
{
  require_member(state.store.as_ref(), domain_id, auth.user.id).await?;
  let nodes = state
    .store
    .list_domain_nodes(domain_id, params.parent()?)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(nodes))
}

/// `POST /domains/{domain_id}/nodes`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(domain_id): Path<DomainId>,
  Json(body): Json<NewNode>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GroveStore + Clone + 'static,
{
  require_manager(state.store.as_ref(), domain_id, auth.user.id).await?;
  let node = state
    .store
    .create_domain_node(domain_id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(node)))
}

/// `PUT /domains/{domain_id}/nodes/{node_id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path((domain_id, node_id)): Path<(DomainId, NodeId)>,
  Json(body): Json<NodeUpdate>,
) -> Result<Json<DomainNode>, ApiError>
where
  S: GroveStore + Clone + 'static,
{
  require_manager(state.store.as_ref(), domain_id, auth.user.id).await?;
  let node = state
    .store
    .update_domain_node(domain_id, node_id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(node))
}

/// `DELETE /domains/{domain_id}/nodes/{node_id}`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path((domain_id, node_id)): Path<(DomainId, NodeId)>,
) -> Result<StatusCode, ApiError>
where
  S: GroveStore + Clone + 'static,
{
  require_manager(state.store.as_ref(), domain_id, auth.user.id).await?;
  state
    .store
    .delete_domain_node(domain_id, node_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `PUT /domains/{domain_id}/nodes/{node_id}/move`
pub async fn move_one<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path((domain_id, node_id)): Path<(DomainId, NodeId)>,
  Json(body): Json<MoveBody>,
) -> Result<Json<DomainNode>, ApiError>
where
  S: GroveStore + Clone + 'static,
{
  require_manager(state.store.as_ref(), domain_id, auth.user.id).await?;
  let node = state
    .store
    .move_domain_node(domain_id, node_id, body.new_parent_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(node))
}

// ─── Publish ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PublishBody {
  pub source_node_id:   NodeId,
  /// Domain folder to attach the copy under; the domain root when absent.
  #[serde(default)]
  pub target_parent_id: Option<NodeId>,
}

/// `POST /domains/{domain_id}/publish`
///
/// Copies one of the caller's own subtrees. A source the caller does not own
/// is reported as not found.
pub async fn publish<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(domain_id): Path<DomainId>,
  Json(body): Json<PublishBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GroveStore + Clone + 'static,
{
  require_manager(state.store.as_ref(), domain_id, auth.user.id).await?;

  let request = PublishRequest {
    user_id: auth.user.id,
    source_node_id: body.source_node_id,
    domain_id,
    target_parent_id: body.target_parent_id,
  };
  let published = state.store.publish(request).await.map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(published)))
}
