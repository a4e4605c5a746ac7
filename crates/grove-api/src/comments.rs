//! Handlers for `/domain-nodes/{id}/comments`.
//!
//! Any member of the node's domain may read and add comments.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use grove_core::{
  domain::Comment,
  error::Entity,
  node::{DomainId, NodeId, UserId},
  store::GroveStore,
};
use serde::Deserialize;

use crate::{
  AppState,
  auth::Authenticated,
  domains::require_member,
  error::{ApiError, Json, Path},
};

/// Resolve the node's domain and check the caller belongs to it.
async fn member_domain<S: GroveStore>(
  store: &S,
  node_id: NodeId,
  user_id: UserId,
) -> Result<DomainId, ApiError> {
  let domain_id = store
    .domain_of_node(node_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(grove_core::Error::NotFound(Entity::DomainNode, node_id))?;
  require_member(store, domain_id, user_id).await?;
  Ok(domain_id)
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
  pub content: String,
}

/// `POST /domain-nodes/{id}/comments`, body: `{"content":"…"}`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(node_id): Path<NodeId>,
  Json(body): Json<CommentBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GroveStore + Clone + 'static,
{
  member_domain(state.store.as_ref(), node_id, auth.user.id).await?;
  let comment = state
    .store
    .add_comment(auth.user.id, node_id, body.content)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(comment)))
}

/// `GET /domain-nodes/{id}/comments`, newest first.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(node_id): Path<NodeId>,
) -> Result<Json<Vec<Comment>>, ApiError>
where
  S: GroveStore + Clone + 'static,
{
  member_domain(state.store.as_ref(), node_id, auth.user.id).await?;
  let comments = state
    .store
    .list_comments(node_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(comments))
}
