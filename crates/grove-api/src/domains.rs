//! Handlers for domains and their membership.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/domains` | Body: `{"name":"…","description":"…"}` |
//! | `POST` | `/domains/join` | Body: `{"domain_id":1,"join_code":"…"}` |
//! | `GET`  | `/domains/my` | Every domain the caller belongs to |
//! | `GET`  | `/domains/owned` | Domains the caller created |
//! | `GET`  | `/domains/{domain_id}/details` | Members only |

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use grove_core::{
  domain::{Domain, DomainMember, NewDomain, Role},
  error::Entity,
  node::{DomainId, UserId},
  store::GroveStore,
};
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  auth::Authenticated,
  error::{ApiError, Json, Path},
};

// ─── Access checks ───────────────────────────────────────────────────────────

/// The caller's membership row, or 404 / 403 if the domain is missing or the
/// caller is not on its roster.
pub async fn require_member<S: GroveStore>(
  store: &S,
  domain_id: DomainId,
  user_id: UserId,
) -> Result<DomainMember, ApiError> {
  store
    .get_domain(domain_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(grove_core::Error::NotFound(Entity::Domain, domain_id))?;

  let member = store
    .membership(domain_id, user_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| {
      grove_core::Error::PermissionDenied(format!("not a member of domain {domain_id}"))
    })?;
  Ok(member)
}

/// Like [`require_member`], but only owners and admins pass.
pub async fn require_manager<S: GroveStore>(
  store: &S,
  domain_id: DomainId,
  user_id: UserId,
) -> Result<DomainMember, ApiError> {
  let member = require_member(store, domain_id, user_id).await?;
  if !member.role.can_manage() {
    tracing::debug!(domain = domain_id, user = user_id, "manager role required");
    return Err(
      grove_core::Error::PermissionDenied(format!(
        "only the owner or an admin may change domain {domain_id}"
      ))
      .into(),
    );
  }
  Ok(member)
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /domains`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Json(body): Json<NewDomain>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GroveStore + Clone + 'static,
{
  let domain = state
    .store
    .create_domain(auth.user.id, body)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(domain)))
}

// ─── Join ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct JoinBody {
  pub domain_id: DomainId,
  pub join_code: String,
}

/// `POST /domains/join`
pub async fn join<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Json(body): Json<JoinBody>,
) -> Result<Json<Domain>, ApiError>
where
  S: GroveStore + Clone + 'static,
{
  let domain = state
    .store
    .join_domain(auth.user.id, body.domain_id, body.join_code)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(domain))
}

// ─── Listings ────────────────────────────────────────────────────────────────

/// `GET /domains/my`
pub async fn mine<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
) -> Result<Json<Vec<Domain>>, ApiError>
where
  S: GroveStore + Clone + 'static,
{
  let domains = state
    .store
    .list_member_domains(auth.user.id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(domains))
}

/// `GET /domains/owned`
pub async fn owned<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
) -> Result<Json<Vec<Domain>>, ApiError>
where
  S: GroveStore + Clone + 'static,
{
  let domains = state
    .store
    .list_owned_domains(auth.user.id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(domains))
}

// ─── Details ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct DomainDetails {
  pub domain: Domain,
  pub role:   Role,
}

/// `GET /domains/{domain_id}/details`
pub async fn details<S>(
  State(state): State<AppState<S>>,
  auth: Authenticated,
  Path(domain_id): Path<DomainId>,
) -> Result<Json<DomainDetails>, ApiError>
where
  S: GroveStore + Clone + 'static,
{
  let member = require_member(state.store.as_ref(), domain_id, auth.user.id).await?;
  let domain = state
    .store
    .get_domain(domain_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(grove_core::Error::NotFound(Entity::Domain, domain_id))?;
  Ok(Json(DomainDetails { domain, role: member.role }))
}
