//! HTTP Basic-auth extractor, credential verifier and registration.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::{FromRequestParts, State},
  http::{HeaderMap, StatusCode, header, request::Parts},
  response::IntoResponse,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use grove_core::{
  store::GroveStore,
  user::{User, validate_username},
};
use rand_core::OsRng;
use serde::Deserialize;

use crate::{
  AppState,
  error::{ApiError, Json},
};

/// Present in a handler's arguments when the request carried valid
/// credentials; holds the caller.
#[derive(Debug, Clone)]
pub struct Authenticated {
  pub user: User,
}

/// Split an `Authorization: Basic …` header into username and password.
pub fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds   = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok((username.to_owned(), password.to_owned()))
}

/// Check Basic credentials against the stored argon2 hash.
///
/// Unknown users and wrong passwords are indistinguishable to the caller.
pub async fn verify_auth<S: GroveStore>(headers: &HeaderMap, store: &S) -> Result<User, ApiError> {
  let (username, password) = basic_credentials(headers)?;

  let creds = store
    .find_credentials(username)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(ApiError::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&creds.password_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Ok(creds.user)
}

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: GroveStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let user = verify_auth(&parts.headers, state.store.as_ref()).await?;
    Ok(Authenticated { user })
  }
}

/// Hash a password into an argon2 PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| ApiError::Store(format!("argon2 error: {e}").into()))
}

// ─── Handlers ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub username: String,
  pub password: String,
}

/// `POST /register`, body: `{"username":"ana","password":"…"}`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GroveStore + Clone + 'static,
{
  let username = body.username.trim().to_owned();
  validate_username(&username)?;
  if body.password.is_empty() {
    return Err(ApiError::BadRequest("password cannot be empty".into()));
  }

  let hash = hash_password(&body.password)?;
  let user = state
    .store
    .create_user(username, hash)
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /me`
pub async fn me(auth: Authenticated) -> Json<User> { Json(auth.user) }
