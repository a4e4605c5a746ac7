//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure leaves the server as `{"error": <message>, "code": <code>}`
//! with a stable status per code.

use axum::{
  extract::{
    FromRequest, FromRequestParts,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use grove_core::{AsCoreError, Error as CoreError};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  PermissionDenied(String),

  #[error("authentication required")]
  Unauthorized,

  #[error("{0}")]
  BadRequest(String),

  #[error("{0}")]
  InvalidMove(String),

  #[error("{0}")]
  TreeTooDeep(String),

  #[error("{0}")]
  Conflict(String),

  #[error("request was cancelled before it completed")]
  Cancelled,

  #[error("storage unavailable")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error by its core cause; anything else is a storage
  /// fault.
  pub fn from_store<E>(e: E) -> Self
  where
    E: std::error::Error + AsCoreError + Send + Sync + 'static,
  {
    match e.as_core() {
      Some(core) => Self::from_core(core),
      None => ApiError::Store(Box::new(e)),
    }
  }

  fn from_core(e: &CoreError) -> Self {
    let message = e.to_string();
    match e {
      CoreError::NotFound(..) => ApiError::NotFound(message),
      CoreError::PermissionDenied(_) => ApiError::PermissionDenied(message),
      CoreError::Validation(_) => ApiError::BadRequest(message),
      CoreError::InvalidMove(_) => ApiError::InvalidMove(message),
      CoreError::TreeTooDeep(_) => ApiError::TreeTooDeep(message),
      CoreError::AlreadyMember { .. } | CoreError::UsernameTaken(_) => ApiError::Conflict(message),
      CoreError::Cancelled => ApiError::Cancelled,
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::PermissionDenied(_) => StatusCode::FORBIDDEN,
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::InvalidMove(_) | ApiError::TreeTooDeep(_) => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Cancelled | ApiError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
  }

  /// Machine-readable error code carried in the response body.
  pub fn code(&self) -> &'static str {
    match self {
      ApiError::NotFound(_) => "not_found",
      ApiError::PermissionDenied(_) => "permission_denied",
      ApiError::Unauthorized => "unauthorized",
      ApiError::BadRequest(_) => "validation",
      ApiError::InvalidMove(_) => "invalid_move",
      ApiError::TreeTooDeep(_) => "tree_too_deep",
      ApiError::Conflict(_) => "conflict",
      ApiError::Cancelled => "cancelled",
      ApiError::Store(_) => "storage",
    }
  }
}

impl From<CoreError> for ApiError {
  fn from(e: CoreError) -> Self { Self::from_core(&e) }
}

impl From<JsonRejection> for ApiError {
  fn from(r: JsonRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(r: PathRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(r: QueryRejection) -> Self { ApiError::BadRequest(r.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    if let ApiError::Store(e) = &self {
      tracing::error!(error = %e, "storage failure");
    }

    let status = self.status();
    let body = axum::Json(json!({ "error": self.to_string(), "code": self.code() }));
    let mut res = (status, body).into_response();
    if matches!(self, ApiError::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"grove\""),
      );
    }
    res
  }
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// [`axum::Json`] whose rejection is an [`ApiError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
  fn into_response(self) -> Response { axum::Json(self.0).into_response() }
}

/// [`axum::extract::Path`] whose rejection is an [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Path<T>(pub T);

/// [`axum::extract::Query`] whose rejection is an [`ApiError`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Query<T>(pub T);
