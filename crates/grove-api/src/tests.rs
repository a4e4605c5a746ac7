//! Router tests driving the full stack against an in-memory store.

use std::{path::PathBuf, sync::Arc};

use argon2::{Algorithm, Argon2, Params, PasswordHasher, Version, password_hash::SaltString};
use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use grove_core::store::GroveStore;
use grove_store_sqlite::SqliteStore;
use rand_core::OsRng;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use super::*;

const PASSWORD: &str = "correct horse";

/// Argon2 hash with minimum cost so each authenticated request stays fast.
fn cheap_hash(password: &str) -> String {
  let params = Params::new(Params::MIN_M_COST, 1, 1, None).unwrap();
  Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))
    .unwrap()
    .to_string()
}

/// A store with users `ana`, `bo` and `cy`, all sharing [`PASSWORD`].
async fn make_state() -> AppState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  for name in ["ana", "bo", "cy"] {
    store.create_user(name.into(), cheap_hash(PASSWORD)).await.unwrap();
  }

  AppState {
    store:  Arc::new(store),
    config: Arc::new(ServerConfig {
      host:           "127.0.0.1".to_string(),
      port:           8080,
      store_path:     PathBuf::from(":memory:"),
      max_tree_depth: DEFAULT_MAX_DEPTH,
    }),
  }
}

fn basic(user: &str, pass: &str) -> String {
  format!("Basic {}", B64.encode(format!("{user}:{pass}")))
}

async fn send(
  state:  &AppState<SqliteStore>,
  method: &str,
  uri:    &str,
  user:   Option<&str>,
  body:   Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(user) = user {
    builder = builder.header(header::AUTHORIZATION, basic(user, PASSWORD));
  }
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };

  let resp = router(state.clone()).oneshot(builder.body(body).unwrap()).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
  (status, json)
}

fn id(v: &Value) -> i64 { v["id"].as_i64().unwrap() }

async fn mkdir(state: &AppState<SqliteStore>, user: &str, parent: Option<i64>, title: &str) -> i64 {
  let (status, node) = send(
    state,
    "POST",
    "/nodes",
    Some(user),
    Some(json!({ "parent_id": parent, "node_type": "folder", "title": title })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{node}");
  id(&node)
}

// ── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_rejects_taken_names() {
  let state = make_state().await;
  let body = json!({ "username": "dee", "password": "pw" });

  let (status, user) = send(&state, "POST", "/register", None, Some(body.clone())).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(user["username"], "dee");
  assert!(user.get("password_hash").is_none());

  let (status, err) = send(&state, "POST", "/register", None, Some(body)).await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(err["code"], "conflict");
}

#[tokio::test]
async fn me_requires_valid_credentials() {
  let state = make_state().await;

  let (status, me) = send(&state, "GET", "/me", Some("ana"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(me["username"], "ana");

  let resp = router(state.clone())
    .oneshot(Request::builder().uri("/me").body(Body::empty()).unwrap())
    .await
    .unwrap();
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));

  let req = Request::builder()
    .uri("/me")
    .header(header::AUTHORIZATION, basic("ana", "wrong"))
    .body(Body::empty())
    .unwrap();
  let resp = router(state).oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ── Personal tree ───────────────────────────────────────────────────────────

#[tokio::test]
async fn personal_tree_moves() {
  let state = make_state().await;
  let projects = mkdir(&state, "ana", None, "Projects").await;
  let sub = mkdir(&state, "ana", Some(projects), "Sub").await;
  let (status, _) = send(
    &state,
    "POST",
    "/nodes",
    Some("ana"),
    Some(json!({ "parent_id": projects, "node_type": "text", "title": "todo", "content": "milk" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (_, children) = send(&state, "GET", &format!("/nodes?parent_id={projects}"), Some("ana"), None).await;
  let titles: Vec<_> = children.as_array().unwrap().iter().map(|n| n["title"].clone()).collect();
  assert_eq!(titles, [json!("Sub"), json!("todo")]);

  let uri = format!("/nodes/{projects}/move");
  let (status, err) = send(&state, "PUT", &uri, Some("ana"), Some(json!({ "new_parent_id": sub }))).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(err["code"], "invalid_move");

  let uri = format!("/nodes/{sub}/move");
  let (status, moved) = send(&state, "PUT", &uri, Some("ana"), Some(json!({ "new_parent_id": null }))).await;
  assert_eq!(status, StatusCode::OK);
  assert!(moved["parent_id"].is_null());

  let (_, roots) = send(&state, "GET", "/nodes?parent_id=null", Some("ana"), None).await;
  assert_eq!(roots.as_array().unwrap().len(), 2);
  let (_, zero) = send(&state, "GET", "/nodes?parent_id=0", Some("ana"), None).await;
  assert_eq!(zero, roots);

  let (_, found) = send(&state, "GET", "/nodes/search?q=milk", Some("ana"), None).await;
  assert_eq!(found[0]["title"], "todo");
}

#[tokio::test]
async fn personal_tree_rejections() {
  let state = make_state().await;
  let (_, note) = send(
    &state,
    "POST",
    "/nodes",
    Some("ana"),
    Some(json!({ "node_type": "text", "title": "leaf" })),
  )
  .await;
  let leaf = id(&note);

  let (status, err) = send(
    &state,
    "POST",
    "/nodes",
    Some("ana"),
    Some(json!({ "parent_id": leaf, "node_type": "text", "title": "child" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(err["code"], "validation");

  let (status, err) = send(&state, "GET", &format!("/nodes/{leaf}"), Some("bo"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(err["code"], "not_found");

  let (status, err) = send(&state, "POST", "/nodes", Some("ana"), Some(json!({ "title": 5 }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(err["code"], "validation");

  let (status, _) = send(&state, "GET", "/nodes?parent_id=abc", Some("ana"), None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(&state, "DELETE", &format!("/nodes/{leaf}"), Some("ana"), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = send(&state, "GET", &format!("/nodes/{leaf}"), Some("ana"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Domains, publishing and comments ────────────────────────────────────────

#[tokio::test]
async fn domain_roles_gate_publish_and_comments() {
  let state = make_state().await;

  let (status, domain) =
    send(&state, "POST", "/domains", Some("ana"), Some(json!({ "name": "Club" }))).await;
  assert_eq!(status, StatusCode::CREATED);
  let domain_id = id(&domain);
  let join = json!({ "domain_id": domain_id, "join_code": domain["join_code"] });

  let (status, _) = send(&state, "POST", "/domains/join", Some("bo"), Some(join.clone())).await;
  assert_eq!(status, StatusCode::OK);
  let (status, _) = send(&state, "POST", "/domains/join", Some("bo"), Some(join)).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let details = format!("/domains/{domain_id}/details");
  let (_, bos) = send(&state, "GET", &details, Some("bo"), None).await;
  assert_eq!(bos["role"], "member");
  let (status, err) = send(&state, "GET", &details, Some("cy"), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert_eq!(err["code"], "permission_denied");

  let (_, mine) = send(&state, "GET", "/domains/my", Some("bo"), None).await;
  assert_eq!(mine.as_array().unwrap().len(), 1);
  let (_, owned) = send(&state, "GET", "/domains/owned", Some("bo"), None).await;
  assert!(owned.as_array().unwrap().is_empty());

  // Publishing needs the manager role and the caller's own source.
  let notes = mkdir(&state, "ana", None, "Notes").await;
  mkdir(&state, "ana", Some(notes), "Inner").await;
  let publish = format!("/domains/{domain_id}/publish");
  let body = json!({ "source_node_id": notes });

  let (status, _) = send(&state, "POST", &publish, Some("bo"), Some(body.clone())).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, published) = send(&state, "POST", &publish, Some("ana"), Some(body)).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(published["node_count"], 2);
  assert_eq!(published["root"]["title"], "Notes");
  let root = id(&published["root"]);

  let (status, _) =
    send(&state, "POST", &publish, Some("ana"), Some(json!({ "source_node_id": 9_999 }))).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  // Members read and comment; outsiders do neither.
  let (_, listed) = send(&state, "GET", &format!("/domains/{domain_id}/nodes"), Some("bo"), None).await;
  assert_eq!(listed.as_array().unwrap().len(), 1);
  let roots_uri = format!("/domains/{domain_id}/nodes?parent_id=0");
  let (_, roots) = send(&state, "GET", &roots_uri, Some("bo"), None).await;
  assert_eq!(roots, listed);

  let comments = format!("/domain-nodes/{root}/comments");
  let (status, created) =
    send(&state, "POST", &comments, Some("bo"), Some(json!({ "content": "nice" }))).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["username"], "bo");
  let (status, _) =
    send(&state, "POST", &comments, Some("cy"), Some(json!({ "content": "hi" }))).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (_, thread) = send(&state, "GET", &comments, Some("ana"), None).await;
  assert_eq!(thread[0]["content"], "nice");
  assert_eq!(thread[0]["username"], "bo");
  let (_, listed) = send(&state, "GET", &format!("/domains/{domain_id}/nodes"), Some("bo"), None).await;
  assert_eq!(listed[0]["comments_count"], 1);

  // Only managers edit the shared tree.
  let node_uri = format!("/domains/{domain_id}/nodes/{root}");
  let (status, _) = send(&state, "DELETE", &node_uri, Some("bo"), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, _) = send(&state, "DELETE", &node_uri, Some("ana"), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = send(&state, "GET", &comments, Some("bo"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn domain_tree_move_maps_cycle_to_422() {
  let state = make_state().await;
  let (_, domain) = send(&state, "POST", "/domains", Some("ana"), Some(json!({ "name": "D" }))).await;
  let base = format!("/domains/{}/nodes", id(&domain));

  let (_, top) = send(
    &state,
    "POST",
    &base,
    Some("ana"),
    Some(json!({ "node_type": "folder", "title": "top" })),
  )
  .await;
  let (_, sub) = send(
    &state,
    "POST",
    &base,
    Some("ana"),
    Some(json!({ "parent_id": id(&top), "node_type": "folder", "title": "sub" })),
  )
  .await;

  let uri = format!("{base}/{}/move", id(&top));
  let (status, err) = send(&state, "PUT", &uri, Some("ana"), Some(json!({ "new_parent_id": id(&sub) }))).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(err["code"], "invalid_move");

  let (status, _) = send(&state, "GET", "/domains/9999/details", Some("ana"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}
