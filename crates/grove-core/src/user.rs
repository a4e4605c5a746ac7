//! Users: the principals that own personal trees.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, node::UserId};

pub const MAX_USERNAME_LEN: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id:         UserId,
  pub username:   String,
  pub created_at: DateTime<Utc>,
}

/// A user together with the stored password hash, for credential checks.
#[derive(Debug, Clone)]
pub struct UserCredentials {
  pub user:          User,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

pub fn validate_username(username: &str) -> Result<()> {
  if username.trim().is_empty() || username.contains(':') {
    return Err(Error::Validation(
      "username must be non-empty and must not contain ':'".into(),
    ));
  }
  if username.chars().count() > MAX_USERNAME_LEN {
    return Err(Error::Validation(format!(
      "username is longer than {MAX_USERNAME_LEN} characters"
    )));
  }
  Ok(())
}
