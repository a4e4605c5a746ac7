//! Error type for `grove-store-sqlite`.

use grove_core::AsCoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] grove_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value outside its enumerated set.
  #[error("unexpected {column} value: {value:?}")]
  Decode { column: &'static str, value: String },

  #[error("could not generate an unused join code")]
  JoinCodeExhausted,
}

impl AsCoreError for Error {
  fn as_core(&self) -> Option<&grove_core::Error> {
    match self {
      Error::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
