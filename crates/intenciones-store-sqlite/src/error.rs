//! Error type for `intenciones-store-sqlite`.

use intenciones_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A rejected request; the message is meant for the user.
  #[error(transparent)]
  Core(#[from] intenciones_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("corrupt row: {0}")]
  Decode(String),
}

impl StoreError for Error {
  fn domain(&self) -> Option<&intenciones_core::Error> {
    match self {
      Error::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
