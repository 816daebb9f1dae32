//! Error types and axum `IntoResponse` implementation.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Redirect, Response},
};
use intenciones_core::{Error as DomainError, store::StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// No signed-in, active user behind the session.
  #[error("unauthenticated")]
  Unauthenticated,
  #[error("{0}")]
  Forbidden(&'static str),
  #[error("No encontrado")]
  NotFound,
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("session error: {0}")]
  Session(#[from] tower_sessions::session::Error),
  #[error("report error: {0}")]
  Report(#[from] intenciones_report::Error),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("{0}")]
  Internal(String),
}

impl Error {
  pub fn store<E: StoreError>(err: E) -> Self { Error::Store(Box::new(err)) }
}

/// Separate a store failure the user can act on from one they cannot.
///
/// Domain rejections come back as `Ok` so the handler can flash them;
/// ownership violations and infrastructure failures become `Err`.
pub fn rejection<E: StoreError>(err: E) -> Result<DomainError, Error> {
  match err.domain() {
    Some(domain) if domain.is_forbidden() => Err(Error::Forbidden("No autorizado")),
    Some(domain) => Ok(domain.clone()),
    None => Err(Error::store(err)),
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthenticated => Redirect::to("/login").into_response(),
      Error::Forbidden(msg) => (StatusCode::FORBIDDEN, msg).into_response(),
      Error::NotFound => (StatusCode::NOT_FOUND, "No encontrado").into_response(),
      Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
      other => {
        tracing::error!(error = %other, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()).into_response()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::header;

  #[test]
  fn unauthenticated_redirects_to_login() {
    let resp = Error::Unauthenticated.into_response();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/login");
  }

  #[test]
  fn ownership_violation_is_forbidden() {
    let err = rejection(intenciones_store_sqlite::Error::from(DomainError::NotOwner)).unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
  }

  #[test]
  fn domain_rejections_are_returned_for_flashing() {
    let domain = rejection(intenciones_store_sqlite::Error::from(DomainError::LastActiveAdmin));
    assert_eq!(domain.unwrap(), DomainError::LastActiveAdmin);
  }
}
