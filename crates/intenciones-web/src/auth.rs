//! Session login, the per-request user context and password hashing.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::{self, SaltString},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use intenciones_core::{
  Error as DomainError,
  store::{ParishStore, StoreError},
  user::{Role, User, UserId},
};
use rand_core::OsRng;
use tower_sessions::Session;

use crate::{
  AppState,
  error::{Error, rejection},
  flash::{self, Level},
};

const USER_KEY: &str = "user_id";

// ─── Passwords ────────────────────────────────────────────────────────────────

/// Produce an argon2 PHC string, e.g. `$argon2id$v=19$…`.
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// `false` for a wrong password and for a malformed stored hash alike.
pub fn verify_password(password: &str, hash: &str) -> bool {
  PasswordHash::new(hash)
    .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
    .is_ok()
}

// ─── Session ──────────────────────────────────────────────────────────────────

/// Bind `user` to the session under a fresh session id.
pub async fn sign_in(session: &Session, user: &User) -> Result<(), Error> {
  session.cycle_id().await?;
  session.insert(USER_KEY, user.id).await?;
  Ok(())
}

pub async fn sign_out(session: &Session) -> Result<(), Error> {
  session.flush().await?;
  Ok(())
}

pub async fn session_user(session: &Session) -> Result<Option<UserId>, Error> {
  Ok(session.get::<UserId>(USER_KEY).await?)
}

// ─── Request context ─────────────────────────────────────────────────────────

/// The signed-in user and their session, loaded fresh on every request.
///
/// Rejects with [`Error::Unauthenticated`] when the session carries no user
/// or the user has since been deactivated or deleted.
pub struct RequestContext {
  pub user:    User,
  pub session: Session,
}

impl<S> FromRequestParts<AppState<S>> for RequestContext
where
  S: ParishStore + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let session = Session::from_request_parts(parts, state)
      .await
      .map_err(|(_, msg)| Error::Internal(msg.to_owned()))?;

    let Some(user_id) = session_user(&session).await? else {
      return Err(Error::Unauthenticated);
    };

    match state.store.get_user(user_id).await.map_err(Error::store)? {
      Some(user) if user.active => Ok(RequestContext { user, session }),
      _ => {
        sign_out(&session).await?;
        Err(Error::Unauthenticated)
      }
    }
  }
}

impl RequestContext {
  /// Role guard; a mismatch is a plain `403 Acceso denegado`.
  pub fn require(&self, role: Role) -> Result<(), Error> {
    if self.user.role == role { Ok(()) } else { Err(Error::Forbidden("Acceso denegado")) }
  }

  pub async fn flash(&self, level: Level, message: impl Into<String>) -> Result<(), Error> {
    flash::push(&self.session, level, message).await?;
    Ok(())
  }

  /// Flash a rejected request's reason.
  pub async fn reject(&self, err: &DomainError) -> Result<(), Error> {
    tracing::debug!(user = %self.user.username, error = %err, "request rejected");
    self.flash(Level::Error, err.to_string()).await
  }

  /// Flash the outcome of a store mutation.
  ///
  /// Domain rejections are flashed; anything else propagates.
  pub async fn settle<T, E: StoreError>(
    &self,
    result: Result<T, E>,
    success: impl FnOnce(T) -> String,
  ) -> Result<(), Error> {
    match result {
      Ok(value) => self.flash(Level::Success, success(value)).await,
      Err(err) => self.reject(&rejection(err)?).await,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn password_hash_verifies() {
    let hash = hash_password("secreto").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("secreto", &hash));
    assert!(!verify_password("otro", &hash));
  }

  #[test]
  fn malformed_hash_never_verifies() {
    assert!(!verify_password("admin123", "admin123"));
  }
}
