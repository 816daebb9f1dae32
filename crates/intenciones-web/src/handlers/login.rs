//! Handlers for signing in and out.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/login` | Login form |
//! | `POST` | `/login` | Form: `username`, `password` |
//! | `GET`  | `/logout` | Flushes the session |
//! | `GET`  | `/` | Redirects by role |

use axum::{
  Form,
  extract::State,
  response::{Html, Redirect},
};
use intenciones_core::{store::ParishStore, user::Role};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
  AppState,
  auth::{RequestContext, sign_in, sign_out, verify_password},
  error::Error,
  flash::{self, Level},
  views,
};

/// `GET /login`
pub async fn form(session: Session) -> Result<Html<String>, Error> {
  let flashes = flash::take(&session).await?;
  Ok(views::login(&flashes))
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
  pub username: String,
  pub password: String,
}

/// `POST /login`
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  session: Session,
  Form(form): Form<LoginForm>,
) -> Result<Redirect, Error>
where
  S: ParishStore + 'static,
{
  let username = form.username.trim().to_owned();
  let credentials = state.store.find_login(username.clone()).await.map_err(Error::store)?;

  match credentials {
    Some(c) if c.user.active && verify_password(&form.password, &c.password_hash) => {
      sign_in(&session, &c.user).await?;
      tracing::info!(user = %c.user.username, role = %c.user.role, "signed in");
      Ok(Redirect::to("/"))
    }
    _ => {
      tracing::warn!(user = %username, "rejected login");
      flash::push(&session, Level::Error, "Usuario o contraseña incorrectos").await?;
      Ok(Redirect::to("/login"))
    }
  }
}

/// `GET /logout`
pub async fn logout(session: Session) -> Result<Redirect, Error> {
  sign_out(&session).await?;
  Ok(Redirect::to("/login"))
}

/// `GET /`
pub async fn index(ctx: RequestContext) -> Redirect {
  match ctx.user.role {
    Role::Admin => Redirect::to("/admin"),
    Role::Funcionario => Redirect::to("/funcionario"),
  }
}
