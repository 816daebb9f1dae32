//! HTTP surface for the parish intention service.
//!
//! Exposes an axum [`Router`] serving the admin panel, the staff pages and
//! the CSV/PDF downloads, backed by any [`ParishStore`].

pub mod auth;
pub mod error;
pub mod flash;
pub mod handlers;
pub mod views;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use intenciones_core::store::ParishStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tower_sessions::{MemoryStore, SessionManagerLayer};

use handlers::{admin, funcionario, login};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `INTENCIONES_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                          String,
  pub port:                          u16,
  pub store_path:                    PathBuf,
  /// Mark the session cookie `Secure`; enable behind HTTPS.
  #[serde(default)]
  pub secure_cookies:                bool,
  #[serde(default = "default_admin_username")]
  pub bootstrap_admin_username:      String,
  /// argon2 PHC string for the first admin, used only on an empty database.
  #[serde(default)]
  pub bootstrap_admin_password_hash: Option<String>,
}

fn default_admin_username() -> String { "admin".to_owned() }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), config: Arc::clone(&self.config) }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the application [`Router`], sessions and request tracing included.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: ParishStore + 'static,
{
  let sessions = SessionManagerLayer::new(MemoryStore::default())
    .with_secure(state.config.secure_cookies);

  Router::new()
    .route("/",                                  get(login::index))
    .route("/login",                             get(login::form).post(login::submit::<S>))
    .route("/logout",                            get(login::logout))
    .route("/admin",                             get(admin::dashboard::<S>))
    .route("/admin/users/create",                post(admin::create_user::<S>))
    .route("/admin/users/toggle/{id}",           post(admin::toggle_user::<S>))
    .route("/admin/users/delete/{id}",           post(admin::delete_user::<S>))
    .route("/admin/users/password/{id}",         post(admin::set_password::<S>))
    .route("/admin/misas/create",                post(admin::create_mass::<S>))
    .route("/admin/misas/delete/{id}",           post(admin::delete_mass::<S>))
    .route("/admin/categorias/create",           post(admin::create_category::<S>))
    .route("/admin/categorias/edit/{id}",        post(admin::edit_category::<S>))
    .route("/admin/categorias/toggle/{id}",      post(admin::toggle_category::<S>))
    .route("/admin/categorias/delete/{id}",      post(admin::delete_category::<S>))
    .route("/admin/intencion_base/create",       post(admin::create_phrase::<S>))
    .route("/admin/intencion_base/toggle/{id}",  post(admin::toggle_phrase::<S>))
    .route("/admin/intencion_base/delete/{id}",  post(admin::delete_phrase::<S>))
    .route("/admin/settings/pdf_text",           post(admin::save_preface::<S>))
    .route("/admin/export_csv",                  post(admin::export_csv::<S>))
    .route("/admin/delete_range",                post(admin::delete_range::<S>))
    .route("/funcionario",                       get(funcionario::home::<S>))
    .route("/funcionario/registrar",             post(funcionario::register::<S>))
    .route(
      "/funcionario/editar/{id}",
      get(funcionario::edit_form::<S>).post(funcionario::edit_submit::<S>),
    )
    .route("/funcionario/export_csv",            post(funcionario::export_csv::<S>))
    .route("/funcionario/print_day",             post(funcionario::print_day::<S>))
    .layer(sessions)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
