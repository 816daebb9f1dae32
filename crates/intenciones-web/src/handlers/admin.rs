//! Handlers for the administration panel under `/admin`.
//!
//! Every handler requires [`Role::Admin`]. Mutations answer with a flash
//! message and a redirect back to the dashboard.

use axum::{
  Form,
  extract::{Path, State},
  response::{Html, IntoResponse, Redirect, Response},
};
use intenciones_core::{
  category::{CategoryId, NewCategory},
  intention::IntentionScope,
  mass::{MassId, NewMass, parse_date},
  phrase::PhraseId,
  setting::Setting,
  store::ParishStore,
  user::{NewUser, Role, UserId},
};
use intenciones_report::{CsvColumns, export_csv as write_csv};
use serde::Deserialize;

use crate::{
  AppState,
  auth::{RequestContext, hash_password},
  error::Error,
  flash,
  handlers::attachment,
  views::{self, AdminPage},
};

fn back() -> Redirect { Redirect::to("/admin") }

fn hash(password: &str) -> Result<String, Error> {
  hash_password(password).map_err(|e| Error::Internal(format!("argon2 error: {e}")))
}

// ─── Dashboard ────────────────────────────────────────────────────────────────

/// `GET /admin`
pub async fn dashboard<S>(
  ctx: RequestContext,
  State(state): State<AppState<S>>,
) -> Result<Html<String>, Error>
where
  S: ParishStore + 'static,
{
  ctx.require(Role::Admin)?;
  let store = &state.store;

  let users = store.list_users().await.map_err(Error::store)?;
  let masses = store.list_masses().await.map_err(Error::store)?;
  let categories = store.list_categories(false).await.map_err(Error::store)?;
  let phrases = store.list_phrases(false).await.map_err(Error::store)?;
  let preface = store.get_setting(Setting::PdfPreface).await.map_err(Error::store)?;
  let last_deletion = store.get_setting(Setting::LastDeletion).await.map_err(Error::store)?;
  let flashes = flash::take(&ctx.session).await?;

  Ok(views::admin(&AdminPage {
    user:          &ctx.user,
    flashes:       &flashes,
    users:         &users,
    masses:        &masses,
    categories:    &categories,
    phrases:       &phrases,
    preface:       preface.as_deref().unwrap_or_default(),
    last_deletion: last_deletion.as_deref(),
  }))
}

// ─── Users ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UserForm {
  pub username: String,
  pub password: String,
  pub role:     String,
}

/// `POST /admin/users/create`
pub async fn create_user<S>(
  ctx: RequestContext,
  State(state): State<AppState<S>>,
  Form(form): Form<UserForm>,
) -> Result<Redirect, Error>
where
  S: ParishStore + 'static,
{
  ctx.require(Role::Admin)?;

  let role: Role = match form.role.parse() {
    Ok(role) => role,
    Err(e) => {
      ctx.reject(&e).await?;
      return Ok(back());
    }
  };
  let password_hash = if form.password.is_empty() { String::new() } else { hash(&form.password)? };

  let result = state
    .store
    .create_user(NewUser { username: form.username, password_hash, role })
    .await;
  ctx.settle(result, |u| format!("Usuario {} creado.", u.username)).await?;
  Ok(back())
}

/// `POST /admin/users/toggle/{id}`
pub async fn toggle_user<S>(
  ctx: RequestContext,
  State(state): State<AppState<S>>,
  Path(id): Path<UserId>,
) -> Result<Redirect, Error>
where
  S: ParishStore + 'static,
{
  ctx.require(Role::Admin)?;
  let result = state.store.toggle_user(ctx.user.id, id).await;
  ctx
    .settle(result, |u| {
      let label = if u.active { "activado" } else { "inactivado" };
      format!("Usuario {} {label}.", u.username)
    })
    .await?;
  Ok(back())
}

/// `POST /admin/users/delete/{id}`
pub async fn delete_user<S>(
  ctx: RequestContext,
  State(state): State<AppState<S>>,
  Path(id): Path<UserId>,
) -> Result<Redirect, Error>
where
  S: ParishStore + 'static,
{
  ctx.require(Role::Admin)?;
  let result = state.store.delete_user(ctx.user.id, id).await;
  ctx.settle(result, |()| "Usuario eliminado correctamente.".to_owned()).await?;
  Ok(back())
}

#[derive(Debug, Deserialize)]
pub struct PasswordForm {
  pub password: String,
}

/// `POST /admin/users/password/{id}`
pub async fn set_password<S>(
  ctx: RequestContext,
  State(state): State<AppState<S>>,
  Path(id): Path<UserId>,
  Form(form): Form<PasswordForm>,
) -> Result<Redirect, Error>
where
  S: ParishStore + 'static,
{
  ctx.require(Role::Admin)?;
  let password_hash = if form.password.is_empty() { String::new() } else { hash(&form.password)? };
  let result = state.store.set_password(id, password_hash).await;
  ctx.settle(result, |()| "Contraseña actualizada.".to_owned()).await?;
  Ok(back())
}

// ─── Masses ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MassForm {
  pub fecha: String,
  pub hora:  String,
  pub ampm:  String,
}

/// `POST /admin/misas/create`
pub async fn create_mass<S>(
  ctx: RequestContext,
  State(state): State<AppState<S>>,
  Form(form): Form<MassForm>,
) -> Result<Redirect, Error>
where
  S: ParishStore + 'static,
{
  ctx.require(Role::Admin)?;
  match NewMass::parse(&form.fecha, &form.hora, &form.ampm) {
    Ok(mass) => {
      let result = state.store.create_mass(mass).await;
      ctx.settle(result, |m| format!("Misa creada: {} {}.", m.date, m.time_label())).await?;
    }
    Err(e) => ctx.reject(&e).await?,
  }
  Ok(back())
}

/// `POST /admin/misas/delete/{id}`
pub async fn delete_mass<S>(
  ctx: RequestContext,
  State(state): State<AppState<S>>,
  Path(id): Path<MassId>,
) -> Result<Redirect, Error>
where
  S: ParishStore + 'static,
{
  ctx.require(Role::Admin)?;
  let result = state.store.delete_mass(id).await;
  ctx.settle(result, |()| "Misa eliminada.".to_owned()).await?;
  Ok(back())
}

// ─── Categories ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CategoryForm {
  pub nombre:          String,
  #[serde(default)]
  pub descripcion:     String,
  #[serde(default)]
  pub texto_adicional: String,
  #[serde(default)]
  pub orden:           String,
}

impl CategoryForm {
  fn into_input(self) -> Result<NewCategory, intenciones_core::Error> {
    let orden = self.orden.trim();
    let display_order = if orden.is_empty() {
      0
    } else {
      orden.parse().map_err(|_| intenciones_core::Error::MissingField("orden"))?
    };
    Ok(NewCategory {
      name: self.nombre,
      description: self.descripcion,
      extra_text: self.texto_adicional,
      display_order,
    })
  }
}

/// `POST /admin/categorias/create`
pub async fn create_category<S>(
  ctx: RequestContext,
  State(state): State<AppState<S>>,
  Form(form): Form<CategoryForm>,
) -> Result<Redirect, Error>
where
  S: ParishStore + 'static,
{
  ctx.require(Role::Admin)?;
  match form.into_input() {
    Ok(input) => {
      let result = state.store.create_category(input).await;
      ctx.settle(result, |c| format!("Categoría {} creada.", c.name)).await?;
    }
    Err(e) => ctx.reject(&e).await?,
  }
  Ok(back())
}

/// `POST /admin/categorias/edit/{id}`
pub async fn edit_category<S>(
  ctx: RequestContext,
  State(state): State<AppState<S>>,
  Path(id): Path<CategoryId>,
  Form(form): Form<CategoryForm>,
) -> Result<Redirect, Error>
where
  S: ParishStore + 'static,
{
  ctx.require(Role::Admin)?;
  match form.into_input() {
    Ok(input) => {
      let result = state.store.update_category(id, input).await;
      ctx.settle(result, |c| format!("Categoría {} actualizada.", c.name)).await?;
    }
    Err(e) => ctx.reject(&e).await?,
  }
  Ok(back())
}

/// `POST /admin/categorias/toggle/{id}`
pub async fn toggle_category<S>(
  ctx: RequestContext,
  State(state): State<AppState<S>>,
  Path(id): Path<CategoryId>,
) -> Result<Redirect, Error>
where
  S: ParishStore + 'static,
{
  ctx.require(Role::Admin)?;
  let result = state.store.toggle_category(id).await;
  ctx
    .settle(result, |c| {
      let label = if c.active { "activada" } else { "inactivada" };
      format!("Categoría {} {label}.", c.name)
    })
    .await?;
  Ok(back())
}

/// `POST /admin/categorias/delete/{id}`
pub async fn delete_category<S>(
  ctx: RequestContext,
  State(state): State<AppState<S>>,
  Path(id): Path<CategoryId>,
) -> Result<Redirect, Error>
where
  S: ParishStore + 'static,
{
  ctx.require(Role::Admin)?;
  let result = state.store.delete_category(id).await;
  ctx.settle(result, |()| "Categoría eliminada.".to_owned()).await?;
  Ok(back())
}

// ─── Base phrases ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PhraseForm {
  pub frase: String,
}

/// `POST /admin/intencion_base/create`
pub async fn create_phrase<S>(
  ctx: RequestContext,
  State(state): State<AppState<S>>,
  Form(form): Form<PhraseForm>,
) -> Result<Redirect, Error>
where
  S: ParishStore + 'static,
{
  ctx.require(Role::Admin)?;
  let result = state.store.create_phrase(form.frase).await;
  ctx.settle(result, |b| format!("Frase \"{}\" creada.", b.phrase)).await?;
  Ok(back())
}

/// `POST /admin/intencion_base/toggle/{id}`
pub async fn toggle_phrase<S>(
  ctx: RequestContext,
  State(state): State<AppState<S>>,
  Path(id): Path<PhraseId>,
) -> Result<Redirect, Error>
where
  S: ParishStore + 'static,
{
  ctx.require(Role::Admin)?;
  let result = state.store.toggle_phrase(id).await;
  ctx
    .settle(result, |b| {
      let label = if b.active { "activada" } else { "inactivada" };
      format!("Frase \"{}\" {label}.", b.phrase)
    })
    .await?;
  Ok(back())
}

/// `POST /admin/intencion_base/delete/{id}`
pub async fn delete_phrase<S>(
  ctx: RequestContext,
  State(state): State<AppState<S>>,
  Path(id): Path<PhraseId>,
) -> Result<Redirect, Error>
where
  S: ParishStore + 'static,
{
  ctx.require(Role::Admin)?;
  let result = state.store.delete_phrase(id).await;
  ctx.settle(result, |()| "Frase eliminada.".to_owned()).await?;
  Ok(back())
}

// ─── Settings, export, purge ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PrefaceForm {
  #[serde(default)]
  pub pdf_texto_global: String,
}

/// `POST /admin/settings/pdf_text`
pub async fn save_preface<S>(
  ctx: RequestContext,
  State(state): State<AppState<S>>,
  Form(form): Form<PrefaceForm>,
) -> Result<Redirect, Error>
where
  S: ParishStore + 'static,
{
  ctx.require(Role::Admin)?;
  let result = state.store.put_setting(Setting::PdfPreface, form.pdf_texto_global).await;
  ctx.settle(result, |()| "Texto del PDF guardado.".to_owned()).await?;
  Ok(back())
}

#[derive(Debug, Deserialize)]
pub struct RangeForm {
  pub desde: String,
  pub hasta: String,
}

/// `POST /admin/export_csv` — every intention whose Mass falls in
/// `[desde, hasta]`, as `intenciones_admin.csv`.
pub async fn export_csv<S>(
  ctx: RequestContext,
  State(state): State<AppState<S>>,
  Form(form): Form<RangeForm>,
) -> Result<Response, Error>
where
  S: ParishStore + 'static,
{
  ctx.require(Role::Admin)?;
  let (from, to) = match (parse_date(&form.desde), parse_date(&form.hasta)) {
    (Ok(from), Ok(to)) => (from, to),
    (Err(e), _) | (_, Err(e)) => {
      ctx.reject(&e).await?;
      return Ok(back().into_response());
    }
  };

  let rows = state
    .store
    .intentions_between(IntentionScope::All, from, to)
    .await
    .map_err(Error::store)?;
  let csv = write_csv(&rows, CsvColumns::Admin)?;
  tracing::info!(user = %ctx.user.username, %from, %to, rows = rows.len(), "admin csv export");
  attachment("text/csv; charset=utf-8", "intenciones_admin.csv", csv)
}

#[derive(Debug, Deserialize)]
pub struct PurgeForm {
  pub hasta: String,
}

/// `POST /admin/delete_range`
pub async fn delete_range<S>(
  ctx: RequestContext,
  State(state): State<AppState<S>>,
  Form(form): Form<PurgeForm>,
) -> Result<Redirect, Error>
where
  S: ParishStore + 'static,
{
  ctx.require(Role::Admin)?;
  match parse_date(&form.hasta) {
    Ok(through) => {
      let result = state.store.purge_intentions_through(through).await;
      ctx
        .settle(result, |s| format!("Eliminadas {} intenciones hasta {}.", s.deleted, s.through))
        .await?;
    }
    Err(e) => ctx.reject(&e).await?,
  }
  Ok(back())
}
