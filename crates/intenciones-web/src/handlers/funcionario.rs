//! Handlers for staff under `/funcionario`.
//!
//! Any signed-in user may use these pages. Intentions can only be edited by
//! the user who submitted them, and only until their Mass starts.

use axum::{
  Form,
  extract::{Path, Query, State},
  response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{Local, NaiveDate};
use intenciones_core::{
  Error as DomainError,
  category::Category,
  intention::{IntentionId, IntentionRow, IntentionScope, IntentionUpdate, NewIntention},
  mass::parse_date,
  phrase::BasePhrase,
  setting::Setting,
  store::ParishStore,
};
use intenciones_report::{CsvColumns, PrintJob, export_csv as write_csv, print_day as write_pdf};
use serde::Deserialize;

use crate::{
  AppState,
  auth::RequestContext,
  error::{Error, rejection},
  flash::{self, Level},
  handlers::{attachment, form_id},
  views::{self, EditPage, StaffPage},
};

fn back() -> Redirect { Redirect::to("/funcionario") }

fn today() -> NaiveDate { Local::now().date_naive() }

// ─── Home ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DayQuery {
  pub dia: Option<String>,
}

/// `GET /funcionario[?dia=YYYY-MM-DD]`
pub async fn home<S>(
  ctx: RequestContext,
  State(state): State<AppState<S>>,
  Query(query): Query<DayQuery>,
) -> Result<Html<String>, Error>
where
  S: ParishStore + 'static,
{
  let day = match query.dia.as_deref().filter(|d| !d.is_empty()).map(parse_date) {
    None => today(),
    Some(Ok(day)) => day,
    Some(Err(e)) => {
      ctx.reject(&e).await?;
      today()
    }
  };

  let store = &state.store;
  let masses = store.masses_on(day).await.map_err(Error::store)?;
  let categories = store.list_categories(true).await.map_err(Error::store)?;
  let phrases = store.list_phrases(true).await.map_err(Error::store)?;
  let own = store
    .list_intentions(IntentionScope::SubmittedBy(ctx.user.id))
    .await
    .map_err(Error::store)?;
  let flashes = flash::take(&ctx.session).await?;

  Ok(views::staff(&StaffPage {
    user: &ctx.user,
    flashes: &flashes,
    day,
    masses: &masses,
    categories: &categories,
    phrases: &phrases,
    own: &own,
    now: Local::now().naive_local(),
  }))
}

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct IntentionForm {
  #[serde(default)]
  pub misa_id:      String,
  #[serde(default)]
  pub categoria_id: String,
  #[serde(default)]
  pub int_base_id:  String,
  #[serde(default)]
  pub ofrece:       String,
  #[serde(default)]
  pub peticiones:   String,
}

impl IntentionForm {
  fn into_new(self) -> Result<NewIntention, DomainError> {
    Ok(NewIntention {
      mass_id:        form_id(&self.misa_id, "misa")?,
      category_id:    form_id(&self.categoria_id, "categoría")?,
      offered_by:     self.ofrece,
      base_phrase_id: form_id(&self.int_base_id, "frase")?,
      petitions:      self.peticiones,
    })
  }

  fn into_update(self) -> Result<IntentionUpdate, DomainError> {
    Ok(IntentionUpdate {
      category_id:    form_id(&self.categoria_id, "categoría")?,
      offered_by:     self.ofrece,
      base_phrase_id: form_id(&self.int_base_id, "frase")?,
      petitions:      self.peticiones,
    })
  }
}

/// `POST /funcionario/registrar`
pub async fn register<S>(
  ctx: RequestContext,
  State(state): State<AppState<S>>,
  Form(form): Form<IntentionForm>,
) -> Result<Redirect, Error>
where
  S: ParishStore + 'static,
{
  match form.into_new() {
    Ok(input) => {
      let result = state.store.create_intention(ctx.user.id, input).await;
      ctx.settle(result, |_| "Intención registrada exitosamente".to_owned()).await?;
    }
    Err(e) => ctx.reject(&e).await?,
  }
  Ok(back())
}

// ─── Edit ─────────────────────────────────────────────────────────────────────

/// `GET /funcionario/editar/{id}`
pub async fn edit_form<S>(
  ctx: RequestContext,
  State(state): State<AppState<S>>,
  Path(id): Path<IntentionId>,
) -> Result<Html<String>, Error>
where
  S: ParishStore + 'static,
{
  let row = state.store.get_intention(id).await.map_err(Error::store)?.ok_or(Error::NotFound)?;
  if row.intention.submitted_by != ctx.user.id {
    return Err(Error::Forbidden("No autorizado"));
  }

  let mut categories = state.store.list_categories(true).await.map_err(Error::store)?;
  let mut phrases = state.store.list_phrases(true).await.map_err(Error::store)?;
  keep_current_choices(&row, &mut categories, &mut phrases);
  let flashes = flash::take(&ctx.session).await?;

  Ok(views::edit(&EditPage {
    user:       &ctx.user,
    flashes:    &flashes,
    row:        &row,
    categories: &categories,
    phrases:    &phrases,
  }))
}

/// The row's own category and phrase stay selectable after deactivation.
fn keep_current_choices(
  row: &IntentionRow,
  categories: &mut Vec<Category>,
  phrases: &mut Vec<BasePhrase>,
) {
  if !categories.iter().any(|c| c.id == row.category.id) {
    categories.push(row.category.clone());
  }
  if !phrases.iter().any(|b| b.id == row.intention.base_phrase_id) {
    phrases.push(BasePhrase {
      id:     row.intention.base_phrase_id,
      phrase: row.base_phrase.clone(),
      active: false,
    });
  }
}

/// `POST /funcionario/editar/{id}`
pub async fn edit_submit<S>(
  ctx: RequestContext,
  State(state): State<AppState<S>>,
  Path(id): Path<IntentionId>,
  Form(form): Form<IntentionForm>,
) -> Result<Redirect, Error>
where
  S: ParishStore + 'static,
{
  let update = match form.into_update() {
    Ok(update) => update,
    Err(e) => {
      ctx.reject(&e).await?;
      return Ok(Redirect::to(&format!("/funcionario/editar/{id}")));
    }
  };

  let now = Local::now().naive_local();
  match state.store.update_intention(ctx.user.id, id, update, now).await {
    Ok(_) => ctx.flash(Level::Success, "Cambios guardados").await?,
    Err(err) => ctx.reject(&rejection(err)?).await?,
  }
  Ok(back())
}

// ─── Downloads ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RangeForm {
  pub desde: String,
  pub hasta: String,
}

/// `POST /funcionario/export_csv` — the caller's own intentions whose Mass
/// falls in `[desde, hasta]`, as `mis_intenciones.csv`.
pub async fn export_csv<S>(
  ctx: RequestContext,
  State(state): State<AppState<S>>,
  Form(form): Form<RangeForm>,
) -> Result<Response, Error>
where
  S: ParishStore + 'static,
{
  let (from, to) = match (parse_date(&form.desde), parse_date(&form.hasta)) {
    (Ok(from), Ok(to)) => (from, to),
    (Err(e), _) | (_, Err(e)) => {
      ctx.reject(&e).await?;
      return Ok(back().into_response());
    }
  };

  let rows = state
    .store
    .intentions_between(IntentionScope::SubmittedBy(ctx.user.id), from, to)
    .await
    .map_err(Error::store)?;
  let csv = write_csv(&rows, CsvColumns::Own)?;
  attachment("text/csv; charset=utf-8", "mis_intenciones.csv", csv)
}

#[derive(Debug, Deserialize)]
pub struct PrintForm {
  pub dia: String,
}

/// `POST /funcionario/print_day` — the printable sheet for every intention
/// on `dia`, as `intenciones_<dia>.pdf`.
pub async fn print_day<S>(
  ctx: RequestContext,
  State(state): State<AppState<S>>,
  Form(form): Form<PrintForm>,
) -> Result<Response, Error>
where
  S: ParishStore + 'static,
{
  let day = match parse_date(&form.dia) {
    Ok(day) => day,
    Err(e) => {
      ctx.reject(&e).await?;
      return Ok(back().into_response());
    }
  };

  let store = &state.store;
  let masses = store.masses_on(day).await.map_err(Error::store)?;
  let rows = store
    .intentions_between(IntentionScope::All, day, day)
    .await
    .map_err(Error::store)?;
  let preface = store.get_setting(Setting::PdfPreface).await.map_err(Error::store)?;

  let job = PrintJob {
    date: day,
    masses,
    rows,
    preface,
    printed_by: ctx.user.username.clone(),
    printed_at: Local::now().naive_local(),
  };
  let pdf = write_pdf(&job)?;
  tracing::info!(user = %ctx.user.username, %day, "day sheet downloaded");
  attachment("application/pdf", &format!("intenciones_{day}.pdf"), pdf)
}
