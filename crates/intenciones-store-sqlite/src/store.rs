//! [`SqliteStore`] — the SQLite implementation of [`ParishStore`].

use std::path::Path;

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike as _};
use rusqlite::{OptionalExtension as _, params};

use intenciones_core::{
  Entity, Error as DomainError,
  category::{Category, CategoryId, NewCategory},
  intention::{
    Intention, IntentionId, IntentionRow, IntentionScope, IntentionUpdate, NewIntention,
  },
  mass::{Mass, MassId, NewMass},
  phrase::{BasePhrase, PhraseId, normalize_phrase},
  setting::Setting,
  store::{ParishStore, PurgeSummary},
  user::{NewUser, Role, User, UserCredentials, UserId},
};

use crate::{
  Error, Result,
  encode::{
    CATEGORY_COLUMNS, INTENTION_COLUMNS, INTENTION_ROW_SELECT, MASS_COLUMNS, PHRASE_COLUMNS,
    RawCategory, RawIntention, RawIntentionRow, RawMass, RawPhrase, RawUser, USER_COLUMNS,
    encode_date, encode_dt,
  },
  schema::SCHEMA,
};

/// Lower bound of the first bulk deletion.
const EPOCH_WATERMARK: &str = "0001-01-01";

// ─── Closure helpers ─────────────────────────────────────────────────────────
//
// These run on the connection thread. Domain rejections travel back as the
// inner `Err` of `Ok(Err(..))` so they never masquerade as database errors.

type Checked<T> = std::result::Result<T, DomainError>;

fn count_references(
  conn: &rusqlite::Connection,
  column: &'static str,
  id: i64,
) -> rusqlite::Result<i64> {
  conn.query_row(
    &format!("SELECT COUNT(*) FROM intenciones WHERE {column} = ?1"),
    params![id],
    |r| r.get(0),
  )
}

/// `None` when row `id` of `table` exists and is active.
fn usable(
  conn: &rusqlite::Connection,
  table: &'static str,
  entity: Entity,
  id: i64,
) -> rusqlite::Result<Option<DomainError>> {
  let active: Option<bool> = conn
    .query_row(&format!("SELECT active FROM {table} WHERE id = ?1"), params![id], |r| r.get(0))
    .optional()?;
  Ok(match active {
    None => Some(DomainError::NotFound { entity, id }),
    Some(false) => Some(DomainError::Inactive { entity, id }),
    Some(true) => None,
  })
}

fn read_user(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<RawUser>> {
  conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
      params![id],
      |row| RawUser::read(row, 0),
    )
    .optional()
}

fn read_category(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<RawCategory>> {
  conn
    .query_row(
      &format!("SELECT {CATEGORY_COLUMNS} FROM categorias WHERE id = ?1"),
      params![id],
      |row| RawCategory::read(row, 0),
    )
    .optional()
}

fn read_phrase(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<RawPhrase>> {
  conn
    .query_row(
      &format!("SELECT {PHRASE_COLUMNS} FROM intencion_base WHERE id = ?1"),
      params![id],
      RawPhrase::read,
    )
    .optional()
}

fn read_intention(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<RawIntention>> {
  conn
    .query_row(
      &format!("SELECT {INTENTION_COLUMNS} FROM intenciones WHERE id = ?1"),
      params![id],
      |row| RawIntention::read(row, 0),
    )
    .optional()
}

fn upsert_setting(conn: &rusqlite::Connection, key: &str, value: &str) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO settings (key, value) VALUES (?1, ?2)
     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    params![key, value],
  )?;
  Ok(())
}

fn local_now() -> NaiveDateTime {
  let now = Local::now().naive_local();
  now.with_nanosecond(0).unwrap_or(now)
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A parish intention store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. Every call
/// runs on the connection's own thread, so each closure below executes
/// without interleaving with other store calls.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Delete row `id` of `table` unless an intention still points at it.
  async fn guarded_delete(
    &self,
    entity: Entity,
    table: &'static str,
    column: &'static str,
    id: i64,
  ) -> Result<()> {
    let outcome: Checked<()> = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row(&format!("SELECT 1 FROM {table} WHERE id = ?1"), params![id], |_| Ok(()))
          .optional()?
          .is_some();
        if !exists {
          return Ok(Err(DomainError::NotFound { entity, id }));
        }

        let count = count_references(conn, column, id)?;
        if count > 0 {
          return Ok(Err(DomainError::StillReferenced { entity, count }));
        }

        conn.execute(&format!("DELETE FROM {table} WHERE id = ?1"), params![id])?;
        Ok(Ok(()))
      })
      .await?;

    outcome?;
    tracing::info!(%entity, id, "deleted");
    Ok(())
  }

  async fn query_rows(
    &self,
    filter: &'static str,
    submitter: Option<UserId>,
    from: Option<String>,
    to: Option<String>,
  ) -> Result<Vec<IntentionRow>> {
    let raws: Vec<RawIntentionRow> = self
      .conn
      .call(move |conn| {
        let sql = format!("{INTENTION_ROW_SELECT} {filter}");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params![submitter, from, to], RawIntentionRow::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawIntentionRow::into_row).collect()
  }
}

fn scope_user(scope: IntentionScope) -> Option<UserId> {
  match scope {
    IntentionScope::All => None,
    IntentionScope::SubmittedBy(id) => Some(id),
  }
}

// ─── ParishStore impl ────────────────────────────────────────────────────────

impl ParishStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn bootstrap_admin(&self, username: String, password_hash: String) -> Result<bool> {
    let created = self
      .conn
      .call(move |conn| {
        let users: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?;
        if users > 0 {
          return Ok(false);
        }
        conn.execute(
          "INSERT INTO users (username, password_hash, role, active) VALUES (?1, ?2, ?3, 1)",
          params![username, password_hash, Role::Admin.as_str()],
        )?;
        Ok(true)
      })
      .await?;
    Ok(created)
  }

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let input = input.validate()?;

    let outcome: Checked<RawUser> = self
      .conn
      .call(move |conn| {
        let taken = conn
          .query_row("SELECT 1 FROM users WHERE username = ?1", params![input.username], |_| Ok(()))
          .optional()?
          .is_some();
        if taken {
          return Ok(Err(DomainError::Duplicate { entity: Entity::User, value: input.username }));
        }

        conn.execute(
          "INSERT INTO users (username, password_hash, role, active) VALUES (?1, ?2, ?3, 1)",
          params![input.username, input.password_hash, input.role.as_str()],
        )?;
        Ok(Ok(RawUser {
          id:       conn.last_insert_rowid(),
          username: input.username,
          role:     input.role.as_str().to_owned(),
          active:   true,
        }))
      })
      .await?;

    let user = outcome?.into_user()?;
    tracing::info!(user = %user.username, role = %user.role, "user created");
    Ok(user)
  }

  async fn find_login(&self, username: String) -> Result<Option<UserCredentials>> {
    let raw: Option<(RawUser, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE username = ?1"),
              params![username],
              |row| Ok((RawUser::read(row, 0)?, row.get::<_, String>(4)?)),
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|(user, password_hash)| -> Result<UserCredentials> {
        Ok(UserCredentials { user: user.into_user()?, password_hash })
      })
      .transpose()
  }

  async fn get_user(&self, id: UserId) -> Result<Option<User>> {
    let raw = self.conn.call(move |conn| Ok(read_user(conn, id)?)).await?;
    raw.map(RawUser::into_user).transpose()
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY username"))?;
        let rows = stmt
          .query_map([], |row| RawUser::read(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn toggle_user(&self, actor: UserId, id: UserId) -> Result<User> {
    let outcome: Checked<RawUser> = self
      .conn
      .call(move |conn| {
        let Some(target) = read_user(conn, id)? else {
          return Ok(Err(DomainError::NotFound { entity: Entity::User, id }));
        };

        if target.active {
          if actor == id {
            return Ok(Err(DomainError::SelfDeactivation));
          }
          if target.role == Role::Admin.as_str() {
            let active_admins: i64 = conn.query_row(
              "SELECT COUNT(*) FROM users WHERE role = ?1 AND active = 1",
              params![Role::Admin.as_str()],
              |r| r.get(0),
            )?;
            if active_admins <= 1 {
              return Ok(Err(DomainError::LastActiveAdmin));
            }
          }
        }

        conn.execute(
          "UPDATE users SET active = ?1 WHERE id = ?2",
          params![!target.active, id],
        )?;
        Ok(Ok(RawUser { active: !target.active, ..target }))
      })
      .await?;

    let user = outcome?.into_user()?;
    tracing::info!(user = %user.username, active = user.active, "user toggled");
    Ok(user)
  }

  async fn delete_user(&self, actor: UserId, id: UserId) -> Result<()> {
    if actor == id {
      return Err(DomainError::SelfDeletion.into());
    }

    let outcome: Checked<String> = self
      .conn
      .call(move |conn| {
        let Some(target) = read_user(conn, id)? else {
          return Ok(Err(DomainError::NotFound { entity: Entity::User, id }));
        };
        if target.role == Role::Admin.as_str() {
          return Ok(Err(DomainError::AdminDeletion));
        }

        let count = count_references(conn, "funcionario_id", id)?;
        if count > 0 {
          return Ok(Err(DomainError::StillReferenced { entity: Entity::User, count }));
        }

        conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(Ok(target.username))
      })
      .await?;

    let username = outcome?;
    tracing::info!(user = %username, "user deleted");
    Ok(())
  }

  async fn set_password(&self, id: UserId, password_hash: String) -> Result<()> {
    if password_hash.is_empty() {
      return Err(DomainError::MissingField("contraseña").into());
    }
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET password_hash = ?1 WHERE id = ?2",
          params![password_hash, id],
        )?)
      })
      .await?;
    if changed == 0 {
      return Err(DomainError::NotFound { entity: Entity::User, id }.into());
    }
    Ok(())
  }

  // ── Categories ────────────────────────────────────────────────────────────

  async fn create_category(&self, input: NewCategory) -> Result<Category> {
    let input = input.validate()?;
    let kind = input.kind();

    let outcome: Checked<RawCategory> = self
      .conn
      .call(move |conn| {
        let taken = conn
          .query_row("SELECT 1 FROM categorias WHERE nombre = ?1", params![input.name], |_| Ok(()))
          .optional()?
          .is_some();
        if taken {
          return Ok(Err(DomainError::Duplicate { entity: Entity::Category, value: input.name }));
        }

        conn.execute(
          "INSERT INTO categorias (nombre, descripcion, texto_adicional, active, orden, tipo)
           VALUES (?1, ?2, ?3, 1, ?4, ?5)",
          params![
            input.name,
            input.description,
            input.extra_text,
            input.display_order,
            kind.as_str(),
          ],
        )?;
        Ok(Ok(RawCategory {
          id:            conn.last_insert_rowid(),
          name:          input.name,
          description:   input.description,
          extra_text:    input.extra_text,
          active:        true,
          display_order: input.display_order,
          kind:          kind.as_str().to_owned(),
        }))
      })
      .await?;

    let category = outcome?.into_category()?;
    tracing::info!(category = %category.name, kind = category.kind.as_str(), "category created");
    Ok(category)
  }

  async fn update_category(&self, id: CategoryId, input: NewCategory) -> Result<Category> {
    let input = input.validate()?;
    let kind = input.kind();

    let outcome: Checked<RawCategory> = self
      .conn
      .call(move |conn| {
        if read_category(conn, id)?.is_none() {
          return Ok(Err(DomainError::NotFound { entity: Entity::Category, id }));
        }
        let taken = conn
          .query_row(
            "SELECT 1 FROM categorias WHERE nombre = ?1 AND id != ?2",
            params![input.name, id],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if taken {
          return Ok(Err(DomainError::Duplicate { entity: Entity::Category, value: input.name }));
        }

        conn.execute(
          "UPDATE categorias
           SET nombre = ?1, descripcion = ?2, texto_adicional = ?3, orden = ?4, tipo = ?5
           WHERE id = ?6",
          params![
            input.name,
            input.description,
            input.extra_text,
            input.display_order,
            kind.as_str(),
            id,
          ],
        )?;
        match read_category(conn, id)? {
          Some(raw) => Ok(Ok(raw)),
          None => Ok(Err(DomainError::NotFound { entity: Entity::Category, id })),
        }
      })
      .await?;

    Ok(outcome?.into_category()?)
  }

  async fn list_categories(&self, active_only: bool) -> Result<Vec<Category>> {
    let raws: Vec<RawCategory> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CATEGORY_COLUMNS} FROM categorias
           WHERE (?1 = 0 OR active = 1)
           ORDER BY orden, nombre"
        ))?;
        let rows = stmt
          .query_map(params![active_only], |row| RawCategory::read(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCategory::into_category).collect()
  }

  async fn toggle_category(&self, id: CategoryId) -> Result<Category> {
    let outcome: Checked<RawCategory> = self
      .conn
      .call(move |conn| {
        conn.execute("UPDATE categorias SET active = 1 - active WHERE id = ?1", params![id])?;
        match read_category(conn, id)? {
          Some(raw) => Ok(Ok(raw)),
          None => Ok(Err(DomainError::NotFound { entity: Entity::Category, id })),
        }
      })
      .await?;

    Ok(outcome?.into_category()?)
  }

  async fn delete_category(&self, id: CategoryId) -> Result<()> {
    self.guarded_delete(Entity::Category, "categorias", "categoria_id", id).await
  }

  // ── Base phrases ──────────────────────────────────────────────────────────

  async fn create_phrase(&self, phrase: String) -> Result<BasePhrase> {
    let phrase = normalize_phrase(&phrase)?;

    let outcome: Checked<RawPhrase> = self
      .conn
      .call(move |conn| {
        let taken = conn
          .query_row(
            "SELECT 1 FROM intencion_base WHERE frase = ?1 COLLATE NOCASE",
            params![phrase],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if taken {
          return Ok(Err(DomainError::Duplicate { entity: Entity::BasePhrase, value: phrase }));
        }

        conn.execute("INSERT INTO intencion_base (frase, active) VALUES (?1, 1)", params![phrase])?;
        Ok(Ok(RawPhrase { id: conn.last_insert_rowid(), phrase, active: true }))
      })
      .await?;

    Ok(outcome?.into_phrase())
  }

  async fn list_phrases(&self, active_only: bool) -> Result<Vec<BasePhrase>> {
    let raws: Vec<RawPhrase> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PHRASE_COLUMNS} FROM intencion_base
           WHERE (?1 = 0 OR active = 1)
           ORDER BY frase"
        ))?;
        let rows = stmt
          .query_map(params![active_only], RawPhrase::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().map(RawPhrase::into_phrase).collect())
  }

  async fn toggle_phrase(&self, id: PhraseId) -> Result<BasePhrase> {
    let outcome: Checked<RawPhrase> = self
      .conn
      .call(move |conn| {
        conn.execute("UPDATE intencion_base SET active = 1 - active WHERE id = ?1", params![id])?;
        match read_phrase(conn, id)? {
          Some(raw) => Ok(Ok(raw)),
          None => Ok(Err(DomainError::NotFound { entity: Entity::BasePhrase, id })),
        }
      })
      .await?;

    Ok(outcome?.into_phrase())
  }

  async fn delete_phrase(&self, id: PhraseId) -> Result<()> {
    self.guarded_delete(Entity::BasePhrase, "intencion_base", "intencion_base_id", id).await
  }

  // ── Masses ────────────────────────────────────────────────────────────────

  async fn create_mass(&self, input: NewMass) -> Result<Mass> {
    let date_str = encode_date(input.date);
    let time_str = input.time.to_string();
    let period_str = input.period.as_str();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO misas (fecha, hora, ampm) VALUES (?1, ?2, ?3)",
          params![date_str, time_str, period_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    let mass = Mass { id, date: input.date, time: input.time, period: input.period };
    tracing::info!(date = %mass.date, time = %mass.time_label(), "mass created");
    Ok(mass)
  }

  async fn list_masses(&self) -> Result<Vec<Mass>> {
    let raws: Vec<RawMass> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!("SELECT {MASS_COLUMNS} FROM misas"))?;
        let rows = stmt
          .query_map([], |row| RawMass::read(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut masses = raws.into_iter().map(RawMass::into_mass).collect::<Result<Vec<_>>>()?;
    masses.sort_by_key(|m| (m.chronological_key(), m.id));
    Ok(masses)
  }

  async fn masses_on(&self, date: NaiveDate) -> Result<Vec<Mass>> {
    let date_str = encode_date(date);

    let raws: Vec<RawMass> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!("SELECT {MASS_COLUMNS} FROM misas WHERE fecha = ?1"))?;
        let rows = stmt
          .query_map(params![date_str], |row| RawMass::read(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut masses = raws.into_iter().map(RawMass::into_mass).collect::<Result<Vec<_>>>()?;
    masses.sort_by_key(|m| (m.chronological_key(), m.id));
    Ok(masses)
  }

  async fn delete_mass(&self, id: MassId) -> Result<()> {
    self.guarded_delete(Entity::Mass, "misas", "misa_id", id).await
  }

  // ── Intentions ────────────────────────────────────────────────────────────

  async fn create_intention(&self, submitted_by: UserId, input: NewIntention) -> Result<Intention> {
    let input = input.validate()?;
    let now = local_now();
    let now_str = encode_dt(now);

    let outcome: Checked<IntentionId> = self
      .conn
      .call({
        let input = input.clone();
        move |conn| {
          let mass_exists = conn
            .query_row("SELECT 1 FROM misas WHERE id = ?1", params![input.mass_id], |_| Ok(()))
            .optional()?
            .is_some();
          if !mass_exists {
            return Ok(Err(DomainError::NotFound { entity: Entity::Mass, id: input.mass_id }));
          }
          if let Some(e) = usable(conn, "categorias", Entity::Category, input.category_id)? {
            return Ok(Err(e));
          }
          if let Some(e) = usable(conn, "intencion_base", Entity::BasePhrase, input.base_phrase_id)? {
            return Ok(Err(e));
          }

          conn.execute(
            "INSERT INTO intenciones (
               misa_id, categoria_id, ofrece, intencion_base_id, peticiones,
               fecha_creado, fecha_actualizado, funcionario_id
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, ?7)",
            params![
              input.mass_id,
              input.category_id,
              input.offered_by,
              input.base_phrase_id,
              input.petitions,
              now_str,
              submitted_by,
            ],
          )?;
          Ok(Ok(conn.last_insert_rowid()))
        }
      })
      .await?;

    let id = outcome?;
    tracing::info!(id, mass_id = input.mass_id, submitted_by, "intention registered");
    Ok(Intention {
      id,
      mass_id: input.mass_id,
      category_id: input.category_id,
      offered_by: input.offered_by,
      base_phrase_id: input.base_phrase_id,
      petitions: input.petitions,
      created_at: now,
      updated_at: now,
      submitted_by,
    })
  }

  async fn get_intention(&self, id: IntentionId) -> Result<Option<IntentionRow>> {
    let raw: Option<RawIntentionRow> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("{INTENTION_ROW_SELECT} WHERE i.id = ?1"),
              params![id],
              RawIntentionRow::read,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawIntentionRow::into_row).transpose()
  }

  async fn update_intention(
    &self,
    actor: UserId,
    id: IntentionId,
    input: IntentionUpdate,
    now: NaiveDateTime,
  ) -> Result<Intention> {
    let current = self
      .get_intention(id)
      .await?
      .ok_or(DomainError::NotFound { entity: Entity::Intention, id })?;

    if current.intention.submitted_by != actor {
      return Err(DomainError::NotOwner.into());
    }
    if now > current.mass.scheduled_at() {
      return Err(DomainError::MassAlreadyHappened.into());
    }

    let input = input.validate()?;
    let now_str = encode_dt(now.with_nanosecond(0).unwrap_or(now));
    // An edit may keep a reference that was deactivated after submission.
    let keeps_category = input.category_id == current.intention.category_id;
    let keeps_phrase = input.base_phrase_id == current.intention.base_phrase_id;

    let outcome: Checked<RawIntention> = self
      .conn
      .call(move |conn| {
        if !keeps_category
          && let Some(e) = usable(conn, "categorias", Entity::Category, input.category_id)?
        {
          return Ok(Err(e));
        }
        if !keeps_phrase
          && let Some(e) = usable(conn, "intencion_base", Entity::BasePhrase, input.base_phrase_id)?
        {
          return Ok(Err(e));
        }

        conn.execute(
          "UPDATE intenciones
           SET ofrece = ?1, peticiones = ?2, categoria_id = ?3, intencion_base_id = ?4,
               fecha_actualizado = ?5
           WHERE id = ?6",
          params![
            input.offered_by,
            input.petitions,
            input.category_id,
            input.base_phrase_id,
            now_str,
            id,
          ],
        )?;
        match read_intention(conn, id)? {
          Some(raw) => Ok(Ok(raw)),
          None => Ok(Err(DomainError::NotFound { entity: Entity::Intention, id })),
        }
      })
      .await?;

    let updated = outcome?.into_intention()?;
    tracing::info!(id, actor, "intention updated");
    Ok(updated)
  }

  async fn list_intentions(&self, scope: IntentionScope) -> Result<Vec<IntentionRow>> {
    self
      .query_rows(
        "WHERE (?1 IS NULL OR i.funcionario_id = ?1) AND ?2 IS NULL AND ?3 IS NULL
         ORDER BY i.fecha_creado DESC, i.id DESC",
        scope_user(scope),
        None,
        None,
      )
      .await
  }

  async fn intentions_between(
    &self,
    scope: IntentionScope,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<Vec<IntentionRow>> {
    let mut rows = self
      .query_rows(
        "WHERE (?1 IS NULL OR i.funcionario_id = ?1) AND m.fecha BETWEEN ?2 AND ?3",
        scope_user(scope),
        Some(encode_date(from)),
        Some(encode_date(to)),
      )
      .await?;

    rows.sort_by_key(|r| {
      (r.mass.chronological_key(), r.mass.id, r.intention.created_at, r.intention.id)
    });
    Ok(rows)
  }

  async fn purge_intentions_through(&self, through: NaiveDate) -> Result<PurgeSummary> {
    let through_str = encode_date(through);

    let outcome: Checked<PurgeSummary> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let watermark: String = tx
          .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![Setting::LastDeletion.key()],
            |r| r.get(0),
          )
          .optional()?
          .unwrap_or_else(|| EPOCH_WATERMARK.to_owned());
        let from = NaiveDate::parse_from_str(&watermark, intenciones_core::mass::DATE_FORMAT)
          .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
          })?;

        if through < from {
          return Ok(Err(DomainError::PurgeBeforeWatermark { through, watermark: from }));
        }

        let deleted = tx.execute(
          "DELETE FROM intenciones
           WHERE misa_id IN (SELECT id FROM misas WHERE fecha BETWEEN ?1 AND ?2)",
          params![watermark, through_str],
        )?;
        upsert_setting(&tx, Setting::LastDeletion.key(), &through_str)?;
        tx.commit()?;

        Ok(Ok(PurgeSummary { from, through, deleted }))
      })
      .await?;

    let summary = outcome?;
    tracing::info!(
      from = %summary.from,
      through = %summary.through,
      deleted = summary.deleted,
      "intentions purged"
    );
    Ok(summary)
  }

  // ── Settings ──────────────────────────────────────────────────────────────

  async fn get_setting(&self, key: Setting) -> Result<Option<String>> {
    let value = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row("SELECT value FROM settings WHERE key = ?1", params![key.key()], |r| r.get(0))
            .optional()?,
        )
      })
      .await?;
    Ok(value)
  }

  async fn put_setting(&self, key: Setting, value: String) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        upsert_setting(conn, key.key(), &value)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
