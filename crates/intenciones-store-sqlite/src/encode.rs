//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Dates are `YYYY-MM-DD`, timestamps are local `YYYY-MM-DDTHH:MM:SS`, Mass
//! times are `HH:MM` plus an `AM`/`PM` column, flags are `0`/`1`.

use chrono::{NaiveDate, NaiveDateTime};
use intenciones_core::{
  category::{Category, CategoryKind},
  intention::{Intention, IntentionRow},
  mass::{DATE_FORMAT, Mass, MassTime, Meridiem},
  phrase::BasePhrase,
  user::{Role, User},
};

use crate::{Error, Result};

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_dt(dt: NaiveDateTime) -> String { dt.format(DATETIME_FORMAT).to_string() }

pub fn decode_dt(s: &str) -> Result<NaiveDateTime> {
  NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
    // Rows written by the old application carry fractional seconds.
    .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

fn decode_role(s: &str) -> Result<Role> {
  s.parse().map_err(|_| Error::Decode(format!("unknown role {s:?}")))
}

fn decode_kind(s: &str) -> Result<CategoryKind> {
  CategoryKind::from_tag(s).ok_or_else(|| Error::Decode(format!("unknown category kind {s:?}")))
}

fn decode_period(s: &str) -> Result<Meridiem> {
  s.parse().map_err(|_| Error::Decode(format!("unknown AM/PM marker {s:?}")))
}

fn decode_time(s: &str) -> Result<MassTime> {
  MassTime::parse(s).map_err(|_| Error::Decode(format!("malformed mass time {s:?}")))
}

// ─── Raw rows ────────────────────────────────────────────────────────────────
//
// Each raw struct is read inside a `tokio_rusqlite` closure (which can only
// fail with rusqlite errors) and decoded afterwards on the async side.

pub const USER_COLUMNS: &str = "id, username, role, active";

pub struct RawUser {
  pub id:       i64,
  pub username: String,
  pub role:     String,
  pub active:   bool,
}

impl RawUser {
  pub fn read(row: &rusqlite::Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      id:       row.get(at)?,
      username: row.get(at + 1)?,
      role:     row.get(at + 2)?,
      active:   row.get(at + 3)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:       self.id,
      username: self.username,
      role:     decode_role(&self.role)?,
      active:   self.active,
    })
  }
}

pub const CATEGORY_COLUMNS: &str =
  "id, nombre, descripcion, texto_adicional, active, orden, tipo";

pub struct RawCategory {
  pub id:            i64,
  pub name:          String,
  pub description:   String,
  pub extra_text:    String,
  pub active:        bool,
  pub display_order: i64,
  pub kind:          String,
}

impl RawCategory {
  pub fn read(row: &rusqlite::Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(at)?,
      name:          row.get(at + 1)?,
      description:   row.get(at + 2)?,
      extra_text:    row.get(at + 3)?,
      active:        row.get(at + 4)?,
      display_order: row.get(at + 5)?,
      kind:          row.get(at + 6)?,
    })
  }

  pub fn into_category(self) -> Result<Category> {
    Ok(Category {
      id:            self.id,
      name:          self.name,
      description:   self.description,
      extra_text:    self.extra_text,
      active:        self.active,
      display_order: self.display_order,
      kind:          decode_kind(&self.kind)?,
    })
  }
}

pub const PHRASE_COLUMNS: &str = "id, frase, active";

pub struct RawPhrase {
  pub id:     i64,
  pub phrase: String,
  pub active: bool,
}

impl RawPhrase {
  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { id: row.get(0)?, phrase: row.get(1)?, active: row.get(2)? })
  }

  pub fn into_phrase(self) -> BasePhrase {
    BasePhrase { id: self.id, phrase: self.phrase, active: self.active }
  }
}

pub const MASS_COLUMNS: &str = "id, fecha, hora, ampm";

pub struct RawMass {
  pub id:     i64,
  pub date:   String,
  pub time:   String,
  pub period: String,
}

impl RawMass {
  pub fn read(row: &rusqlite::Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      id:     row.get(at)?,
      date:   row.get(at + 1)?,
      time:   row.get(at + 2)?,
      period: row.get(at + 3)?,
    })
  }

  pub fn into_mass(self) -> Result<Mass> {
    Ok(Mass {
      id:     self.id,
      date:   decode_date(&self.date)?,
      time:   decode_time(&self.time)?,
      period: decode_period(&self.period)?,
    })
  }
}

pub const INTENTION_COLUMNS: &str = "id, misa_id, categoria_id, ofrece, intencion_base_id, \
   peticiones, fecha_creado, fecha_actualizado, funcionario_id";

pub struct RawIntention {
  pub id:             i64,
  pub mass_id:        i64,
  pub category_id:    i64,
  pub offered_by:     String,
  pub base_phrase_id: i64,
  pub petitions:      String,
  pub created_at:     String,
  pub updated_at:     String,
  pub submitted_by:   i64,
}

impl RawIntention {
  pub fn read(row: &rusqlite::Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(at)?,
      mass_id:        row.get(at + 1)?,
      category_id:    row.get(at + 2)?,
      offered_by:     row.get(at + 3)?,
      base_phrase_id: row.get(at + 4)?,
      petitions:      row.get(at + 5)?,
      created_at:     row.get(at + 6)?,
      updated_at:     row.get(at + 7)?,
      submitted_by:   row.get(at + 8)?,
    })
  }

  pub fn into_intention(self) -> Result<Intention> {
    Ok(Intention {
      id:             self.id,
      mass_id:        self.mass_id,
      category_id:    self.category_id,
      offered_by:     self.offered_by,
      base_phrase_id: self.base_phrase_id,
      petitions:      self.petitions,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
      submitted_by:   self.submitted_by,
    })
  }
}

/// Joined select producing [`RawIntentionRow`]s; callers append `WHERE`.
pub const INTENTION_ROW_SELECT: &str = "
SELECT i.id, i.misa_id, i.categoria_id, i.ofrece, i.intencion_base_id,
       i.peticiones, i.fecha_creado, i.fecha_actualizado, i.funcionario_id,
       m.id, m.fecha, m.hora, m.ampm,
       c.id, c.nombre, c.descripcion, c.texto_adicional, c.active, c.orden, c.tipo,
       b.frase,
       u.username
FROM intenciones i
JOIN misas          m ON m.id = i.misa_id
JOIN categorias     c ON c.id = i.categoria_id
JOIN intencion_base b ON b.id = i.intencion_base_id
JOIN users          u ON u.id = i.funcionario_id";

pub struct RawIntentionRow {
  pub intention:   RawIntention,
  pub mass:        RawMass,
  pub category:    RawCategory,
  pub base_phrase: String,
  pub submitter:   String,
}

impl RawIntentionRow {
  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      intention:   RawIntention::read(row, 0)?,
      mass:        RawMass::read(row, 9)?,
      category:    RawCategory::read(row, 13)?,
      base_phrase: row.get(20)?,
      submitter:   row.get(21)?,
    })
  }

  pub fn into_row(self) -> Result<IntentionRow> {
    Ok(IntentionRow {
      intention:   self.intention.into_intention()?,
      mass:        self.mass.into_mass()?,
      category:    self.category.into_category()?,
      base_phrase: self.base_phrase,
      submitter:   self.submitter,
    })
  }
}
