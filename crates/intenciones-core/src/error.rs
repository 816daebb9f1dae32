//! Domain error taxonomy.
//!
//! Messages are shown verbatim to staff as flash messages, so they are
//! written in Spanish.

use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;

/// The persisted entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
  User,
  Category,
  BasePhrase,
  Mass,
  Intention,
}

impl fmt::Display for Entity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Entity::User => "usuario",
      Entity::Category => "categoría",
      Entity::BasePhrase => "frase",
      Entity::Mass => "misa",
      Entity::Intention => "intención",
    })
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  // ── Validation ──────────────────────────────────────────────────────────
  #[error("Formato de hora inválido. Use 4 números (ej: 0700).")]
  InvalidTime(String),

  #[error("Indique AM o PM (recibido: {0:?}).")]
  InvalidPeriod(String),

  #[error("La hora {time} no es compatible con {period}.")]
  PeriodMismatch { time: String, period: String },

  #[error("Fecha inválida: {0:?}. Use el formato AAAA-MM-DD.")]
  InvalidDate(String),

  #[error("Rol desconocido: {0:?}.")]
  UnknownRole(String),

  #[error("Debe completar todos los campos ({0}).")]
  MissingField(&'static str),

  #[error("Ya existe {entity} con el valor {value:?}.")]
  Duplicate { entity: Entity, value: String },

  #[error("No se encontró {entity} #{id}.")]
  NotFound { entity: Entity, id: i64 },

  #[error("La {entity} #{id} está inactiva.")]
  Inactive { entity: Entity, id: i64 },

  // ── Referential integrity ───────────────────────────────────────────────
  #[error("No se puede eliminar: {entity} en uso por {count} intención(es).")]
  StillReferenced { entity: Entity, count: i64 },

  // ── Authorization ───────────────────────────────────────────────────────
  #[error("No autorizado")]
  NotOwner,

  #[error("La misa ya pasó, no se puede editar")]
  MassAlreadyHappened,

  #[error("Debe quedar al menos un administrador activo.")]
  LastActiveAdmin,

  #[error("No puede eliminarse a usted mismo.")]
  SelfDeletion,

  #[error("No puede desactivarse a usted mismo.")]
  SelfDeactivation,

  #[error("No es posible eliminar administradores. Solo se puede activar/inactivar.")]
  AdminDeletion,

  // ── Bulk deletion ───────────────────────────────────────────────────────
  #[error("La fecha {through} es anterior a la última eliminación ({watermark}).")]
  PurgeBeforeWatermark { through: NaiveDate, watermark: NaiveDate },
}

impl Error {
  /// Whether this error means the caller may not touch the resource at all,
  /// as opposed to a rejected but legitimate request.
  pub fn is_forbidden(&self) -> bool { matches!(self, Error::NotOwner) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
