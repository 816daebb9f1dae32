//! Intention categories and the print layout each one selects.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub type CategoryId = i64;

/// The closed set of print layouts.
///
/// Resolved from the category name when the category is created or renamed,
/// then persisted; the report layer only ever matches on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
  /// Deceased ("difuntos"): names in a three-column grid.
  Difuntos,
  /// Thanksgiving: intention / offered-by table.
  AccionDeGracias,
  /// Health and the sick: names in a two-column grid.
  Salud,
  /// Miscellaneous: wrapped prose.
  Varios,
  /// Anything else: wrapped prose.
  General,
}

impl CategoryKind {
  /// Pick the layout for a category called `name`.
  ///
  /// Matching is case- and accent-insensitive and looks for keyword stems,
  /// so "Difuntos", "Por los difuntos" and "DIFUNTO" all resolve alike.
  pub fn resolve(name: &str) -> Self {
    let folded = fold(name);
    if folded.contains("difunt") {
      CategoryKind::Difuntos
    } else if folded.contains("gracia") {
      CategoryKind::AccionDeGracias
    } else if folded.contains("salud") || folded.contains("enferm") {
      CategoryKind::Salud
    } else if folded.contains("vari") || folded.contains("otro") {
      CategoryKind::Varios
    } else {
      CategoryKind::General
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      CategoryKind::Difuntos => "difuntos",
      CategoryKind::AccionDeGracias => "accion_de_gracias",
      CategoryKind::Salud => "salud",
      CategoryKind::Varios => "varios",
      CategoryKind::General => "general",
    }
  }
}

impl CategoryKind {
  /// Inverse of [`CategoryKind::as_str`].
  pub fn from_tag(tag: &str) -> Option<Self> {
    match tag {
      "difuntos" => Some(CategoryKind::Difuntos),
      "accion_de_gracias" => Some(CategoryKind::AccionDeGracias),
      "salud" => Some(CategoryKind::Salud),
      "varios" => Some(CategoryKind::Varios),
      "general" => Some(CategoryKind::General),
      _ => None,
    }
  }
}

/// Lowercase and strip Spanish diacritics.
fn fold(s: &str) -> String {
  s.chars()
    .flat_map(char::to_lowercase)
    .map(|c| match c {
      'á' | 'à' | 'ä' => 'a',
      'é' | 'è' | 'ë' => 'e',
      'í' | 'ì' | 'ï' => 'i',
      'ó' | 'ò' | 'ö' => 'o',
      'ú' | 'ù' | 'ü' => 'u',
      'ñ' => 'n',
      other => other,
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  pub id:            CategoryId,
  pub name:          String,
  pub description:   String,
  /// Printed in italics under the category heading.
  pub extra_text:    String,
  pub active:        bool,
  pub display_order: i64,
  pub kind:          CategoryKind,
}

/// Input for creating or editing a category.
#[derive(Debug, Clone, Default)]
pub struct NewCategory {
  pub name:          String,
  pub description:   String,
  pub extra_text:    String,
  pub display_order: i64,
}

impl NewCategory {
  pub fn validate(mut self) -> Result<Self> {
    self.name = self.name.trim().to_owned();
    if self.name.is_empty() {
      return Err(Error::MissingField("nombre"));
    }
    self.description = self.description.trim().to_owned();
    self.extra_text = self.extra_text.trim_end().to_owned();
    Ok(self)
  }

  pub fn kind(&self) -> CategoryKind { CategoryKind::resolve(&self.name) }
}
