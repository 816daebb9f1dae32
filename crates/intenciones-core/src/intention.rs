//! Prayer intentions and their joined read model.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  category::{Category, CategoryId},
  mass::{Mass, MassId},
  phrase::PhraseId,
  user::UserId,
};

pub type IntentionId = i64;

/// Upper bound on the petitions text, in characters.
pub const PETITIONS_MAX_CHARS: usize = 250;
/// Upper bound on the offered-by text, in characters.
pub const OFFERED_BY_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intention {
  pub id:             IntentionId,
  pub mass_id:        MassId,
  pub category_id:    CategoryId,
  pub offered_by:     String,
  pub base_phrase_id: PhraseId,
  pub petitions:      String,
  pub created_at:     NaiveDateTime,
  pub updated_at:     NaiveDateTime,
  pub submitted_by:   UserId,
}

/// An intention joined with everything needed to list, export or print it.
#[derive(Debug, Clone)]
pub struct IntentionRow {
  pub intention:   Intention,
  pub mass:        Mass,
  pub category:    Category,
  pub base_phrase: String,
  /// Username of the submitting staff member.
  pub submitter:   String,
}

/// Which intentions a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentionScope {
  All,
  SubmittedBy(UserId),
}

/// Input for [`ParishStore::create_intention`](crate::store::ParishStore::create_intention).
#[derive(Debug, Clone)]
pub struct NewIntention {
  pub mass_id:        MassId,
  pub category_id:    CategoryId,
  pub offered_by:     String,
  pub base_phrase_id: PhraseId,
  pub petitions:      String,
}

impl NewIntention {
  pub fn validate(mut self) -> Result<Self> {
    (self.offered_by, self.petitions) = clean_texts(&self.offered_by, &self.petitions)?;
    Ok(self)
  }
}

/// The fields an owner may change before the Mass.
#[derive(Debug, Clone)]
pub struct IntentionUpdate {
  pub category_id:    CategoryId,
  pub offered_by:     String,
  pub base_phrase_id: PhraseId,
  pub petitions:      String,
}

impl IntentionUpdate {
  pub fn validate(mut self) -> Result<Self> {
    (self.offered_by, self.petitions) = clean_texts(&self.offered_by, &self.petitions)?;
    Ok(self)
  }
}

fn clean_texts(offered_by: &str, petitions: &str) -> Result<(String, String)> {
  let offered_by = truncate_chars(offered_by.trim(), OFFERED_BY_MAX_CHARS);
  let petitions = truncate_chars(petitions.trim(), PETITIONS_MAX_CHARS);
  if offered_by.is_empty() {
    return Err(Error::MissingField("ofrece"));
  }
  if petitions.is_empty() {
    return Err(Error::MissingField("peticiones"));
  }
  Ok((offered_by, petitions))
}

/// Keep at most `max` characters, never splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> String {
  match s.char_indices().nth(max) {
    Some((end, _)) => s[..end].trim_end().to_owned(),
    None => s.to_owned(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn input(offered_by: &str, petitions: &str) -> NewIntention {
    NewIntention {
      mass_id: 1,
      category_id: 1,
      offered_by: offered_by.into(),
      base_phrase_id: 1,
      petitions: petitions.into(),
    }
  }

  #[test]
  fn trims_required_fields() {
    let v = input("  Familia Rojas ", "\n Juan Rojas ").validate().unwrap();
    assert_eq!(v.offered_by, "Familia Rojas");
    assert_eq!(v.petitions, "Juan Rojas");
  }

  #[test]
  fn blank_fields_are_rejected() {
    assert_eq!(input("", "x").validate().unwrap_err(), Error::MissingField("ofrece"));
    assert_eq!(input("x", "   ").validate().unwrap_err(), Error::MissingField("peticiones"));
  }

  #[test]
  fn petitions_are_capped_by_characters_not_bytes() {
    let long = "ñ".repeat(300);
    let v = input("x", &long).validate().unwrap();
    assert_eq!(v.petitions.chars().count(), PETITIONS_MAX_CHARS);
  }
}
