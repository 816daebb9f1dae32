//! Reusable base-intention wordings ("intención base").

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub type PhraseId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasePhrase {
  pub id:     PhraseId,
  pub phrase: String,
  pub active: bool,
}

/// Trim a submitted phrase and reject blank input.
pub fn normalize_phrase(input: &str) -> Result<String> {
  let phrase = input.split_whitespace().collect::<Vec<_>>().join(" ");
  if phrase.is_empty() {
    return Err(Error::MissingField("frase"));
  }
  Ok(phrase)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn collapses_inner_whitespace() {
    assert_eq!(
      normalize_phrase("  Por el eterno   descanso de ").unwrap(),
      "Por el eterno descanso de"
    );
  }

  #[test]
  fn rejects_blank() {
    assert!(normalize_phrase(" \t ").is_err());
  }
}
