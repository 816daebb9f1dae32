//! One-shot messages carried in the session until the next page render.

use serde::{Deserialize, Serialize};
use tower_sessions::{Session, session};

const KEY: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
  Success,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
  pub level:   Level,
  pub message: String,
}

pub async fn push(
  session: &Session,
  level: Level,
  message: impl Into<String>,
) -> Result<(), session::Error> {
  let mut queue: Vec<Flash> = session.get(KEY).await?.unwrap_or_default();
  queue.push(Flash { level, message: message.into() });
  session.insert(KEY, queue).await
}

/// Drain every pending message.
pub async fn take(session: &Session) -> Result<Vec<Flash>, session::Error> {
  Ok(session.remove::<Vec<Flash>>(KEY).await?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use tower_sessions::MemoryStore;

  use super::*;

  #[tokio::test]
  async fn messages_are_drained_once() {
    let session = Session::new(None, Arc::new(MemoryStore::default()), None);
    push(&session, Level::Error, "uno").await.unwrap();
    push(&session, Level::Success, "dos").await.unwrap();

    let drained = take(&session).await.unwrap();
    assert_eq!(drained.len(), 2);
    assert_eq!(drained[0].message, "uno");
    assert_eq!(drained[1].level, Level::Success);
    assert!(take(&session).await.unwrap().is_empty());
  }
}
