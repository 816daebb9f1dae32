//! Staff accounts and roles.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub type UserId = i64;

/// What a signed-in user is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  /// Manages every table and runs bulk operations.
  Admin,
  /// Submits and edits only their own intentions.
  Funcionario,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Role::Admin => "admin",
      Role::Funcionario => "funcionario",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "admin" => Ok(Role::Admin),
      "funcionario" => Ok(Role::Funcionario),
      other => Err(Error::UnknownRole(other.to_owned())),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:       UserId,
  pub username: String,
  pub role:     Role,
  pub active:   bool,
}

impl User {
  pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

/// A user together with the stored argon2 PHC string, as needed at login.
#[derive(Debug, Clone)]
pub struct UserCredentials {
  pub user:          User,
  pub password_hash: String,
}

/// Input for [`ParishStore::create_user`](crate::store::ParishStore::create_user).
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  /// Already hashed; the store never sees plain passwords.
  pub password_hash: String,
  pub role:          Role,
}

impl NewUser {
  /// Trim the username and reject blank input.
  pub fn validate(mut self) -> Result<Self> {
    self.username = self.username.trim().to_owned();
    if self.username.is_empty() {
      return Err(Error::MissingField("usuario"));
    }
    if self.password_hash.is_empty() {
      return Err(Error::MissingField("contraseña"));
    }
    Ok(self)
  }
}
