//! The `ParishStore` trait and supporting types.
//!
//! Implemented by storage backends (`intenciones-store-sqlite`). The web
//! layer depends on this abstraction, not on a concrete backend.

use std::future::Future;

use chrono::{NaiveDate, NaiveDateTime};

use crate::{
  category::{Category, CategoryId, NewCategory},
  intention::{Intention, IntentionId, IntentionRow, IntentionScope, IntentionUpdate, NewIntention},
  mass::{Mass, MassId, NewMass},
  phrase::{BasePhrase, PhraseId},
  setting::Setting,
  user::{NewUser, User, UserCredentials, UserId},
};

/// Backend errors expose the domain failure they carry, if any, so callers
/// can tell a rejected request from a broken database.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn domain(&self) -> Option<&crate::Error>;
}

/// Outcome of [`ParishStore::purge_intentions_through`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeSummary {
  /// Previous watermark (or `0001-01-01`).
  pub from:    NaiveDate,
  pub through: NaiveDate,
  pub deleted: usize,
}

/// Abstraction over a parish intention store backend.
///
/// Guarded operations (deletes, toggles, edits) check their preconditions
/// before mutating anything and fail with a domain error otherwise.
pub trait ParishStore: Send + Sync {
  type Error: StoreError;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Insert an active admin if and only if there are no users yet.
  /// Returns `true` when the admin was created.
  fn bootstrap_admin(
    &self,
    username: String,
    password_hash: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Look up a user and password hash by username, active or not.
  fn find_login(
    &self,
    username: String,
  ) -> impl Future<Output = Result<Option<UserCredentials>, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: UserId,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// All users ordered by username.
  fn list_users(&self) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Flip a user's `active` flag on behalf of `actor`.
  ///
  /// Nobody may deactivate themselves, and the last active admin may not be
  /// deactivated.
  fn toggle_user(
    &self,
    actor: UserId,
    id: UserId,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Delete a funcionario account. Admins, the actor themselves, and users
  /// that still own intentions cannot be deleted.
  fn delete_user(
    &self,
    actor: UserId,
    id: UserId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn set_password(
    &self,
    id: UserId,
    password_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Categories ────────────────────────────────────────────────────────

  fn create_category(
    &self,
    input: NewCategory,
  ) -> impl Future<Output = Result<Category, Self::Error>> + Send + '_;

  /// Replace a category's editable fields; the layout kind is re-resolved
  /// from the new name.
  fn update_category(
    &self,
    id: CategoryId,
    input: NewCategory,
  ) -> impl Future<Output = Result<Category, Self::Error>> + Send + '_;

  /// Ordered by display order, then name.
  fn list_categories(
    &self,
    active_only: bool,
  ) -> impl Future<Output = Result<Vec<Category>, Self::Error>> + Send + '_;

  fn toggle_category(
    &self,
    id: CategoryId,
  ) -> impl Future<Output = Result<Category, Self::Error>> + Send + '_;

  fn delete_category(
    &self,
    id: CategoryId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Base phrases ──────────────────────────────────────────────────────

  fn create_phrase(
    &self,
    phrase: String,
  ) -> impl Future<Output = Result<BasePhrase, Self::Error>> + Send + '_;

  fn list_phrases(
    &self,
    active_only: bool,
  ) -> impl Future<Output = Result<Vec<BasePhrase>, Self::Error>> + Send + '_;

  fn toggle_phrase(
    &self,
    id: PhraseId,
  ) -> impl Future<Output = Result<BasePhrase, Self::Error>> + Send + '_;

  fn delete_phrase(
    &self,
    id: PhraseId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Masses ────────────────────────────────────────────────────────────

  fn create_mass(
    &self,
    input: NewMass,
  ) -> impl Future<Output = Result<Mass, Self::Error>> + Send + '_;

  /// Every Mass in chronological order.
  fn list_masses(&self) -> impl Future<Output = Result<Vec<Mass>, Self::Error>> + Send + '_;

  /// Masses on `date` in chronological order.
  fn masses_on(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<Mass>, Self::Error>> + Send + '_;

  fn delete_mass(
    &self,
    id: MassId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Intentions ────────────────────────────────────────────────────────

  /// Validate and persist a new intention; timestamps are set by the store.
  fn create_intention(
    &self,
    submitted_by: UserId,
    input: NewIntention,
  ) -> impl Future<Output = Result<Intention, Self::Error>> + Send + '_;

  fn get_intention(
    &self,
    id: IntentionId,
  ) -> impl Future<Output = Result<Option<IntentionRow>, Self::Error>> + Send + '_;

  /// Apply an owner's edit, provided `now` is not past the Mass's start.
  fn update_intention(
    &self,
    actor: UserId,
    id: IntentionId,
    input: IntentionUpdate,
    now: NaiveDateTime,
  ) -> impl Future<Output = Result<Intention, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_intentions(
    &self,
    scope: IntentionScope,
  ) -> impl Future<Output = Result<Vec<IntentionRow>, Self::Error>> + Send + '_;

  /// Intentions whose Mass date lies in `[from, to]`, in Mass date/time
  /// order, then submission order.
  fn intentions_between(
    &self,
    scope: IntentionScope,
    from: NaiveDate,
    to: NaiveDate,
  ) -> impl Future<Output = Result<Vec<IntentionRow>, Self::Error>> + Send + '_;

  /// Delete every intention whose Mass date lies between the last-deletion
  /// watermark and `through`, then advance the watermark to `through`.
  fn purge_intentions_through(
    &self,
    through: NaiveDate,
  ) -> impl Future<Output = Result<PurgeSummary, Self::Error>> + Send + '_;

  // ── Settings ──────────────────────────────────────────────────────────

  fn get_setting(
    &self,
    key: Setting,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  fn put_setting(
    &self,
    key: Setting,
    value: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
