//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{NaiveDate, NaiveDateTime};
use intenciones_core::{
  Entity, Error as DomainError,
  category::{CategoryKind, NewCategory},
  intention::{IntentionScope, IntentionUpdate, NewIntention},
  mass::{Mass, NewMass},
  setting::Setting,
  store::{ParishStore, StoreError as _},
  user::{NewUser, Role, User},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn domain(err: Error) -> DomainError {
  err.domain().cloned().unwrap_or_else(|| panic!("expected a domain error, got {err}"))
}

fn date(s: &str) -> NaiveDate { NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap() }

fn at(s: &str) -> NaiveDateTime {
  NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

async fn user(s: &SqliteStore, name: &str, role: Role) -> User {
  s.create_user(NewUser {
    username:      name.into(),
    password_hash: "$argon2id$v=19$stub".into(),
    role,
  })
  .await
  .unwrap()
}

async fn mass(s: &SqliteStore, day: &str, time: &str, period: &str) -> Mass {
  s.create_mass(NewMass::parse(day, time, period).unwrap()).await.unwrap()
}

/// A store seeded with one funcionario, one category, one phrase.
struct Fixture {
  store:       SqliteStore,
  staff:       User,
  category_id: i64,
  phrase_id:   i64,
}

async fn fixture() -> Fixture {
  let store = store().await;
  let staff = user(&store, "marta", Role::Funcionario).await;
  let category = store
    .create_category(NewCategory { name: "Difuntos".into(), ..Default::default() })
    .await
    .unwrap();
  let phrase = store.create_phrase("Por el eterno descanso de".into()).await.unwrap();
  Fixture { store, staff, category_id: category.id, phrase_id: phrase.id }
}

impl Fixture {
  fn intention(&self, mass_id: i64, petitions: &str) -> NewIntention {
    NewIntention {
      mass_id,
      category_id: self.category_id,
      offered_by: "Familia Rojas".into(),
      base_phrase_id: self.phrase_id,
      petitions: petitions.into(),
    }
  }

  async fn submit(&self, mass_id: i64, petitions: &str) -> i64 {
    self
      .store
      .create_intention(self.staff.id, self.intention(mass_id, petitions))
      .await
      .unwrap()
      .id
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn bootstrap_admin_only_on_empty_table() {
  let s = store().await;
  assert!(s.bootstrap_admin("admin".into(), "hash".into()).await.unwrap());
  assert!(!s.bootstrap_admin("other".into(), "hash".into()).await.unwrap());

  let users = s.list_users().await.unwrap();
  assert_eq!(users.len(), 1);
  assert_eq!(users[0].role, Role::Admin);
  assert!(users[0].active);
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
  let s = store().await;
  user(&s, "marta", Role::Funcionario).await;
  let err = s
    .create_user(NewUser {
      username:      " marta ".into(),
      password_hash: "hash".into(),
      role:          Role::Admin,
    })
    .await
    .unwrap_err();
  assert!(matches!(domain(err), DomainError::Duplicate { entity: Entity::User, .. }));
}

#[tokio::test]
async fn find_login_returns_hash() {
  let s = store().await;
  user(&s, "marta", Role::Funcionario).await;
  let creds = s.find_login("marta".into()).await.unwrap().unwrap();
  assert_eq!(creds.user.username, "marta");
  assert_eq!(creds.password_hash, "$argon2id$v=19$stub");
  assert!(s.find_login("nadie".into()).await.unwrap().is_none());
}

#[tokio::test]
async fn last_active_admin_cannot_be_deactivated() {
  let s = store().await;
  let first = user(&s, "ana", Role::Admin).await;
  let second = user(&s, "beto", Role::Admin).await;

  // With two active admins, one may switch the other off.
  let toggled = s.toggle_user(first.id, second.id).await.unwrap();
  assert!(!toggled.active);

  // `first` is now the only active admin.
  let err = s.toggle_user(second.id, first.id).await.unwrap_err();
  assert_eq!(domain(err), DomainError::LastActiveAdmin);

  let still = s.get_user(first.id).await.unwrap().unwrap();
  assert!(still.active);
}

#[tokio::test]
async fn nobody_deactivates_themselves() {
  let s = store().await;
  let a = user(&s, "ana", Role::Admin).await;
  user(&s, "beto", Role::Admin).await;
  let err = s.toggle_user(a.id, a.id).await.unwrap_err();
  assert_eq!(domain(err), DomainError::SelfDeactivation);
}

#[tokio::test]
async fn inactive_user_can_be_reactivated() {
  let s = store().await;
  let admin = user(&s, "ana", Role::Admin).await;
  let staff = user(&s, "marta", Role::Funcionario).await;
  assert!(!s.toggle_user(admin.id, staff.id).await.unwrap().active);
  assert!(s.toggle_user(admin.id, staff.id).await.unwrap().active);
}

#[tokio::test]
async fn delete_user_guards() {
  let f = fixture().await;
  let admin = user(&f.store, "ana", Role::Admin).await;
  let other_admin = user(&f.store, "beto", Role::Admin).await;

  let err = f.store.delete_user(admin.id, admin.id).await.unwrap_err();
  assert_eq!(domain(err), DomainError::SelfDeletion);

  let err = f.store.delete_user(admin.id, other_admin.id).await.unwrap_err();
  assert_eq!(domain(err), DomainError::AdminDeletion);

  let m = mass(&f.store, "2099-01-01", "0800", "AM").await;
  f.submit(m.id, "Juan").await;
  let err = f.store.delete_user(admin.id, f.staff.id).await.unwrap_err();
  assert!(matches!(domain(err), DomainError::StillReferenced { entity: Entity::User, count: 1 }));

  let idle = user(&f.store, "luis", Role::Funcionario).await;
  f.store.delete_user(admin.id, idle.id).await.unwrap();
  assert!(f.store.get_user(idle.id).await.unwrap().is_none());
}

// ─── Lookup tables ───────────────────────────────────────────────────────────

#[tokio::test]
async fn category_kind_is_resolved_and_re_resolved() {
  let s = store().await;
  let c = s
    .create_category(NewCategory { name: "Acción de gracias".into(), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(c.kind, CategoryKind::AccionDeGracias);

  let c = s
    .update_category(c.id, NewCategory { name: "Por los enfermos".into(), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(c.kind, CategoryKind::Salud);
  assert_eq!(s.list_categories(false).await.unwrap()[0].kind, CategoryKind::Salud);
}

#[tokio::test]
async fn categories_follow_display_order() {
  let s = store().await;
  for (name, order) in [("Varios", 3), ("Difuntos", 1), ("Salud", 2)] {
    s.create_category(NewCategory { name: name.into(), display_order: order, ..Default::default() })
      .await
      .unwrap();
  }
  let names: Vec<_> = s.list_categories(false).await.unwrap().into_iter().map(|c| c.name).collect();
  assert_eq!(names, ["Difuntos", "Salud", "Varios"]);
}

#[tokio::test]
async fn inactive_lookups_are_hidden_when_requested() {
  let s = store().await;
  let c = s
    .create_category(NewCategory { name: "Salud".into(), ..Default::default() })
    .await
    .unwrap();
  let p = s.create_phrase("Por la salud de".into()).await.unwrap();
  assert!(!s.toggle_category(c.id).await.unwrap().active);
  assert!(!s.toggle_phrase(p.id).await.unwrap().active);

  assert!(s.list_categories(true).await.unwrap().is_empty());
  assert!(s.list_phrases(true).await.unwrap().is_empty());
  assert_eq!(s.list_categories(false).await.unwrap().len(), 1);
  assert_eq!(s.list_phrases(false).await.unwrap().len(), 1);
}

#[tokio::test]
async fn phrase_uniqueness_ignores_case() {
  let s = store().await;
  s.create_phrase("Por el eterno descanso de".into()).await.unwrap();
  let err = s.create_phrase("POR EL ETERNO  DESCANSO DE".into()).await.unwrap_err();
  assert!(matches!(domain(err), DomainError::Duplicate { entity: Entity::BasePhrase, .. }));
  assert_eq!(s.list_phrases(false).await.unwrap().len(), 1);
}

#[tokio::test]
async fn referenced_rows_cannot_be_deleted() {
  let f = fixture().await;
  let m = mass(&f.store, "2099-01-01", "0800", "AM").await;
  f.submit(m.id, "Juan").await;

  let err = f.store.delete_category(f.category_id).await.unwrap_err();
  assert!(matches!(domain(err), DomainError::StillReferenced { entity: Entity::Category, .. }));
  let err = f.store.delete_phrase(f.phrase_id).await.unwrap_err();
  assert!(matches!(domain(err), DomainError::StillReferenced { entity: Entity::BasePhrase, .. }));
  let err = f.store.delete_mass(m.id).await.unwrap_err();
  assert!(matches!(domain(err), DomainError::StillReferenced { entity: Entity::Mass, .. }));

  assert_eq!(f.store.list_categories(false).await.unwrap().len(), 1);
  assert_eq!(f.store.list_phrases(false).await.unwrap().len(), 1);
  assert_eq!(f.store.list_masses().await.unwrap().len(), 1);
}

#[tokio::test]
async fn unreferenced_rows_can_be_deleted() {
  let f = fixture().await;
  let m = mass(&f.store, "2099-01-01", "0800", "AM").await;

  f.store.delete_mass(m.id).await.unwrap();
  f.store.delete_category(f.category_id).await.unwrap();
  f.store.delete_phrase(f.phrase_id).await.unwrap();

  assert!(f.store.list_masses().await.unwrap().is_empty());
  let err = f.store.delete_mass(m.id).await.unwrap_err();
  assert!(matches!(domain(err), DomainError::NotFound { entity: Entity::Mass, .. }));
}

// ─── Masses ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn masses_are_listed_chronologically() {
  let s = store().await;
  mass(&s, "2025-03-09", "0700", "PM").await;
  mass(&s, "2025-03-09", "1200", "PM").await;
  mass(&s, "2025-03-09", "0900", "AM").await;
  mass(&s, "2025-03-08", "0600", "PM").await;

  let labels: Vec<_> = s
    .masses_on(date("2025-03-09"))
    .await
    .unwrap()
    .iter()
    .map(Mass::time_label)
    .collect();
  assert_eq!(labels, ["09:00 AM", "12:00 PM", "07:00 PM"]);

  let all = s.list_masses().await.unwrap();
  assert_eq!(all.len(), 4);
  assert_eq!(all[0].date, date("2025-03-08"));
}

#[tokio::test]
async fn created_mass_time_is_normalised() {
  let s = store().await;
  let m = mass(&s, "2025-03-09", "0700", "AM").await;
  let stored = s.masses_on(date("2025-03-09")).await.unwrap();
  assert_eq!(stored[0].time.to_string(), "07:00");
  assert_eq!(stored[0].id, m.id);
}

// ─── Intentions ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_intention_rejects_unknown_or_inactive_references() {
  let f = fixture().await;
  let m = mass(&f.store, "2099-01-01", "0800", "AM").await;

  let err = f.store.create_intention(f.staff.id, f.intention(9999, "Juan")).await.unwrap_err();
  assert!(matches!(domain(err), DomainError::NotFound { entity: Entity::Mass, .. }));

  f.store.toggle_category(f.category_id).await.unwrap();
  let err = f.store.create_intention(f.staff.id, f.intention(m.id, "Juan")).await.unwrap_err();
  assert!(matches!(domain(err), DomainError::Inactive { entity: Entity::Category, .. }));

  let err = f.store.create_intention(f.staff.id, f.intention(m.id, "   ")).await.unwrap_err();
  assert_eq!(domain(err), DomainError::MissingField("peticiones"));

  assert!(f.store.list_intentions(IntentionScope::All).await.unwrap().is_empty());
}

#[tokio::test]
async fn owner_can_edit_before_mass() {
  let f = fixture().await;
  let m = mass(&f.store, "2025-03-09", "0700", "PM").await;
  let id = f.submit(m.id, "Juan").await;

  let update = IntentionUpdate {
    category_id:    f.category_id,
    offered_by:     "Familia Pérez".into(),
    base_phrase_id: f.phrase_id,
    petitions:      "Juan y María".into(),
  };
  // 18:59 is before a 7 PM Mass even though "07:00" < "18:59" lexically.
  let updated = f
    .store
    .update_intention(f.staff.id, id, update, at("2025-03-09 18:59"))
    .await
    .unwrap();
  assert_eq!(updated.petitions, "Juan y María");
  assert_eq!(updated.updated_at, at("2025-03-09 18:59"));
}

#[tokio::test]
async fn edit_after_mass_is_rejected_and_row_unchanged() {
  let f = fixture().await;
  let m = mass(&f.store, "2025-03-09", "0700", "AM").await;
  let id = f.submit(m.id, "Juan").await;
  let before = f.store.get_intention(id).await.unwrap().unwrap();

  let update = IntentionUpdate {
    category_id:    f.category_id,
    offered_by:     "Otro".into(),
    base_phrase_id: f.phrase_id,
    petitions:      "Cambiado".into(),
  };
  let err = f
    .store
    .update_intention(f.staff.id, id, update, at("2025-03-09 07:01"))
    .await
    .unwrap_err();
  assert_eq!(domain(err), DomainError::MassAlreadyHappened);

  let after = f.store.get_intention(id).await.unwrap().unwrap();
  assert_eq!(after.intention, before.intention);
}

#[tokio::test]
async fn edit_may_keep_a_since_deactivated_category() {
  let f = fixture().await;
  let m = mass(&f.store, "2099-01-01", "0800", "AM").await;
  let id = f.submit(m.id, "Juan").await;
  f.store.toggle_category(f.category_id).await.unwrap();
  f.store.toggle_phrase(f.phrase_id).await.unwrap();

  let keep = IntentionUpdate {
    category_id:    f.category_id,
    offered_by:     "Familia Pérez".into(),
    base_phrase_id: f.phrase_id,
    petitions:      "Juan y Ana".into(),
  };
  let updated = f
    .store
    .update_intention(f.staff.id, id, keep, at("2098-12-31 10:00"))
    .await
    .unwrap();
  assert_eq!(updated.category_id, f.category_id);
  assert_eq!(updated.petitions, "Juan y Ana");

  // Switching to another inactive category is still refused.
  let other = f
    .store
    .create_category(NewCategory { name: "Salud".into(), ..Default::default() })
    .await
    .unwrap();
  f.store.toggle_category(other.id).await.unwrap();
  let switch = IntentionUpdate {
    category_id:    other.id,
    offered_by:     "Familia Pérez".into(),
    base_phrase_id: f.phrase_id,
    petitions:      "Juan y Ana".into(),
  };
  let err = f
    .store
    .update_intention(f.staff.id, id, switch, at("2098-12-31 10:00"))
    .await
    .unwrap_err();
  assert!(matches!(domain(err), DomainError::Inactive { entity: Entity::Category, .. }));
}

#[tokio::test]
async fn only_owner_may_edit() {
  let f = fixture().await;
  let intruder = user(&f.store, "pedro", Role::Funcionario).await;
  let m = mass(&f.store, "2099-01-01", "0800", "AM").await;
  let id = f.submit(m.id, "Juan").await;

  let update = IntentionUpdate {
    category_id:    f.category_id,
    offered_by:     "x".into(),
    base_phrase_id: f.phrase_id,
    petitions:      "y".into(),
  };
  let err = f
    .store
    .update_intention(intruder.id, id, update, at("2025-01-01 00:00"))
    .await
    .unwrap_err();
  let err = domain(err);
  assert_eq!(err, DomainError::NotOwner);
  assert!(err.is_forbidden());
}

#[tokio::test]
async fn listing_is_scoped_to_submitter() {
  let f = fixture().await;
  let other = user(&f.store, "pedro", Role::Funcionario).await;
  let m = mass(&f.store, "2099-01-01", "0800", "AM").await;
  f.submit(m.id, "Juan").await;
  f.store.create_intention(other.id, f.intention(m.id, "Ana")).await.unwrap();

  assert_eq!(f.store.list_intentions(IntentionScope::All).await.unwrap().len(), 2);
  let mine = f.store.list_intentions(IntentionScope::SubmittedBy(f.staff.id)).await.unwrap();
  assert_eq!(mine.len(), 1);
  assert_eq!(mine[0].submitter, "marta");
  assert_eq!(mine[0].category.name, "Difuntos");
  assert_eq!(mine[0].base_phrase, "Por el eterno descanso de");
}

#[tokio::test]
async fn range_is_inclusive_and_chronological() {
  let f = fixture().await;
  let before = mass(&f.store, "2025-03-07", "0800", "AM").await;
  let evening = mass(&f.store, "2025-03-08", "0700", "PM").await;
  let noon = mass(&f.store, "2025-03-08", "1200", "PM").await;
  let last = mass(&f.store, "2025-03-09", "0800", "AM").await;
  let after = mass(&f.store, "2025-03-10", "0800", "AM").await;

  for m in [&after, &evening, &before, &last, &noon] {
    f.submit(m.id, &format!("misa {}", m.id)).await;
  }

  let rows = f
    .store
    .intentions_between(IntentionScope::All, date("2025-03-08"), date("2025-03-09"))
    .await
    .unwrap();
  let masses: Vec<_> = rows.iter().map(|r| r.mass.id).collect();
  assert_eq!(masses, [noon.id, evening.id, last.id]);
}

// ─── Bulk deletion ───────────────────────────────────────────────────────────

#[tokio::test]
async fn purge_advances_watermark() {
  let f = fixture().await;
  let old = mass(&f.store, "2025-01-10", "0800", "AM").await;
  let mid = mass(&f.store, "2025-02-10", "0800", "AM").await;
  let new = mass(&f.store, "2025-03-10", "0800", "AM").await;
  for m in [&old, &mid, &new] {
    f.submit(m.id, "Juan").await;
  }

  let first = f.store.purge_intentions_through(date("2025-01-31")).await.unwrap();
  assert_eq!(first.from, date("0001-01-01"));
  assert_eq!(first.deleted, 1);
  assert_eq!(
    f.store.get_setting(Setting::LastDeletion).await.unwrap().as_deref(),
    Some("2025-01-31")
  );

  let second = f.store.purge_intentions_through(date("2025-02-28")).await.unwrap();
  assert_eq!(second.from, date("2025-01-31"));
  assert_eq!(second.deleted, 1);

  let left = f.store.list_intentions(IntentionScope::All).await.unwrap();
  assert_eq!(left.len(), 1);
  assert_eq!(left[0].mass.id, new.id);

  let err = f.store.purge_intentions_through(date("2025-01-01")).await.unwrap_err();
  assert!(matches!(domain(err), DomainError::PurgeBeforeWatermark { .. }));
}

// ─── Settings ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn settings_upsert() {
  let s = store().await;
  assert!(s.get_setting(Setting::PdfPreface).await.unwrap().is_none());
  s.put_setting(Setting::PdfPreface, "Primera".into()).await.unwrap();
  s.put_setting(Setting::PdfPreface, "Segunda".into()).await.unwrap();
  assert_eq!(s.get_setting(Setting::PdfPreface).await.unwrap().as_deref(), Some("Segunda"));
}
