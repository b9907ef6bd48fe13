//! The `CallStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `impf-store-sqlite`).
//! The coordinator depends on this abstraction, not on any concrete backend.
//!
//! Every capacity-sensitive read-modify-write ([`CallStore::invite_next`],
//! [`CallStore::accept_latest`]) is a single method so the backend can run
//! the count and the write inside one transaction.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  call::{Call, NewCall},
  invitation::{AcceptOutcome, Invitation},
  person::{NewPerson, Person},
};

/// Abstraction over the person directory, call registry and invitation
/// ledger.
///
/// Backend errors convert into [`crate::Error`]; a backend maps constraint
/// violations it can recognise (e.g. a duplicate phone) to
/// [`crate::Error::Validation`] and everything else to
/// [`crate::Error::Storage`].
pub trait CallStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static + Into<crate::Error>;

  // ── Person directory ──────────────────────────────────────────────────

  /// Persist one validated person. `now` becomes `registered_at`.
  fn add_person(
    &self,
    input: NewPerson,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Persist a batch in one transaction; nothing is written if any row fails.
  fn add_persons(
    &self,
    inputs: Vec<NewPerson>,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  fn get_person<'a>(
    &'a self,
    phone: &'a str,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + 'a;

  fn list_persons(&self) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  /// Remove a person. Returns `false` if no such phone was registered.
  /// Invitation rows are left untouched.
  fn delete_person<'a>(
    &'a self,
    phone: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Call registry ─────────────────────────────────────────────────────

  /// Persist one validated call. `now` becomes `created_at`.
  fn add_call(
    &self,
    input: NewCall,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Call, Self::Error>> + Send + '_;

  fn get_call(
    &self,
    call_id: Uuid,
  ) -> impl Future<Output = Result<Option<Call>, Self::Error>> + Send + '_;

  /// Every stored call, ordered by start time.
  fn list_calls(&self) -> impl Future<Output = Result<Vec<Call>, Self::Error>> + Send + '_;

  /// Calls with `time_end > now`, ordered by start time.
  fn list_active_calls(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<Call>, Self::Error>> + Send + '_;

  /// Delete every call with `time_end < now`; returns the number removed.
  /// Invitations referencing them remain.
  fn delete_expired_calls(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Invitation ledger: reads ─────────────────────────────────────────

  fn accepted_count(
    &self,
    call_id: Uuid,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// `accepted` rows for a call, oldest first.
  fn accepted_invitations(
    &self,
    call_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Invitation>, Self::Error>> + Send + '_;

  /// Registered persons holding an `accepted` row for the call.
  fn accepted_persons(
    &self,
    call_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  /// The whole ledger, oldest first.
  fn list_invitations(
    &self,
  ) -> impl Future<Output = Result<Vec<Invitation>, Self::Error>> + Send + '_;

  /// All rows for one phone, newest first.
  fn invitations_for_phone<'a>(
    &'a self,
    phone: &'a str,
  ) -> impl Future<Output = Result<Vec<Invitation>, Self::Error>> + Send + 'a;

  // ── Candidate selection ───────────────────────────────────────────────

  /// The next `limit` eligible persons for `call`, lowest group first.
  ///
  /// Eligible: age within `[age_min, age_max]`, not vaccinated, and no
  /// invitation row for `(phone, call)` in any status. Within a group the
  /// order is registration time, then phone. Read-only.
  fn select_candidates<'a>(
    &'a self,
    call: &'a Call,
    limit: i64,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + 'a;

  // ── Invitation ledger: capacity-sensitive writes ─────────────────────

  /// Atomically compute `capacity - accepted` for the call, select that many
  /// candidates, and insert a `notified` row stamped `now` for each.
  ///
  /// Returns the created rows. Empty if the call is full, gone, or nobody is
  /// eligible.
  fn invite_next(
    &self,
    call_id: Uuid,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<Invitation>, Self::Error>> + Send + '_;

  /// Atomically resolve the newest invitation for `phone` and decide it:
  /// grant the seat if the call has room, otherwise reject.
  ///
  /// The `notified → accepted` write is conditioned on the row still being
  /// `notified`, so duplicate replies are harmless.
  fn accept_latest<'a>(
    &'a self,
    phone: &'a str,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<AcceptOutcome, Self::Error>> + Send + 'a;

  /// Move every `accepted` row for `phone` to `cancelled`, stamping `now`.
  /// Returns the number of rows changed.
  fn cancel_accepted<'a>(
    &'a self,
    phone: &'a str,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;
}
