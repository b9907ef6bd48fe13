//! [`SqliteStore`]: the SQLite implementation of [`CallStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use impf_core::{
  call::{Call, NewCall},
  invitation::{AcceptOutcome, Invitation, InvitationStatus},
  person::{NewPerson, Person},
  store::CallStore,
};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use tracing::debug;
use uuid::Uuid;

use crate::{
  encode::{
    CALL_COLUMNS, INVITATION_COLUMNS, PERSON_COLUMNS, RawCall, RawInvitation, RawPerson,
    encode_dt, encode_uuid, storable,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A call coordinator store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mainly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_persons(
    &self,
    sql: String,
    param: Option<String>,
  ) -> Result<Vec<Person>> {
    let raws: Vec<RawPerson> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = match param {
          Some(p) => stmt.query_map(rusqlite::params![p], RawPerson::from_row)?,
          None => stmt.query_map([], RawPerson::from_row)?,
        }
        .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }

  async fn query_calls(&self, sql: String, param: Option<String>) -> Result<Vec<Call>> {
    let raws: Vec<RawCall> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = match param {
          Some(p) => stmt.query_map(rusqlite::params![p], RawCall::from_row)?,
          None => stmt.query_map([], RawCall::from_row)?,
        }
        .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCall::into_call).collect()
  }

  async fn query_invitations(
    &self,
    sql: String,
    param: Option<String>,
  ) -> Result<Vec<Invitation>> {
    let raws: Vec<RawInvitation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = match param {
          Some(p) => stmt.query_map(rusqlite::params![p], RawInvitation::from_row)?,
          None => stmt.query_map([], RawInvitation::from_row)?,
        }
        .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawInvitation::into_invitation).collect()
  }
}

// ─── SQL helpers (run on the connection thread) ─────────────────────────────

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  use rusqlite::ffi::{SQLITE_CONSTRAINT_PRIMARYKEY, SQLITE_CONSTRAINT_UNIQUE};
  matches!(
    e,
    rusqlite::Error::SqliteFailure(f, _)
      if f.extended_code == SQLITE_CONSTRAINT_PRIMARYKEY
        || f.extended_code == SQLITE_CONSTRAINT_UNIQUE
  )
}

/// Insert one person; `Ok(false)` if the phone is already taken.
fn insert_person(
  conn: &rusqlite::Connection,
  p: &NewPerson,
  registered_at: &str,
) -> rusqlite::Result<bool> {
  let res = conn.execute(
    "INSERT INTO persons (phone, center_id, group_num, age, vaccinated, registered_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![p.phone, p.center_id, p.group, p.age, p.vaccinated, registered_at],
  );
  match res {
    Ok(_) => Ok(true),
    Err(e) if is_unique_violation(&e) => Ok(false),
    Err(e) => Err(e),
  }
}

fn find_call(conn: &rusqlite::Connection, call_id: &str) -> rusqlite::Result<Option<RawCall>> {
  conn
    .query_row(
      &format!("SELECT {CALL_COLUMNS} FROM calls c WHERE c.call_id = ?1"),
      rusqlite::params![call_id],
      RawCall::from_row,
    )
    .optional()
}

fn count_accepted(conn: &rusqlite::Connection, call_id: &str) -> rusqlite::Result<i64> {
  conn.query_row(
    "SELECT COUNT(*) FROM invitations WHERE call_id = ?1 AND status = 'accepted'",
    rusqlite::params![call_id],
    |r| r.get(0),
  )
}

/// The candidate selector. Ordering inside a group is first-registered
/// first, with the phone number as a final tie-break.
fn candidates(
  conn: &rusqlite::Connection,
  call_id: &str,
  age_min: i64,
  age_max: i64,
  limit: i64,
) -> rusqlite::Result<Vec<RawPerson>> {
  let mut stmt = conn.prepare_cached(&format!(
    "SELECT {PERSON_COLUMNS}
     FROM persons p
     WHERE p.vaccinated = 0
       AND p.age BETWEEN ?2 AND ?3
       AND NOT EXISTS (
         SELECT 1 FROM invitations i
         WHERE i.phone = p.phone AND i.call_id = ?1
       )
     ORDER BY p.group_num ASC, p.registered_at ASC, p.phone ASC
     LIMIT ?4"
  ))?;
  let rows = stmt
    .query_map(
      rusqlite::params![call_id, age_min, age_max, limit],
      RawPerson::from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// What [`CallStore::accept_latest`] decided on the connection thread.
enum RawAccept {
  NoInvitation,
  AlreadyHandled(RawInvitation),
  Decided {
    invitation: RawInvitation,
    call:       Option<RawCall>,
    granted:    bool,
  },
}

// ─── CallStore impl ──────────────────────────────────────────────────────────

impl CallStore for SqliteStore {
  type Error = Error;

  // ── Person directory ──────────────────────────────────────────────────────

  async fn add_person(&self, input: NewPerson, now: DateTime<Utc>) -> Result<Person> {
    let registered_at = storable(now);
    let at_str = encode_dt(registered_at);
    let row = input.clone();

    let inserted = self
      .conn
      .call(move |conn| Ok(insert_person(conn, &row, &at_str)?))
      .await?;

    if !inserted {
      return Err(Error::DuplicatePhone(input.phone));
    }

    Ok(Person {
      phone: input.phone,
      center_id: input.center_id,
      group: input.group,
      age: input.age,
      vaccinated: input.vaccinated,
      registered_at,
    })
  }

  async fn add_persons(&self, inputs: Vec<NewPerson>, now: DateTime<Utc>) -> Result<Vec<Person>> {
    let registered_at = storable(now);
    let at_str = encode_dt(registered_at);
    let rows = inputs.clone();

    // `Some(phone)` names the first duplicate; the transaction is then
    // dropped and rolls back.
    let duplicate: Option<String> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for p in &rows {
          if !insert_person(&tx, p, &at_str)? {
            return Ok(Some(p.phone.clone()));
          }
        }
        tx.commit()?;
        Ok(None)
      })
      .await?;

    if let Some(phone) = duplicate {
      return Err(Error::DuplicatePhone(phone));
    }

    debug!(count = inputs.len(), "persons imported");

    Ok(
      inputs
        .into_iter()
        .map(|p| Person {
          phone: p.phone,
          center_id: p.center_id,
          group: p.group,
          age: p.age,
          vaccinated: p.vaccinated,
          registered_at,
        })
        .collect(),
    )
  }

  async fn get_person(&self, phone: &str) -> Result<Option<Person>> {
    let mut found = self
      .query_persons(
        format!("SELECT {PERSON_COLUMNS} FROM persons p WHERE p.phone = ?1"),
        Some(phone.to_owned()),
      )
      .await?;
    Ok(found.pop())
  }

  async fn list_persons(&self) -> Result<Vec<Person>> {
    self
      .query_persons(
        format!(
          "SELECT {PERSON_COLUMNS} FROM persons p
           ORDER BY p.group_num, p.registered_at, p.phone"
        ),
        None,
      )
      .await
  }

  async fn delete_person(&self, phone: &str) -> Result<bool> {
    let phone = phone.to_owned();
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM persons WHERE phone = ?1", rusqlite::params![phone])?)
      })
      .await?;
    Ok(removed > 0)
  }

  // ── Call registry ─────────────────────────────────────────────────────────

  async fn add_call(&self, input: NewCall, now: DateTime<Utc>) -> Result<Call> {
    let call = Call {
      call_id:    Uuid::new_v4(),
      title:      input.title,
      center_id:  input.center_id,
      capacity:   input.capacity,
      time_start: storable(input.time_start),
      time_end:   storable(input.time_end),
      age_min:    input.age_min,
      age_max:    input.age_max,
      location:   input.location,
      created_at: storable(now),
    };

    let id_str    = encode_uuid(call.call_id);
    let start_str = encode_dt(call.time_start);
    let end_str   = encode_dt(call.time_end);
    let at_str    = encode_dt(call.created_at);
    let row       = call.clone();

    self
      .conn
      .call(move |conn| {
        let loc = &row.location;
        conn.execute(
          "INSERT INTO calls (
             call_id, title, center_id, capacity, time_start, time_end,
             age_min, age_max, loc_name, loc_street, loc_house_number,
             loc_postcode, loc_city, loc_extra, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
          rusqlite::params![
            id_str,
            row.title,
            row.center_id,
            row.capacity,
            start_str,
            end_str,
            row.age_min,
            row.age_max,
            loc.name,
            loc.street,
            loc.house_number,
            loc.postcode,
            loc.city,
            loc.extra,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(call)
  }

  async fn get_call(&self, call_id: Uuid) -> Result<Option<Call>> {
    let id_str = encode_uuid(call_id);
    let raw = self.conn.call(move |conn| Ok(find_call(conn, &id_str)?)).await?;
    raw.map(RawCall::into_call).transpose()
  }

  async fn list_calls(&self) -> Result<Vec<Call>> {
    self
      .query_calls(
        format!("SELECT {CALL_COLUMNS} FROM calls c ORDER BY c.time_start, c.created_at"),
        None,
      )
      .await
  }

  async fn list_active_calls(&self, now: DateTime<Utc>) -> Result<Vec<Call>> {
    self
      .query_calls(
        format!(
          "SELECT {CALL_COLUMNS} FROM calls c
           WHERE c.time_end > ?1
           ORDER BY c.time_start, c.created_at"
        ),
        Some(encode_dt(now)),
      )
      .await
  }

  async fn delete_expired_calls(&self, now: DateTime<Utc>) -> Result<u64> {
    let now_str = encode_dt(now);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM calls WHERE time_end < ?1", rusqlite::params![now_str])?)
      })
      .await?;
    Ok(removed as u64)
  }

  // ── Invitation ledger: reads ─────────────────────────────────────────────

  async fn accepted_count(&self, call_id: Uuid) -> Result<i64> {
    let id_str = encode_uuid(call_id);
    Ok(self.conn.call(move |conn| Ok(count_accepted(conn, &id_str)?)).await?)
  }

  async fn accepted_invitations(&self, call_id: Uuid) -> Result<Vec<Invitation>> {
    self
      .query_invitations(
        format!(
          "SELECT {INVITATION_COLUMNS} FROM invitations i
           WHERE i.call_id = ?1 AND i.status = 'accepted'
           ORDER BY i.time, i.rowid"
        ),
        Some(encode_uuid(call_id)),
      )
      .await
  }

  async fn accepted_persons(&self, call_id: Uuid) -> Result<Vec<Person>> {
    self
      .query_persons(
        format!(
          "SELECT {PERSON_COLUMNS} FROM persons p
           JOIN invitations i ON i.phone = p.phone
           WHERE i.call_id = ?1 AND i.status = 'accepted'
           ORDER BY i.time, i.rowid"
        ),
        Some(encode_uuid(call_id)),
      )
      .await
  }

  async fn list_invitations(&self) -> Result<Vec<Invitation>> {
    self
      .query_invitations(
        format!("SELECT {INVITATION_COLUMNS} FROM invitations i ORDER BY i.time, i.rowid"),
        None,
      )
      .await
  }

  async fn invitations_for_phone(&self, phone: &str) -> Result<Vec<Invitation>> {
    self
      .query_invitations(
        format!(
          "SELECT {INVITATION_COLUMNS} FROM invitations i
           WHERE i.phone = ?1
           ORDER BY i.time DESC, i.rowid DESC"
        ),
        Some(phone.to_owned()),
      )
      .await
  }

  // ── Candidate selection ───────────────────────────────────────────────────

  async fn select_candidates(&self, call: &Call, limit: i64) -> Result<Vec<Person>> {
    if limit <= 0 {
      return Ok(Vec::new());
    }
    let id_str = encode_uuid(call.call_id);
    let (age_min, age_max) = (call.age_min, call.age_max);

    let raws = self
      .conn
      .call(move |conn| Ok(candidates(conn, &id_str, age_min, age_max, limit)?))
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }

  // ── Invitation ledger: capacity-sensitive writes ─────────────────────────

  async fn invite_next(&self, call_id: Uuid, now: DateTime<Utc>) -> Result<Vec<Invitation>> {
    let id_str = encode_uuid(call_id);
    let time   = storable(now);
    let now_str = encode_dt(time);

    // (invitation_id, phone) pairs of the rows written.
    let created: Vec<(Uuid, String)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(call) = find_call(&tx, &id_str)? else {
          return Ok(Vec::new());
        };
        let deficit = call.capacity - count_accepted(&tx, &id_str)?;
        if deficit <= 0 {
          return Ok(Vec::new());
        }

        let chosen = candidates(&tx, &id_str, call.age_min, call.age_max, deficit)?;
        let mut created = Vec::with_capacity(chosen.len());
        for person in chosen {
          let invitation_id = Uuid::new_v4();
          tx.execute(
            "INSERT INTO invitations (invitation_id, phone, call_id, status, time)
             VALUES (?1, ?2, ?3, 'notified', ?4)",
            rusqlite::params![encode_uuid(invitation_id), person.phone, id_str, now_str],
          )?;
          created.push((invitation_id, person.phone));
        }

        tx.commit()?;
        Ok(created)
      })
      .await?;

    Ok(
      created
        .into_iter()
        .map(|(invitation_id, phone)| Invitation {
          invitation_id,
          phone,
          call_id,
          status: InvitationStatus::Notified,
          time,
        })
        .collect(),
    )
  }

  async fn accept_latest(&self, phone: &str, now: DateTime<Utc>) -> Result<AcceptOutcome> {
    let phone   = phone.to_owned();
    let time    = storable(now);
    let now_str = encode_dt(time);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let latest = tx
          .query_row(
            &format!(
              "SELECT {INVITATION_COLUMNS} FROM invitations i
               WHERE i.phone = ?1
               ORDER BY i.status = ?2 ASC, i.time DESC, i.rowid DESC
               LIMIT 1"
            ),
            rusqlite::params![phone, InvitationStatus::Cancelled.as_str()],
            RawInvitation::from_row,
          )
          .optional()?;

        let Some(mut invitation) = latest else {
          return Ok(RawAccept::NoInvitation);
        };
        let current = invitation
          .status
          .parse::<InvitationStatus>()
          .ok()
          .filter(|s| s.can_become(InvitationStatus::Accepted));
        let Some(current) = current else {
          return Ok(RawAccept::AlreadyHandled(invitation));
        };

        let call = find_call(&tx, &invitation.call_id)?;
        let granted = match &call {
          Some(c) => count_accepted(&tx, &invitation.call_id)? < c.capacity,
          None => false,
        };
        let next = if granted {
          InvitationStatus::Accepted
        } else {
          InvitationStatus::Rejected
        };
        debug_assert!(current.can_become(next), "{current} -> {next}");

        let changed = tx.execute(
          "UPDATE invitations SET status = ?1, time = ?2
           WHERE invitation_id = ?3 AND status = ?4",
          rusqlite::params![
            next.as_str(),
            now_str,
            invitation.invitation_id,
            current.as_str()
          ],
        )?;
        if changed == 0 {
          return Ok(RawAccept::AlreadyHandled(invitation));
        }
        tx.commit()?;

        invitation.status = next.as_str().to_owned();
        invitation.time = now_str;
        Ok(RawAccept::Decided { invitation, call, granted })
      })
      .await?;

    Ok(match raw {
      RawAccept::NoInvitation => AcceptOutcome::NoInvitation,
      RawAccept::AlreadyHandled(inv) => AcceptOutcome::AlreadyHandled {
        invitation: inv.into_invitation()?,
      },
      RawAccept::Decided { invitation, call: None, .. } => AcceptOutcome::CallClosed {
        invitation: invitation.into_invitation()?,
      },
      RawAccept::Decided { invitation, call: Some(call), granted: true } => {
        AcceptOutcome::Accepted {
          invitation: invitation.into_invitation()?,
          call:       call.into_call()?,
        }
      }
      RawAccept::Decided { invitation, call: Some(call), granted: false } => AcceptOutcome::Full {
        invitation: invitation.into_invitation()?,
        call:       call.into_call()?,
      },
    })
  }

  async fn cancel_accepted(&self, phone: &str, now: DateTime<Utc>) -> Result<u64> {
    let phone   = phone.to_owned();
    let now_str = encode_dt(storable(now));

    let changed = self
      .conn
      .call(move |conn| {
        let (from, to) = (InvitationStatus::Accepted, InvitationStatus::Cancelled);
        debug_assert!(from.can_become(to));
        Ok(conn.execute(
          "UPDATE invitations SET status = ?1, time = ?2
           WHERE phone = ?3 AND status = ?4",
          rusqlite::params![to.as_str(), now_str, phone, from.as_str()],
        )?)
      })
      .await?;
    Ok(changed as u64)
  }
}
