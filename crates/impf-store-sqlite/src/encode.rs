//! Encoding and decoding helpers between domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that lexical comparison in SQL matches
//! chronological order. UUIDs are stored as hyphenated lowercase strings.

use std::str::FromStr as _;

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use impf_core::{
  call::{Call, Location},
  invitation::{Invitation, InvitationStatus},
  person::Person,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

/// Drop precision the column cannot hold, so values handed back to callers
/// equal what a later read returns.
pub fn storable(dt: DateTime<Utc>) -> DateTime<Utc> { dt.trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── InvitationStatus ─────────────────────────────────────────────────────────

pub fn decode_status(s: &str) -> Result<InvitationStatus> {
  InvitationStatus::from_str(s).map_err(|_| Error::Decode(format!("unknown status: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const PERSON_COLUMNS: &str =
  "p.phone, p.center_id, p.group_num, p.age, p.vaccinated, p.registered_at";

/// Raw values read directly from a `persons` row.
pub struct RawPerson {
  pub phone:         String,
  pub center_id:     i64,
  pub group_num:     i64,
  pub age:           i64,
  pub vaccinated:    bool,
  pub registered_at: String,
}

impl RawPerson {
  /// Map a row selected with [`PERSON_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      phone:         row.get(0)?,
      center_id:     row.get(1)?,
      group_num:     row.get(2)?,
      age:           row.get(3)?,
      vaccinated:    row.get(4)?,
      registered_at: row.get(5)?,
    })
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      phone:         self.phone,
      center_id:     self.center_id,
      group:         self.group_num,
      age:           self.age,
      vaccinated:    self.vaccinated,
      registered_at: decode_dt(&self.registered_at)?,
    })
  }
}

pub const CALL_COLUMNS: &str = "c.call_id, c.title, c.center_id, c.capacity, c.time_start, \
   c.time_end, c.age_min, c.age_max, c.loc_name, c.loc_street, c.loc_house_number, \
   c.loc_postcode, c.loc_city, c.loc_extra, c.created_at";

/// Raw values read directly from a `calls` row.
pub struct RawCall {
  pub call_id:          String,
  pub title:            String,
  pub center_id:        i64,
  pub capacity:         i64,
  pub time_start:       String,
  pub time_end:         String,
  pub age_min:          i64,
  pub age_max:          i64,
  pub loc_name:         String,
  pub loc_street:       String,
  pub loc_house_number: String,
  pub loc_postcode:     String,
  pub loc_city:         String,
  pub loc_extra:        Option<String>,
  pub created_at:       String,
}

impl RawCall {
  /// Map a row selected with [`CALL_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      call_id:          row.get(0)?,
      title:            row.get(1)?,
      center_id:        row.get(2)?,
      capacity:         row.get(3)?,
      time_start:       row.get(4)?,
      time_end:         row.get(5)?,
      age_min:          row.get(6)?,
      age_max:          row.get(7)?,
      loc_name:         row.get(8)?,
      loc_street:       row.get(9)?,
      loc_house_number: row.get(10)?,
      loc_postcode:     row.get(11)?,
      loc_city:         row.get(12)?,
      loc_extra:        row.get(13)?,
      created_at:       row.get(14)?,
    })
  }

  pub fn into_call(self) -> Result<Call> {
    Ok(Call {
      call_id:    decode_uuid(&self.call_id)?,
      title:      self.title,
      center_id:  self.center_id,
      capacity:   self.capacity,
      time_start: decode_dt(&self.time_start)?,
      time_end:   decode_dt(&self.time_end)?,
      age_min:    self.age_min,
      age_max:    self.age_max,
      location:   Location {
        name:         self.loc_name,
        street:       self.loc_street,
        house_number: self.loc_house_number,
        postcode:     self.loc_postcode,
        city:         self.loc_city,
        extra:        self.loc_extra,
      },
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const INVITATION_COLUMNS: &str = "i.invitation_id, i.phone, i.call_id, i.status, i.time";

/// Raw values read directly from an `invitations` row.
pub struct RawInvitation {
  pub invitation_id: String,
  pub phone:         String,
  pub call_id:       String,
  pub status:        String,
  pub time:          String,
}

impl RawInvitation {
  /// Map a row selected with [`INVITATION_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      invitation_id: row.get(0)?,
      phone:         row.get(1)?,
      call_id:       row.get(2)?,
      status:        row.get(3)?,
      time:          row.get(4)?,
    })
  }

  pub fn into_invitation(self) -> Result<Invitation> {
    Ok(Invitation {
      invitation_id: decode_uuid(&self.invitation_id)?,
      phone:         self.phone,
      call_id:       decode_uuid(&self.call_id)?,
      status:        decode_status(&self.status)?,
      time:          decode_dt(&self.time)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn encoded_timestamps_sort_chronologically() {
    let a = Utc.with_ymd_and_hms(2021, 2, 10, 9, 0, 0).unwrap();
    let b = a + chrono::Duration::nanoseconds(1_500_000);
    let c = a + chrono::Duration::seconds(1);
    let (ea, eb, ec) = (encode_dt(a), encode_dt(b), encode_dt(c));
    assert_eq!(ea.len(), eb.len());
    assert!(ea < eb && eb < ec);
    assert_eq!(ea, "2021-02-10T09:00:00.000000Z");
  }

  #[test]
  fn storable_roundtrips_exactly() {
    let now = storable(Utc::now());
    assert_eq!(decode_dt(&encode_dt(now)).unwrap(), now);
  }
}
