//! SQL schema for the SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// `invitations` has no foreign keys: the ledger
/// outlives both the persons (deleted on request) and the calls (swept after
/// they end).
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA busy_timeout = 5000;

CREATE TABLE IF NOT EXISTS persons (
    phone         TEXT PRIMARY KEY,
    center_id     INTEGER NOT NULL,
    group_num     INTEGER NOT NULL CHECK (group_num > 0),
    age           INTEGER NOT NULL,
    vaccinated    INTEGER NOT NULL,   -- 0 | 1
    registered_at TEXT NOT NULL       -- RFC 3339 UTC, fixed width
);

CREATE TABLE IF NOT EXISTS calls (
    call_id          TEXT PRIMARY KEY,
    title            TEXT NOT NULL,
    center_id        INTEGER NOT NULL,
    capacity         INTEGER NOT NULL CHECK (capacity > 0),
    time_start       TEXT NOT NULL,
    time_end         TEXT NOT NULL,
    age_min          INTEGER NOT NULL,
    age_max          INTEGER NOT NULL,
    loc_name         TEXT NOT NULL,
    loc_street       TEXT NOT NULL,
    loc_house_number TEXT NOT NULL,
    loc_postcode     TEXT NOT NULL,
    loc_city         TEXT NOT NULL,
    loc_extra        TEXT,
    created_at       TEXT NOT NULL,
    CHECK (time_start < time_end),
    CHECK (age_min <= age_max)
);

-- Rows are never deleted. Status changes overwrite `status` and `time`.
CREATE TABLE IF NOT EXISTS invitations (
    invitation_id TEXT PRIMARY KEY,
    phone         TEXT NOT NULL,
    call_id       TEXT NOT NULL,
    status        TEXT NOT NULL
                  CHECK (status IN ('notified', 'accepted', 'rejected', 'cancelled')),
    time          TEXT NOT NULL,
    UNIQUE (phone, call_id)
);

CREATE INDEX IF NOT EXISTS persons_selection_idx  ON persons(group_num, registered_at, phone);
CREATE INDEX IF NOT EXISTS calls_end_idx          ON calls(time_end);
CREATE INDEX IF NOT EXISTS invitations_call_idx   ON invitations(call_id, status);
CREATE INDEX IF NOT EXISTS invitations_phone_idx  ON invitations(phone, time);

PRAGMA user_version = 1;
";
