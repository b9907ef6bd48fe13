//! Invitation: one person asked about one call, with a status lifecycle.
//!
//! The invitation ledger is the single source of truth for who was asked
//! about what and how they answered. Rows are never deleted; status changes
//! overwrite in place and restamp `time`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{call::Call, person::Person};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle state of an [`Invitation`].
///
/// ```text
/// notified ──► accepted ──► cancelled
///    │
///    └──────► rejected        (call full or closed when the reply arrived)
/// ```
///
/// `rejected` and `cancelled` are terminal.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InvitationStatus {
  Notified,
  Accepted,
  Rejected,
  Cancelled,
}

impl InvitationStatus {
  /// Whether the state machine permits moving from `self` to `next`.
  pub fn can_become(self, next: Self) -> bool {
    use InvitationStatus::*;
    matches!(
      (self, next),
      (Notified, Accepted) | (Notified, Rejected) | (Notified, Cancelled) | (Accepted, Cancelled)
    )
  }

  /// The string stored in the `status` column.
  pub fn as_str(self) -> &'static str { self.into() }
}

// ─── Invitation ──────────────────────────────────────────────────────────────

/// A ledger row. `phone` references a [`Person`] by value, so the row
/// survives deletion of the person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
  pub invitation_id: Uuid,
  pub phone:         String,
  pub call_id:       Uuid,
  pub status:        InvitationStatus,
  /// Time of the last status change.
  pub time:          DateTime<Utc>,
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// A call together with everyone currently holding a seat in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallStatus {
  pub call:             Call,
  /// Every `accepted` ledger row for the call, including rows whose person
  /// has since been deleted.
  pub accepted:         Vec<Invitation>,
  /// The subset of `accepted` whose person is still registered.
  pub accepted_persons: Vec<Person>,
}

impl CallStatus {
  pub fn free_seats(&self) -> i64 {
    (self.call.capacity - self.accepted.len() as i64).max(0)
  }
}

/// Result of resolving an inbound "accept" reply against the ledger.
///
/// Produced atomically by [`crate::store::CallStore::accept_latest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptOutcome {
  /// The phone has never been invited to anything.
  NoInvitation,
  /// The latest invitation moved `notified → accepted`.
  Accepted { invitation: Invitation, call: Call },
  /// The call was full; the invitation moved `notified → rejected`.
  Full { invitation: Invitation, call: Call },
  /// The call no longer exists; the invitation moved `notified → rejected`.
  CallClosed { invitation: Invitation },
  /// The latest invitation was no longer `notified` (duplicate or late
  /// reply). Nothing changed.
  AlreadyHandled { invitation: Invitation },
}
