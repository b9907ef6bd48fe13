//! Notification dispatcher: fills open seats of active calls.

use chrono::{DateTime, Utc};
use impf_core::{Result, notify::Notifier, store::CallStore};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::coordinator::{Coordinator, IntoCore as _};

/// What one dispatcher pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
  /// Active calls looked at.
  pub calls:        usize,
  /// Invitation rows written.
  pub invited:      usize,
  /// Invite messages the notifier accepted.
  pub delivered:    usize,
  /// Invite messages that failed; their rows stay `notified`.
  pub failed_sends: usize,
  /// Calls skipped because the ledger write failed.
  pub failed_calls: usize,
}

impl<S: CallStore, N: Notifier> Coordinator<S, N> {
  /// For every active call, invite as many candidates as there are free
  /// seats, then send each of them an invite.
  ///
  /// Rows are committed before any message goes out, so a reply arriving
  /// right after delivery always finds its `notified` row. A failed write
  /// skips that call; a failed send skips that person. Only failing to list
  /// the active calls is returned as an error.
  pub async fn run_dispatch(&self, now: DateTime<Utc>) -> Result<DispatchReport> {
    let calls = self.store.list_active_calls(now).await.into_core()?;
    let mut report = DispatchReport {
      calls: calls.len(),
      ..DispatchReport::default()
    };

    for call in &calls {
      let invitations = match self.store.invite_next(call.call_id, now).await {
        Ok(invitations) => invitations,
        Err(e) => {
          warn!(call_id = %call.call_id, error = %e, "could not invite candidates");
          report.failed_calls += 1;
          continue;
        }
      };
      if invitations.is_empty() {
        debug!(call_id = %call.call_id, "no seats to fill or no candidates left");
        continue;
      }
      info!(call_id = %call.call_id, invited = invitations.len(), "candidates invited");
      report.invited += invitations.len();

      let message = self.invite_message(call);
      for invitation in &invitations {
        if self.notify(&invitation.phone, &message).await {
          report.delivered += 1;
        } else {
          report.failed_sends += 1;
        }
      }
    }

    Ok(report)
  }
}
