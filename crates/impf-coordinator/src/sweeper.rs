//! Cleanup sweeper and the combined periodic tick.

use chrono::{DateTime, Utc};
use impf_core::{notify::Notifier, store::CallStore};
use serde::Serialize;
use tracing::{error, info};

use crate::{coordinator::Coordinator, dispatcher::DispatchReport};

/// Outcome of [`Coordinator::run_tick`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
  pub dispatch: DispatchReport,
  /// Calls removed by the sweeper.
  pub swept:    u64,
}

impl<S: CallStore, N: Notifier> Coordinator<S, N> {
  /// Delete every call whose end time lies before `now`. Invitations stay
  /// as history. A storage failure is logged and counts as nothing swept.
  pub async fn run_sweep(&self, now: DateTime<Utc>) -> u64 {
    match self.store.delete_expired_calls(now).await {
      Ok(0) => 0,
      Ok(removed) => {
        info!(removed, "expired calls deleted");
        removed
      }
      Err(e) => {
        error!(error = %e, "sweeping expired calls failed");
        0
      }
    }
  }

  /// One scheduler tick: dispatch, then sweep. Never fails.
  pub async fn run_tick(&self, now: DateTime<Utc>) -> TickReport {
    let dispatch = self.run_dispatch(now).await.unwrap_or_else(|e| {
      error!(error = %e, "dispatch failed");
      DispatchReport::default()
    });
    let swept = self.run_sweep(now).await;
    TickReport { dispatch, swept }
  }
}
