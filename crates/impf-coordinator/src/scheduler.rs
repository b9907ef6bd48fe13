//! [`Scheduler`]: the long-lived task that runs [`Coordinator::run_tick`]
//! on a fixed interval.

use std::{sync::Arc, time::Duration};

use impf_core::{notify::Notifier, store::CallStore};
use tokio::{
  sync::watch,
  task::JoinHandle,
  time::{MissedTickBehavior, interval},
};
use tracing::{info, warn};

use crate::coordinator::Coordinator;

/// Handle to the running tick loop. The first tick fires immediately.
pub struct Scheduler {
  shutdown: watch::Sender<bool>,
  handle:   JoinHandle<()>,
}

impl Scheduler {
  pub fn spawn<S, N>(coordinator: Arc<Coordinator<S, N>>, every: Duration) -> Self
  where
    S: CallStore + 'static,
    N: Notifier + 'static,
  {
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
      let mut ticker = interval(every);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
      info!(interval_secs = every.as_secs(), "scheduler started");

      loop {
        tokio::select! {
          _ = ticker.tick() => {
            let report = coordinator.run_tick(coordinator.now()).await;
            info!(
              calls = report.dispatch.calls,
              invited = report.dispatch.invited,
              failed_sends = report.dispatch.failed_sends,
              swept = report.swept,
              "tick finished"
            );
          }
          _ = shutdown_rx.changed() => {
            info!("scheduler shutdown requested");
            break;
          }
        }
      }
    });

    Self { shutdown, handle }
  }

  /// Signal the loop to stop and wait for it. A tick in progress is allowed
  /// to finish.
  pub async fn stop(self) {
    let _ = self.shutdown.send(true);
    if let Err(e) = self.handle.await {
      warn!(error = %e, "scheduler task ended abnormally");
    }
    info!("scheduler stopped");
  }
}
