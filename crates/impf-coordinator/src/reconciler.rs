//! Response reconciler: accept, cancel and delete requests keyed by phone.

use impf_core::{
  Error, Result,
  invitation::AcceptOutcome,
  notify::{Message, Notifier},
  store::CallStore,
};
use tracing::{debug, info};

use crate::coordinator::{Coordinator, IntoCore as _};

impl<S: CallStore, N: Notifier> Coordinator<S, N> {
  /// Resolve an "accept" reply against the phone's most recent invitation.
  ///
  /// | latest invitation         | ledger              | message |
  /// |---------------------------|---------------------|---------|
  /// | `notified`, seat free     | → `accepted`        | accept with code |
  /// | `notified`, call full     | → `rejected`        | reject |
  /// | `notified`, call deleted  | → `rejected`        | reject |
  /// | anything else             | unchanged           | none |
  ///
  /// Fails with [`Error::NotFound`] if the phone was never invited.
  pub async fn accept_last_call(&self, phone: &str) -> Result<AcceptOutcome> {
    let outcome = self.store.accept_latest(phone, self.now()).await.into_core()?;

    match &outcome {
      AcceptOutcome::NoInvitation => {
        debug!(%phone, "accept from phone without invitations");
        return Err(Error::NotFound(phone.to_owned()));
      }
      AcceptOutcome::Accepted { invitation, call } => {
        info!(
          call_id = %call.call_id,
          invitation_id = %invitation.invitation_id,
          "seat granted"
        );
        self.notify(phone, &self.accept_message(phone, call)).await;
      }
      AcceptOutcome::Full { invitation, call } => {
        let refusal = Error::CapacityExceeded(call.call_id);
        info!(invitation_id = %invitation.invitation_id, reason = %refusal, "seat refused");
        self.notify(phone, &Message::Reject).await;
      }
      AcceptOutcome::CallClosed { invitation } => {
        info!(
          call_id = %invitation.call_id,
          invitation_id = %invitation.invitation_id,
          "seat refused, call no longer exists"
        );
        self.notify(phone, &Message::Reject).await;
      }
      AcceptOutcome::AlreadyHandled { invitation } => {
        info!(
          invitation_id = %invitation.invitation_id,
          status = %invitation.status,
          "reply already handled"
        );
      }
    }

    Ok(outcome)
  }

  /// Cancel every accepted seat held by `phone`. Returns how many were
  /// cancelled; zero is not an error.
  pub async fn cancel_all_calls(&self, phone: &str) -> Result<u64> {
    let cancelled = self.store.cancel_accepted(phone, self.now()).await.into_core()?;
    if cancelled > 0 {
      info!(cancelled, "accepted seats cancelled");
    } else {
      debug!(%phone, "nothing to cancel");
    }
    Ok(cancelled)
  }

  /// Remove the person and confirm by SMS. Invitation history is kept.
  pub async fn delete_person(&self, phone: &str) -> Result<()> {
    if !self.store.delete_person(phone).await.into_core()? {
      return Err(Error::NotFound(phone.to_owned()));
    }
    info!("person deleted");
    self.notify(phone, &Message::DeleteConfirmation).await;
    Ok(())
  }
}
