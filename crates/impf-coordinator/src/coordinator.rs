//! [`Coordinator`]: the facade the web layer talks to.
//!
//! Directory and registry operations live here; the dispatcher, reconciler
//! and sweeper add their operations in sibling modules.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveTime, Utc};
use impf_core::{
  Error, Result,
  call::{Call, NewCall},
  code::confirmation_code,
  invitation::{CallStatus, Invitation},
  notify::{Message, Notifier},
  person::{NewPerson, Person},
  store::CallStore,
  validation::ValidationErrors,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};

/// Runtime settings that shape outbound messages.
#[derive(Debug, Clone)]
pub struct Settings {
  /// Shared secret mixed into confirmation codes.
  pub token_secret: String,
  /// Wall-clock offset of the vaccination center, used to render call
  /// times in SMS texts.
  pub utc_offset:   FixedOffset,
}

pub struct Coordinator<S, N> {
  pub(crate) store:    S,
  pub(crate) notifier: N,
  clock:               Arc<dyn Clock>,
  settings:            Settings,
}

// ─── Plumbing ────────────────────────────────────────────────────────────────

/// Lift a backend error into [`impf_core::Error`].
pub(crate) trait IntoCore<T> {
  fn into_core(self) -> Result<T>;
}

impl<T, E: Into<Error>> IntoCore<T> for std::result::Result<T, E> {
  fn into_core(self) -> Result<T> { self.map_err(Into::into) }
}

impl<S: CallStore, N: Notifier> Coordinator<S, N> {
  pub fn new(store: S, notifier: N, settings: Settings) -> Self {
    Self {
      store,
      notifier,
      clock: Arc::new(SystemClock),
      settings,
    }
  }

  /// Replace the clock; used by tests to control time.
  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn notifier(&self) -> &N { &self.notifier }

  pub fn now(&self) -> DateTime<Utc> { self.clock.now() }

  fn local_time(&self, at: DateTime<Utc>) -> NaiveTime {
    at.with_timezone(&self.settings.utc_offset).time()
  }

  pub(crate) fn invite_message(&self, call: &Call) -> Message {
    Message::Invite {
      start:    self.local_time(call.time_start),
      end:      self.local_time(call.time_end),
      location: call.location.one_line(),
    }
  }

  pub(crate) fn accept_message(&self, phone: &str, call: &Call) -> Message {
    Message::Accept {
      start:    self.local_time(call.time_start),
      end:      self.local_time(call.time_end),
      location: call.location.one_line(),
      code:     confirmation_code(phone, call.call_id, &self.settings.token_secret),
    }
  }

  /// One delivery attempt. Failures are logged and reported as `false`.
  pub(crate) async fn notify(&self, phone: &str, message: &Message) -> bool {
    let kind = message.kind();
    match self.notifier.send(phone, message).await.map_err(Error::from) {
      Ok(()) => {
        debug!(%phone, %kind, "message delivered");
        true
      }
      Err(e) => {
        debug!(%phone, %kind, "message to this phone failed");
        warn!(%kind, error = %e, "message not delivered");
        false
      }
    }
  }

  // ─── Reads ─────────────────────────────────────────────────────────────────

  /// Calls whose end time has not passed yet.
  pub async fn list_active_calls(&self) -> Result<Vec<Call>> {
    self.store.list_active_calls(self.now()).await.into_core()
  }

  pub async fn list_calls(&self) -> Result<Vec<Call>> {
    self.store.list_calls().await.into_core()
  }

  pub async fn list_persons(&self) -> Result<Vec<Person>> {
    self.store.list_persons().await.into_core()
  }

  /// The whole ledger, oldest status change first.
  pub async fn list_invitations(&self) -> Result<Vec<Invitation>> {
    self.store.list_invitations().await.into_core()
  }

  pub async fn get_call_status(&self, call_id: Uuid) -> Result<CallStatus> {
    let call = self
      .store
      .get_call(call_id)
      .await
      .into_core()?
      .ok_or_else(|| Error::NotFound(call_id.to_string()))?;
    let accepted = self.store.accepted_invitations(call_id).await.into_core()?;
    let accepted_persons = self.store.accepted_persons(call_id).await.into_core()?;

    Ok(CallStatus {
      call,
      accepted,
      accepted_persons,
    })
  }

  // ─── Writes ────────────────────────────────────────────────────────────────

  pub async fn create_call(&self, input: NewCall) -> Result<Call> {
    let input = input.validate()?;
    let call = self.store.add_call(input, self.now()).await.into_core()?;
    info!(
      call_id = %call.call_id,
      capacity = call.capacity,
      time_start = %call.time_start,
      time_end = %call.time_end,
      "call created"
    );
    Ok(call)
  }

  /// Register one person and send the onboarding notice.
  pub async fn add_person(&self, input: NewPerson) -> Result<Person> {
    let input = input.validate()?;
    let person = self.store.add_person(input, self.now()).await.into_core()?;
    info!(group = person.group, "person registered");

    self.notify(&person.phone, &Message::Onboarding).await;
    Ok(person)
  }

  /// Register a batch atomically. Any invalid row rejects the whole batch;
  /// field names in the returned errors are prefixed with `persons[i]`.
  pub async fn add_persons(&self, inputs: Vec<NewPerson>) -> Result<Vec<Person>> {
    let mut errors = ValidationErrors::new();
    let mut valid = Vec::with_capacity(inputs.len());
    for (i, input) in inputs.into_iter().enumerate() {
      match input.validate() {
        Ok(p) => valid.push(p),
        Err(e) => errors.absorb(&format!("persons[{i}]"), e),
      }
    }
    errors.into_result()?;

    let persons = self.store.add_persons(valid, self.now()).await.into_core()?;
    info!(count = persons.len(), "persons imported");

    for person in &persons {
      self.notify(&person.phone, &Message::Onboarding).await;
    }
    Ok(persons)
  }
}
