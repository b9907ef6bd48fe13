//! The outbound messaging contract.
//!
//! A [`Notifier`] takes a phone number and a [`Message`] and makes one
//! best-effort delivery attempt. Callers log failures; nobody retries.

use std::future::Future;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};
use thiserror::Error;

// ─── Messages ────────────────────────────────────────────────────────────────

/// Discriminant of a [`Message`], used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MessageKind {
  Onboarding,
  Invite,
  Reject,
  Accept,
  DeleteConfirmation,
}

/// An SMS to a single person. Times are already converted to the local
/// wall-clock of the vaccination center.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
  /// Sent once after the person was imported.
  Onboarding,
  /// Offer of a seat in a call.
  Invite {
    start:    NaiveTime,
    end:      NaiveTime,
    location: String,
  },
  /// The call filled up before the reply arrived.
  Reject,
  /// Seat granted; `code` identifies the person on site.
  Accept {
    start:    NaiveTime,
    end:      NaiveTime,
    location: String,
    code:     String,
  },
  /// The person's registration was removed.
  DeleteConfirmation,
}

impl Message {
  pub fn kind(&self) -> MessageKind {
    match self {
      Self::Onboarding => MessageKind::Onboarding,
      Self::Invite { .. } => MessageKind::Invite,
      Self::Reject => MessageKind::Reject,
      Self::Accept { .. } => MessageKind::Accept,
      Self::DeleteConfirmation => MessageKind::DeleteConfirmation,
    }
  }

  /// The SMS body.
  pub fn render(&self) -> String {
    match self {
      Self::Onboarding => "Willkommen bei der kurzfristigen Impfterminvergabe. \
        Möchten Sie diesen Service nicht benutzen, antworten Sie jederzeit mit \"LÖSCHEN\"."
        .to_owned(),
      Self::Invite { start, end, location } => format!(
        "Sie haben die Möglichkeit zur Corona-Impfung, heute {}-{}h {location}. \
         Antworten Sie für Zusage mit \"JA\"",
        start.format("%H:%M"),
        end.format("%H:%M"),
      ),
      Self::Reject => "Leider wurden zwischenzeitlich schon alle Termine vergeben. \
        Sie bleiben im System und werden ggf. wieder benachrichtigt."
        .to_owned(),
      Self::Accept { start, end, location, code } => format!(
        "Termin bestätigt. {location}, heute {}-{}h. ID: {code}. \
         Falls Sie den Termin nicht wahrnehmen können, bitte \"STORNO\" antworten.",
        start.format("%H:%M"),
        end.format("%H:%M"),
      ),
      Self::DeleteConfirmation => {
        "Sie wurden erfolgreich entfernt und erhalten keine weiteren Nachrichten von uns."
          .to_owned()
      }
    }
  }
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum NotifyError {
  /// The request never produced a response (connect failure, timeout).
  #[error("transport error: {0}")]
  Transport(String),

  /// The gateway answered with a non-success status.
  #[error("gateway returned {status}: {body}")]
  Rejected { status: u16, body: String },
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an outbound message transport (an SMS gateway).
///
/// Implementations make exactly one bounded attempt per call and must not
/// retry internally.
pub trait Notifier: Send + Sync {
  fn send<'a>(
    &'a self,
    to: &'a str,
    message: &'a Message,
  ) -> impl Future<Output = Result<(), NotifyError>> + Send + 'a;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn invite_contains_window_and_location() {
    let msg = Message::Invite {
      start:    NaiveTime::from_hms_opt(16, 30, 0).unwrap(),
      end:      NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
      location: "Impfzentrum Duisburg".into(),
    };
    assert_eq!(
      msg.render(),
      "Sie haben die Möglichkeit zur Corona-Impfung, heute 16:30-18:00h Impfzentrum Duisburg. \
       Antworten Sie für Zusage mit \"JA\""
    );
    assert_eq!(msg.kind(), MessageKind::Invite);
  }

  #[test]
  fn accept_contains_code() {
    let msg = Message::Accept {
      start:    NaiveTime::from_hms_opt(9, 5, 0).unwrap(),
      end:      NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
      location: "Halle 3".into(),
      code:     "1a2b3".into(),
    };
    let body = msg.render();
    assert!(body.contains("09:05-10:00h"));
    assert!(body.contains("ID: 1a2b3."));
  }

  #[test]
  fn kind_names_are_snake_case() {
    assert_eq!(MessageKind::DeleteConfirmation.to_string(), "delete_confirmation");
  }
}
