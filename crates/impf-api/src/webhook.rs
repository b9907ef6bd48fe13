//! Inbound SMS replies, already routed by keyword upstream.
//!
//! | Method | Path | Reply keyword | Response |
//! |--------|------|---------------|----------|
//! | `POST` | `/webhook/accept` | `JA` | [`AcceptReply`] |
//! | `POST` | `/webhook/cancel` | `STORNO` | `{"cancelled": n}` |
//! | `POST` | `/webhook/delete` | `LÖSCHEN` | 204 |
//!
//! Every body is `{"phone": "..."}`. Unknown phones get a generic 404.

use axum::{Json, extract::State, http::StatusCode};
use impf_core::{
  invitation::{AcceptOutcome, InvitationStatus},
  notify::Notifier,
  store::CallStore,
  validation::ValidationErrors,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct PhoneBody {
  pub phone: String,
}

impl PhoneBody {
  /// The trimmed phone number, or a validation error if it is blank.
  fn phone(&self) -> Result<&str, ApiError> {
    let phone = self.phone.trim();
    if phone.is_empty() {
      return Err(ValidationErrors::single("phone", "Fehlende Rufnummer").into());
    }
    Ok(phone)
  }
}

#[derive(Debug, Serialize)]
pub struct AcceptReply {
  /// `accepted`, `full`, `call_closed` or `already_handled`.
  pub result:  &'static str,
  pub call_id: Uuid,
  /// Status of the invitation after the reply was applied.
  pub status:  InvitationStatus,
}

/// `POST /webhook/accept`
pub async fn accept<S, N>(
  State(coord): State<AppState<S, N>>,
  Json(body): Json<PhoneBody>,
) -> Result<Json<AcceptReply>, ApiError>
where
  S: CallStore + 'static,
  N: Notifier + 'static,
{
  let (result, invitation) = match coord.accept_last_call(body.phone()?).await? {
    AcceptOutcome::Accepted { invitation, .. } => ("accepted", invitation),
    AcceptOutcome::Full { invitation, .. } => ("full", invitation),
    AcceptOutcome::CallClosed { invitation } => ("call_closed", invitation),
    AcceptOutcome::AlreadyHandled { invitation } => ("already_handled", invitation),
    AcceptOutcome::NoInvitation => return Err(ApiError::NotFound("no such registration")),
  };
  Ok(Json(AcceptReply {
    result,
    call_id: invitation.call_id,
    status: invitation.status,
  }))
}

/// `POST /webhook/cancel`
pub async fn cancel<S, N>(
  State(coord): State<AppState<S, N>>,
  Json(body): Json<PhoneBody>,
) -> Result<Json<Value>, ApiError>
where
  S: CallStore + 'static,
  N: Notifier + 'static,
{
  let cancelled = coord.cancel_all_calls(body.phone()?).await?;
  Ok(Json(json!({ "cancelled": cancelled })))
}

/// `POST /webhook/delete`
pub async fn delete<S, N>(
  State(coord): State<AppState<S, N>>,
  Json(body): Json<PhoneBody>,
) -> Result<StatusCode, ApiError>
where
  S: CallStore + 'static,
  N: Notifier + 'static,
{
  coord.delete_person(body.phone()?).await?;
  Ok(StatusCode::NO_CONTENT)
}
