//! `GET /invitations`: the full ledger, oldest status change first.

use axum::{Json, extract::State};
use impf_core::{invitation::Invitation, notify::Notifier, store::CallStore};

use crate::{AppState, error::ApiError};

pub async fn list<S, N>(
  State(coord): State<AppState<S, N>>,
) -> Result<Json<Vec<Invitation>>, ApiError>
where
  S: CallStore + 'static,
  N: Notifier + 'static,
{
  Ok(Json(coord.list_invitations().await?))
}
