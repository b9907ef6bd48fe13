//! Handlers for `/calls` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/calls` | Active calls; `?all=true` includes ended ones not yet swept |
//! | `POST` | `/calls` | Body: [`NewCall`]; 422 with per-field messages |
//! | `GET`  | `/calls/{id}` | Call plus accepted seats; 404 if unknown |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use impf_core::{
  Error,
  call::{Call, NewCall},
  invitation::CallStatus,
  notify::Notifier,
  store::CallStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub all: bool,
}

/// `GET /calls[?all=true]`
pub async fn list<S, N>(
  State(coord): State<AppState<S, N>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Call>>, ApiError>
where
  S: CallStore + 'static,
  N: Notifier + 'static,
{
  let calls = if params.all {
    coord.list_calls().await?
  } else {
    coord.list_active_calls().await?
  };
  Ok(Json(calls))
}

/// `POST /calls`
pub async fn create<S, N>(
  State(coord): State<AppState<S, N>>,
  Json(body): Json<NewCall>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CallStore + 'static,
  N: Notifier + 'static,
{
  let call = coord.create_call(body).await?;
  Ok((StatusCode::CREATED, Json(call)))
}

/// `GET /calls/{id}`
pub async fn status<S, N>(
  State(coord): State<AppState<S, N>>,
  Path(id): Path<Uuid>,
) -> Result<Json<CallStatus>, ApiError>
where
  S: CallStore + 'static,
  N: Notifier + 'static,
{
  match coord.get_call_status(id).await {
    Ok(status) => Ok(Json(status)),
    Err(Error::NotFound(_)) => Err(ApiError::NotFound("no such call")),
    Err(e) => Err(e.into()),
  }
}
