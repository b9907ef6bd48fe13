//! Handlers for `/persons` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/persons` | Ordered by group, then registration |
//! | `POST` | `/persons` | Body: [`NewPerson`]; sends the onboarding SMS |
//! | `POST` | `/persons/batch` | Body: `{"persons":[...]}`; all or nothing |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use impf_core::{
  notify::Notifier,
  person::{NewPerson, Person},
  store::CallStore,
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

/// `GET /persons`
pub async fn list<S, N>(State(coord): State<AppState<S, N>>) -> Result<Json<Vec<Person>>, ApiError>
where
  S: CallStore + 'static,
  N: Notifier + 'static,
{
  Ok(Json(coord.list_persons().await?))
}

/// `POST /persons`
pub async fn create<S, N>(
  State(coord): State<AppState<S, N>>,
  Json(body): Json<NewPerson>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CallStore + 'static,
  N: Notifier + 'static,
{
  let person = coord.add_person(body).await?;
  Ok((StatusCode::CREATED, Json(person)))
}

#[derive(Debug, Deserialize)]
pub struct BatchBody {
  pub persons: Vec<NewPerson>,
}

/// `POST /persons/batch`
pub async fn import<S, N>(
  State(coord): State<AppState<S, N>>,
  Json(body): Json<BatchBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CallStore + 'static,
  N: Notifier + 'static,
{
  let persons = coord.add_persons(body.persons).await?;
  Ok((StatusCode::CREATED, Json(persons)))
}
